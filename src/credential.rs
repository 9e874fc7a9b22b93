//! Identity proofs that an authority exchanges for access tokens.
//!
//! A [`Credential`] is produced by a [`CredentialRetriever`](crate::retriever::CredentialRetriever)
//! for one lookup, handed to [`Credential::resolve_access_token`], and dropped. Callers never
//! branch on the variant; adding a new proof kind means adding a case here and its grant in
//! [`TokenGrant`].

// self
use crate::{
	_prelude::*,
	authority::{TokenAuthority, TokenGrant, TokenRequest},
	error::{ConfigError, ExchangeError},
	props::{Props, keys},
	secret::SecretString,
};

/// One way of proving identity to the authority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credential {
	/// Confidential OAuth application with its own client identifier and secret.
	ClientSecret {
		/// OAuth client identifier.
		client_id: String,
		/// OAuth client secret.
		client_secret: SecretString,
	},
	/// User-delegated refresh token redeemed with the application identity from
	/// [`keys::CLIENT_ID`] and [`keys::CLIENT_SECRET`].
	RefreshToken {
		/// Long-lived refresh token.
		refresh_token: SecretString,
	},
}
impl Credential {
	/// Builds a [`Credential::ClientSecret`].
	pub fn client_secret(
		client_id: impl Into<String>,
		client_secret: impl Into<SecretString>,
	) -> Self {
		Self::ClientSecret { client_id: client_id.into(), client_secret: client_secret.into() }
	}

	/// Builds a [`Credential::RefreshToken`].
	pub fn refresh_token(refresh_token: impl Into<SecretString>) -> Self {
		Self::RefreshToken { refresh_token: refresh_token.into() }
	}

	/// Variant label, safe to log.
	pub fn kind(&self) -> CredentialKind {
		match self {
			Self::ClientSecret { .. } => CredentialKind::ClientSecret,
			Self::RefreshToken { .. } => CredentialKind::RefreshToken,
		}
	}

	/// Exchanges this proof for a bearer access token through `authority`.
	///
	/// Scope and resource settings are read from `props` on every call so a provider always
	/// reflects the configuration it was built with.
	pub fn resolve_access_token(
		&self,
		props: &Props,
		authority: &dyn TokenAuthority,
	) -> Result<SecretString, ExchangeError> {
		let grant = match self {
			Self::ClientSecret { client_id, client_secret } => TokenGrant::ClientCredentials {
				client_id: client_id.clone(),
				client_secret: client_secret.clone(),
			},
			Self::RefreshToken { refresh_token } => TokenGrant::RefreshToken {
				client_id: application_client_id(props)?.to_owned(),
				client_secret: props
					.get(keys::CLIENT_SECRET)
					.filter(|value| !value.is_empty())
					.map(SecretString::from),
				refresh_token: refresh_token.clone(),
			},
		};

		authority.exchange(TokenRequest::from_props(grant, props))
	}
}

fn application_client_id(props: &Props) -> Result<&str, ConfigError> {
	match props.require(keys::CLIENT_ID)? {
		"" => Err(ConfigError::InvalidValue {
			key: keys::CLIENT_ID.into(),
			reason: "the application client id cannot be empty".into(),
		}),
		client_id => Ok(client_id),
	}
}

/// Loggable label for a [`Credential`] variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialKind {
	/// [`Credential::ClientSecret`].
	ClientSecret,
	/// [`Credential::RefreshToken`].
	RefreshToken,
}
impl CredentialKind {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::ClientSecret => "client_secret",
			Self::RefreshToken => "refresh_token",
		}
	}
}
impl Display for CredentialKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use parking_lot::Mutex;
	// self
	use super::*;

	#[derive(Default)]
	struct RecordingAuthority(Mutex<Vec<TokenRequest>>);
	impl TokenAuthority for RecordingAuthority {
		fn exchange(&self, request: TokenRequest) -> Result<SecretString, ExchangeError> {
			self.0.lock().push(request);

			Ok(SecretString::new("issued"))
		}
	}

	#[test]
	fn equality_is_value_based() {
		let credential = Credential::client_secret("5555", "6666");

		assert_eq!(credential, Credential::client_secret("5555", "6666"));
		assert_ne!(credential, Credential::client_secret("5555", "7777"));
	}

	#[test]
	fn debug_never_shows_secret_material() {
		let rendered = format!("{:?}", Credential::client_secret("app", "hunter2"));

		assert!(rendered.contains("app"));
		assert!(!rendered.contains("hunter2"));
	}

	#[test]
	fn client_secret_resolves_through_client_credentials_grant() {
		let authority = RecordingAuthority::default();
		let props = Props::new()
			.with(keys::SCOPE, "api.read  api.write")
			.with(keys::RESOURCE, "https://storage");
		let token = Credential::client_secret("app", "s3cret")
			.resolve_access_token(&props, &authority)
			.expect("Recording authority should issue a token.");

		assert_eq!(token.expose(), "issued");

		let requests = authority.0.lock();
		let request = requests.first().expect("Exactly one exchange should be recorded.");

		assert_eq!(requests.len(), 1);
		assert_eq!(
			request.grant,
			TokenGrant::ClientCredentials {
				client_id: "app".into(),
				client_secret: SecretString::new("s3cret"),
			}
		);
		assert_eq!(request.scopes, vec!["api.read".to_owned(), "api.write".to_owned()]);
		assert_eq!(request.resource.as_deref(), Some("https://storage"));
	}

	#[test]
	fn refresh_token_uses_application_identity() {
		let authority = RecordingAuthority::default();
		let props = Props::new().with(keys::CLIENT_ID, "azkaban-app");

		Credential::refresh_token("rt-1")
			.resolve_access_token(&props, &authority)
			.expect("Refresh token exchange should succeed.");

		let requests = authority.0.lock();

		assert_eq!(
			requests[0].grant,
			TokenGrant::RefreshToken {
				client_id: "azkaban-app".into(),
				client_secret: None,
				refresh_token: SecretString::new("rt-1"),
			}
		);
	}

	#[test]
	fn refresh_token_without_application_identity_fails_before_exchange() {
		let authority = RecordingAuthority::default();
		let err = Credential::refresh_token("rt-1")
			.resolve_access_token(&Props::new(), &authority)
			.expect_err("Missing application client id should fail.");

		assert!(matches!(err, ExchangeError::Config(ConfigError::MissingKey { .. })));
		assert!(authority.0.lock().is_empty());
	}

	#[test]
	fn empty_application_settings_are_not_sent() {
		let authority = RecordingAuthority::default();
		let props =
			Props::new().with(keys::CLIENT_ID, "azkaban-app").with(keys::CLIENT_SECRET, "");

		Credential::refresh_token("rt-1")
			.resolve_access_token(&props, &authority)
			.expect("Refresh token exchange should succeed.");

		assert_eq!(authority.0.lock()[0].grant.client_secret(), None);

		let err = Credential::refresh_token("rt-1")
			.resolve_access_token(&props.with(keys::CLIENT_ID, ""), &authority)
			.expect_err("Empty application client id should fail.");

		assert!(matches!(err, ExchangeError::Config(ConfigError::InvalidValue { .. })));
		assert_eq!(authority.0.lock().len(), 1);
	}
}
