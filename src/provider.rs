//! The credential provider: look up a user's credential, exchange it for an access token, and
//! drop the token into the job's credential container.

// self
#[cfg(feature = "reqwest")] use crate::authority::AuthorityClient;
use crate::{
	_prelude::*,
	authority::TokenAuthority,
	container::CredentialContainer,
	error::ConfigError,
	obs::{self, RegistrationOutcome},
	props::{Props, keys},
	retriever::{CredentialRetriever, RetrieverRegistry},
};

/// Result of a [`CredentialProvider::register`] call that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Registration {
	/// An access token was written under `key`.
	Registered {
		/// Container key that now holds the token.
		key: String,
	},
	/// The retriever had no credential for the user; the container was not touched.
	Skipped,
}
impl Registration {
	/// Returns `true` when a token was written.
	pub fn is_registered(&self) -> bool {
		matches!(self, Self::Registered { .. })
	}
}

/// Attaches bearer access tokens to job credential containers.
///
/// One provider is built per job configuration and may serve any number of `register` calls,
/// from any number of threads. Construction is all-or-nothing: a provider either has a working
/// retriever, a valid authority, and a registration key, or it does not exist.
pub struct CredentialProvider {
	props: Arc<Props>,
	retriever: Arc<dyn CredentialRetriever>,
	authority: Arc<dyn TokenAuthority>,
	key: String,
}
impl CredentialProvider {
	/// Builds a provider whose authority is an [`AuthorityClient`] configured from `props`.
	///
	/// The retriever named by [`keys::CREDENTIAL_RETRIEVER`] is resolved through `registry`
	/// first, so a bad plugin is reported before any worker thread starts.
	#[cfg(feature = "reqwest")]
	pub fn new(props: Props, registry: &RetrieverRegistry) -> Result<Self> {
		let retriever = registry.load(&props)?;
		let key = registration_key(&props)?;
		let authority = Arc::new(AuthorityClient::from_props(&props)?);

		Ok(Self::assemble(props, retriever, authority, key))
	}

	/// Builds a provider around a caller-supplied authority.
	pub fn with_authority(
		props: Props,
		registry: &RetrieverRegistry,
		authority: Arc<dyn TokenAuthority>,
	) -> Result<Self> {
		let retriever = registry.load(&props)?;
		let key = registration_key(&props)?;

		Ok(Self::assemble(props, retriever, authority, key))
	}

	fn assemble(
		props: Props,
		retriever: Arc<dyn CredentialRetriever>,
		authority: Arc<dyn TokenAuthority>,
		key: String,
	) -> Self {
		tracing::info!(key = %key, "credential provider ready");

		Self { props: Arc::new(props), retriever, authority, key }
	}

	/// Container key every token is registered under.
	pub fn registration_key(&self) -> &str {
		&self.key
	}

	/// Configuration the provider was built from.
	pub fn props(&self) -> &Props {
		&self.props
	}

	/// Resolves `username`'s credential and stores the resulting access token in `container`.
	///
	/// - No credential for the user: logs a warning and returns [`Registration::Skipped`].
	/// - Retriever or exchange failure: returns the error; the container is untouched.
	/// - Success: writes the token under [`registration_key`](Self::registration_key), replacing
	///   any previous value.
	pub fn register(
		&self,
		username: &str,
		container: &dyn CredentialContainer,
	) -> Result<Registration> {
		let _span = obs::registration_span(username).entered();

		obs::record_registration_outcome(RegistrationOutcome::Attempt);

		let result = self.register_inner(username, container);
		let outcome = match &result {
			Ok(Registration::Registered { .. }) => RegistrationOutcome::Registered,
			Ok(Registration::Skipped) => RegistrationOutcome::Skipped,
			Err(e) => {
				tracing::error!(error = %e, "credential registration failed");

				RegistrationOutcome::Failure
			},
		};

		obs::record_registration_outcome(outcome);

		result
	}

	fn register_inner(
		&self,
		username: &str,
		container: &dyn CredentialContainer,
	) -> Result<Registration> {
		let Some(credential) = self.retriever.credential_for_user(username)? else {
			tracing::warn!("Could not retrieve any credentials. Job will likely fail later.");

			return Ok(Registration::Skipped);
		};

		tracing::debug!(kind = %credential.kind(), "resolving access token");

		let token = credential.resolve_access_token(&self.props, self.authority.as_ref())?;

		container.set_secret(self.key.as_bytes(), token.into_bytes());

		tracing::info!(key = %self.key, "registered access token");

		Ok(Registration::Registered { key: self.key.clone() })
	}
}
impl Debug for CredentialProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialProvider")
			.field("key", &self.key)
			.field("props", &self.props)
			.finish_non_exhaustive()
	}
}

fn registration_key(props: &Props) -> Result<String, ConfigError> {
	match props.get(keys::KEY_FOR_CREDS) {
		None => Ok(keys::KEY_FOR_CREDS_DEFAULT.to_owned()),
		Some("") => Err(ConfigError::InvalidValue {
			key: keys::KEY_FOR_CREDS.into(),
			reason: "the registration key cannot be empty".into(),
		}),
		Some(key) => Ok(key.to_owned()),
	}
}
