//! Authority-facing contract and the reqwest-backed client that fulfils it.
//!
//! [`TokenAuthority`] is the only thing a [`Credential`](crate::credential::Credential) needs to
//! turn itself into an access token. [`AuthorityClient`] implements it over `oauth2` + `reqwest`
//! with a small worker pool of its own, so callers see a plain blocking call.

pub mod classify;
#[cfg(feature = "reqwest")] pub mod client;
#[cfg(feature = "reqwest")] pub mod transport;

#[cfg(feature = "reqwest")] mod exchange;

#[cfg(feature = "reqwest")] pub use client::*;
#[cfg(feature = "reqwest")] pub use transport::*;

// self
use crate::{
	_prelude::*,
	error::ExchangeError,
	props::{Props, keys},
	secret::SecretString,
};

/// Exchanges identity proofs for bearer access tokens.
///
/// Implementations are shared across registrations and threads. `exchange` blocks until the
/// authority answers or the attempt fails; it never retries.
pub trait TokenAuthority
where
	Self: Send + Sync,
{
	/// Performs one token exchange.
	fn exchange(&self, request: TokenRequest) -> Result<SecretString, ExchangeError>;
}

/// OAuth 2.0 grant types the crate can redeem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Client Credentials grant for application tokens.
	ClientCredentials,
	/// Refresh Token grant for delegated user tokens.
	RefreshToken,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::ClientCredentials => "client_credentials",
			Self::RefreshToken => "refresh_token",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Proof material carried by a [`TokenRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenGrant {
	/// `grant_type=client_credentials` with a confidential client.
	ClientCredentials {
		/// OAuth client identifier.
		client_id: String,
		/// OAuth client secret.
		client_secret: SecretString,
	},
	/// `grant_type=refresh_token` on behalf of the application identity.
	RefreshToken {
		/// Application client identifier.
		client_id: String,
		/// Application client secret, absent for public clients.
		client_secret: Option<SecretString>,
		/// Refresh token being redeemed.
		refresh_token: SecretString,
	},
}
impl TokenGrant {
	/// Grant type sent to the token endpoint.
	pub fn grant_type(&self) -> GrantType {
		match self {
			Self::ClientCredentials { .. } => GrantType::ClientCredentials,
			Self::RefreshToken { .. } => GrantType::RefreshToken,
		}
	}

	/// Client identifier that authenticates the request.
	pub fn client_id(&self) -> &str {
		match self {
			Self::ClientCredentials { client_id, .. } | Self::RefreshToken { client_id, .. } =>
				client_id,
		}
	}

	/// Client secret that authenticates the request, if any.
	pub fn client_secret(&self) -> Option<&SecretString> {
		match self {
			Self::ClientCredentials { client_secret, .. } => Some(client_secret),
			Self::RefreshToken { client_secret, .. } => client_secret.as_ref(),
		}
	}
}

/// Everything an authority needs for one exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRequest {
	/// Proof material.
	pub grant: TokenGrant,
	/// Scopes to request; empty means the authority's default.
	pub scopes: Vec<String>,
	/// `resource` form parameter, for authorities that scope tokens by audience.
	pub resource: Option<String>,
}
impl TokenRequest {
	/// Creates a request without scopes or resource.
	pub fn new(grant: TokenGrant) -> Self {
		Self { grant, scopes: Vec::new(), resource: None }
	}

	/// Creates a request using [`keys::SCOPE`] and [`keys::RESOURCE`] from `props`.
	pub fn from_props(grant: TokenGrant, props: &Props) -> Self {
		let mut request = Self::new(grant);

		if let Some(scope) = props.get(keys::SCOPE) {
			request = request.with_scopes(scope.split_whitespace());
		}
		if let Some(resource) = props.get(keys::RESOURCE).filter(|value| !value.is_empty()) {
			request = request.with_resource(resource);
		}

		request
	}

	/// Replaces the requested scopes.
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the `resource` form parameter.
	pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
		self.resource = Some(resource.into());

		self
	}
}

/// Client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}
impl ClientAuthMethod {
	/// Returns the configuration spelling of the method.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::ClientSecretBasic => "client_secret_basic",
			Self::ClientSecretPost => "client_secret_post",
		}
	}
}
impl FromStr for ClientAuthMethod {
	type Err = UnknownClientAuthMethod;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"client_secret_basic" => Ok(Self::ClientSecretBasic),
			"client_secret_post" => Ok(Self::ClientSecretPost),
			other => Err(UnknownClientAuthMethod(other.to_owned())),
		}
	}
}
impl Display for ClientAuthMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error returned when parsing an unsupported [`ClientAuthMethod`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("unsupported client authentication method `{0}`, expected client_secret_basic or client_secret_post")]
pub struct UnknownClientAuthMethod(pub String);

/// The configured authority cannot be used. Always fatal for the provider.
#[derive(Debug, ThisError)]
pub enum AuthorityError {
	/// The configuration does not name an authority.
	#[error("Configuration key `{key}` must hold the authority URL.")]
	Missing {
		/// Key that was expected to hold the URL.
		key: &'static str,
	},
	/// The URL does not parse.
	#[error("The {key} URL `{url}` cannot be parsed.")]
	Parse {
		/// Configuration key the URL came from.
		key: &'static str,
		/// Raw configured value.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The URL is not HTTPS and does not point at a loopback host.
	#[error("The {key} URL `{url}` must use HTTPS.")]
	Insecure {
		/// Configuration key the URL came from.
		key: &'static str,
		/// Offending URL.
		url: String,
	},
	/// The URL has no hierarchical path, a query, or a fragment.
	#[error("The {key} URL `{url}` must be a plain hierarchical URL.")]
	NotHierarchical {
		/// Configuration key the URL came from.
		key: &'static str,
		/// Offending URL.
		url: String,
	},
}

/// Parses and validates an authority or token endpoint URL.
///
/// HTTPS is required except for loopback hosts, which allows local test authorities.
pub fn validate_authority_url(key: &'static str, raw: &str) -> Result<Url, AuthorityError> {
	let url = Url::parse(raw.trim()).map_err(|source| AuthorityError::Parse {
		key,
		url: raw.to_owned(),
		source,
	})?;

	if url.cannot_be_a_base() || url.query().is_some() || url.fragment().is_some() {
		return Err(AuthorityError::NotHierarchical { key, url: url.to_string() });
	}

	match url.scheme() {
		"https" => Ok(url),
		"http" if is_loopback(&url) => Ok(url),
		_ => Err(AuthorityError::Insecure { key, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

/// Appends `oauth2/token` to the authority path.
pub fn default_token_endpoint(authority: &Url) -> Url {
	let mut endpoint = authority.clone();

	if let Ok(mut segments) = endpoint.path_segments_mut() {
		segments.pop_if_empty().extend(["oauth2", "token"]);
	}

	endpoint
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn authority_validation_rejects_malformed_urls() {
		assert!(matches!(
			validate_authority_url(keys::AUTHORITY, "https://localhost:88776/foo"),
			Err(AuthorityError::Parse { .. })
		));
		assert!(matches!(
			validate_authority_url(keys::AUTHORITY, "not a url"),
			Err(AuthorityError::Parse { .. })
		));
		assert!(matches!(
			validate_authority_url(keys::AUTHORITY, "http://login.example.com/tenant"),
			Err(AuthorityError::Insecure { .. })
		));
		assert!(matches!(
			validate_authority_url(keys::AUTHORITY, "mailto:ops@example.com"),
			Err(AuthorityError::NotHierarchical { .. })
		));
		assert!(matches!(
			validate_authority_url(keys::AUTHORITY, "https://login.example.com/t?x=1"),
			Err(AuthorityError::NotHierarchical { .. })
		));
	}

	#[test]
	fn authority_validation_accepts_https_and_loopback_http() {
		validate_authority_url(keys::AUTHORITY, "https://login.example.com/tenant")
			.expect("HTTPS authority should be accepted.");
		validate_authority_url(keys::AUTHORITY, "http://127.0.0.1:8080/tenant")
			.expect("Loopback HTTP authority should be accepted.");
		validate_authority_url(keys::AUTHORITY, "http://localhost:8080/")
			.expect("Localhost HTTP authority should be accepted.");
	}

	#[test]
	fn default_token_endpoint_appends_oauth2_token() {
		let cases = [
			("https://login.example.com/tenant", "https://login.example.com/tenant/oauth2/token"),
			("https://login.example.com/tenant/", "https://login.example.com/tenant/oauth2/token"),
			("https://login.example.com", "https://login.example.com/oauth2/token"),
		];

		for (authority, expected) in cases {
			let authority = Url::parse(authority).expect("Fixture URL should parse.");

			assert_eq!(default_token_endpoint(&authority).as_str(), expected);
		}
	}

	#[test]
	fn token_request_reads_scope_and_resource() {
		let grant = TokenGrant::ClientCredentials {
			client_id: "app".into(),
			client_secret: SecretString::new("s"),
		};
		let props = Props::new().with(keys::SCOPE, " a  b ").with(keys::RESOURCE, "");
		let request = TokenRequest::from_props(grant.clone(), &props);

		assert_eq!(request.scopes, vec!["a".to_owned(), "b".to_owned()]);
		assert_eq!(request.resource, None);
		assert_eq!(TokenRequest::from_props(grant, &Props::new()).scopes, Vec::<String>::new());
	}

	#[test]
	fn client_auth_method_parses_configuration_spelling() {
		assert_eq!("client_secret_post".parse(), Ok(ClientAuthMethod::ClientSecretPost));
		assert_eq!("client_secret_basic".parse(), Ok(ClientAuthMethod::ClientSecretBasic));
		assert!("basic".parse::<ClientAuthMethod>().is_err());
	}
}
