//! Crate-level error types shared by the loader, the authority client, and the provider.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used for plugin and transport sources.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The configured credential retriever could not be resolved or built.
	#[error(transparent)]
	Plugin(#[from] crate::retriever::PluginError),
	/// The configured authority is missing or malformed.
	#[error(transparent)]
	Authority(#[from] crate::authority::AuthorityError),
	/// Local configuration problem detected while building the provider.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The authority refused or failed the token exchange.
	#[error(transparent)]
	Exchange(#[from] ExchangeError),
	/// The credential retriever failed instead of reporting an absent credential.
	#[error(transparent)]
	Lookup(#[from] crate::retriever::LookupError),
}
impl Error {
	/// Reports whether the failure aborted provider construction or a single registration.
	pub fn stage(&self) -> ErrorStage {
		match self {
			Self::Plugin(_) | Self::Authority(_) | Self::Config(_) => ErrorStage::Construction,
			Self::Exchange(_) | Self::Lookup(_) => ErrorStage::Registration,
		}
	}
}

/// Point in the provider lifecycle where an [`Error`] surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorStage {
	/// No provider exists; the dependent job step cannot start.
	Construction,
	/// The provider is intact; only the current `register` call failed.
	Registration,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required key is absent.
	#[error("Configuration key `{key}` is required.")]
	MissingKey {
		/// Missing configuration key.
		key: String,
	},
	/// A key holds a value that cannot be used.
	#[error("Configuration key `{key}` has an invalid value: {reason}.")]
	InvalidValue {
		/// Offending configuration key.
		key: String,
		/// Why the value was rejected.
		reason: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// The authority worker pool could not be started.
	#[error("Authority worker pool could not be started.")]
	WorkerPool {
		/// Underlying runtime builder failure.
		#[source]
		source: std::io::Error,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// The token endpoint was rejected by the OAuth client.
	#[error("Token endpoint URL is invalid.")]
	InvalidTokenEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failure to turn a credential into an access token.
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// The request could not be assembled from configuration.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; the caller may retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS, worker pool).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Requested scopes or resource are not granted to the client.
	#[error("Authority refused the requested scope: {reason}.")]
	InsufficientScope {
		/// Authority-supplied reason string.
		reason: String,
	},
	/// Authority rejected the grant (e.g., an expired refresh token).
	#[error("Authority rejected the grant: {reason}.")]
	InvalidGrant {
		/// Authority-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or the credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Authority-supplied reason string.
		reason: String,
	},
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Authority returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Authority responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO, worker pool).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
	/// The exchange task did not complete on the worker pool.
	#[error("Token exchange task did not complete.")]
	Worker {
		/// Join or cancellation failure reported by the pool.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a worker pool failure.
	pub fn worker(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Worker { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
