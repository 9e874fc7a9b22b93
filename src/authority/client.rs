//! Shared [`TokenAuthority`] backed by `oauth2`, `reqwest`, and a private tokio worker pool.

// std
use std::sync::mpsc;
// crates.io
use oauth2::TokenUrl;
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};
// self
use crate::{
	_prelude::*,
	authority::{
		AuthorityError, ClientAuthMethod, TokenAuthority, TokenRequest, default_token_endpoint,
		exchange::Exchange, transport::ReqwestHttpClient, validate_authority_url,
	},
	error::{ConfigError, ExchangeError, TransportError},
	props::{Props, keys},
	secret::SecretString,
};

const WORKER_THREAD_NAME: &str = "credential-authority";

/// Configures an [`AuthorityClient`].
#[derive(Debug)]
pub struct AuthorityClientBuilder {
	authority: String,
	token_endpoint: Option<String>,
	client_auth: ClientAuthMethod,
	worker_threads: usize,
	http_client: Option<ReqwestHttpClient>,
}
impl AuthorityClientBuilder {
	/// Starts a builder for `authority` with default settings.
	pub fn new(authority: impl Into<String>) -> Self {
		Self {
			authority: authority.into(),
			token_endpoint: None,
			client_auth: ClientAuthMethod::default(),
			worker_threads: keys::WORKER_THREADS_DEFAULT,
			http_client: None,
		}
	}

	/// Seeds a builder from the `provider.*` keys in `props`.
	pub fn from_props(props: &Props) -> Result<Self> {
		let authority = props
			.get(keys::AUTHORITY)
			.ok_or(AuthorityError::Missing { key: keys::AUTHORITY })?;
		let mut builder = Self::new(authority);

		if let Some(endpoint) = props.get(keys::TOKEN_ENDPOINT) {
			builder = builder.token_endpoint(endpoint);
		}
		if let Some(method) = props.parse(keys::CLIENT_AUTH)? {
			builder = builder.client_auth(method);
		}
		if let Some(threads) = props.parse(keys::WORKER_THREADS)? {
			builder = builder.worker_threads(threads);
		}

		Ok(builder)
	}

	/// Overrides the token endpoint derived from the authority.
	pub fn token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.token_endpoint = Some(endpoint.into());

		self
	}

	/// Sets how client credentials are presented to the token endpoint.
	pub fn client_auth(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth = method;

		self
	}

	/// Sets the worker pool size, which also caps blocking threads. Must be at least one.
	pub fn worker_threads(mut self, threads: usize) -> Self {
		self.worker_threads = threads;

		self
	}

	/// Uses a caller-supplied HTTP client.
	pub fn http_client(mut self, client: ReqwestHttpClient) -> Self {
		self.http_client = Some(client);

		self
	}

	/// Validates the configuration and starts the worker pool.
	pub fn build(self) -> Result<AuthorityClient> {
		let authority = validate_authority_url(keys::AUTHORITY, &self.authority)?;
		let token_endpoint = match &self.token_endpoint {
			Some(raw) => validate_authority_url(keys::TOKEN_ENDPOINT, raw)?,
			None => default_token_endpoint(&authority),
		};
		let token_url = TokenUrl::new(token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidTokenEndpoint { source })?;

		if self.worker_threads == 0 {
			return Err(ConfigError::InvalidValue {
				key: keys::WORKER_THREADS.into(),
				reason: "the worker pool needs at least one thread".into(),
			}
			.into());
		}

		let http_client = match self.http_client {
			Some(client) => client,
			None => ReqwestHttpClient::new()?,
		};
		let runtime = RuntimeBuilder::new_multi_thread()
			.worker_threads(self.worker_threads)
			.max_blocking_threads(self.worker_threads)
			.thread_name(WORKER_THREAD_NAME)
			.enable_all()
			.build()
			.map_err(|source| ConfigError::WorkerPool { source })?;

		tracing::debug!(
			authority = %authority,
			token_endpoint = %token_endpoint,
			client_auth = %self.client_auth,
			worker_threads = self.worker_threads,
			"authority client ready"
		);

		Ok(AuthorityClient(Arc::new(AuthorityInner {
			authority,
			token_endpoint,
			token_url,
			client_auth: self.client_auth,
			worker_threads: self.worker_threads,
			http_client,
			runtime: Some(runtime),
		})))
	}
}

/// Thread-safe client for one authority.
///
/// Built once per provider and shared by every registration. Each
/// [`exchange`](TokenAuthority::exchange) runs on the client's own worker pool and blocks the
/// calling thread until the authority answers, so callers never need an async runtime.
#[derive(Clone)]
pub struct AuthorityClient(Arc<AuthorityInner>);
impl AuthorityClient {
	/// Starts a builder for `authority`.
	pub fn builder(authority: impl Into<String>) -> AuthorityClientBuilder {
		AuthorityClientBuilder::new(authority)
	}

	/// Builds a client from the `provider.*` keys in `props`.
	///
	/// Fails with [`AuthorityError`] when [`keys::AUTHORITY`] is absent or unusable, and with
	/// [`ConfigError`] when the pool or HTTP client cannot be set up.
	pub fn from_props(props: &Props) -> Result<Self> {
		AuthorityClientBuilder::from_props(props)?.build()
	}

	/// Validated authority URL.
	pub fn authority(&self) -> &Url {
		&self.0.authority
	}

	/// Token endpoint every exchange is sent to.
	pub fn token_endpoint(&self) -> &Url {
		&self.0.token_endpoint
	}

	/// Client authentication method.
	pub fn client_auth(&self) -> ClientAuthMethod {
		self.0.client_auth
	}

	/// Worker pool size.
	pub fn worker_threads(&self) -> usize {
		self.0.worker_threads
	}
}
impl TokenAuthority for AuthorityClient {
	fn exchange(&self, request: TokenRequest) -> Result<SecretString, ExchangeError> {
		let inner = &self.0;
		let runtime = inner.runtime.as_ref().ok_or_else(|| {
			TransportError::Io(std::io::Error::other("authority worker pool is shut down"))
		})?;

		tracing::debug!(
			grant = %request.grant.grant_type(),
			token_endpoint = %inner.token_endpoint,
			"exchanging credential for an access token"
		);

		let exchange = Exchange {
			http_client: inner.http_client.clone(),
			token_url: inner.token_url.clone(),
			client_auth: inner.client_auth,
			request,
		};
		let (tx, rx) = mpsc::sync_channel(1);

		runtime.spawn(async move {
			// The receiver only disappears if the caller's thread is gone.
			let _ = tx.send(exchange.run().await);
		});

		rx.recv().map_err(TransportError::worker)?
	}
}
impl Debug for AuthorityClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorityClient")
			.field("authority", &self.0.authority.as_str())
			.field("token_endpoint", &self.0.token_endpoint.as_str())
			.field("client_auth", &self.0.client_auth)
			.field("worker_threads", &self.0.worker_threads)
			.finish()
	}
}

struct AuthorityInner {
	authority: Url,
	token_endpoint: Url,
	token_url: TokenUrl,
	client_auth: ClientAuthMethod,
	worker_threads: usize,
	http_client: ReqwestHttpClient,
	runtime: Option<Runtime>,
}
impl Drop for AuthorityInner {
	fn drop(&mut self) {
		// A plain runtime drop panics when it happens inside an async context.
		if let Some(runtime) = self.runtime.take() {
			runtime.shutdown_background();
		}
	}
}
