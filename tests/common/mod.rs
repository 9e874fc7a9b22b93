#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use parking_lot::Mutex;
// self
#[cfg(feature = "reqwest")]
use oauth2_job_credentials::{authority::ReqwestHttpClient, reqwest};
use oauth2_job_credentials::{
	Credential, CredentialRetriever, LookupError, Props, RetrieverRegistry, SecretString,
	TokenAuthority, TokenRequest, error::ExchangeError,
};

pub const ACCESS_TOKEN: &str = "MyCoolAccessToken";
pub const MOCK_USER: &str = "myuser";

/// Authority that issues [`ACCESS_TOKEN`] for every request and records what it was asked.
#[derive(Default)]
pub struct MockAuthority {
	requests: Mutex<Vec<TokenRequest>>,
}
impl MockAuthority {
	pub fn shared() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn requests(&self) -> Vec<TokenRequest> {
		self.requests.lock().clone()
	}
}
impl TokenAuthority for MockAuthority {
	fn exchange(&self, request: TokenRequest) -> Result<SecretString, ExchangeError> {
		self.requests.lock().push(request);

		Ok(SecretString::new(ACCESS_TOKEN))
	}
}

/// Retriever that serves [`MOCK_USER`] and refuses everyone else.
pub struct MockRetriever;
impl CredentialRetriever for MockRetriever {
	fn credential_for_user(&self, username: &str) -> Result<Option<Credential>, LookupError> {
		if username == MOCK_USER {
			Ok(Some(Credential::client_secret("myClientId", "myClientSecret")))
		} else {
			Err(LookupError::UnsupportedUser { username: username.to_owned() })
		}
	}
}

/// Retriever that never has a credential.
pub struct EmptyRetriever;
impl CredentialRetriever for EmptyRetriever {
	fn credential_for_user(&self, _username: &str) -> Result<Option<Credential>, LookupError> {
		Ok(None)
	}
}

/// Default registry plus the `mock` and `empty` test retrievers.
pub fn registry() -> RetrieverRegistry {
	RetrieverRegistry::default()
		.with("mock", |_: &Props| Ok::<_, LookupError>(MockRetriever))
		.expect("`mock` should register.")
		.with("empty", |_: &Props| Ok::<_, LookupError>(EmptyRetriever))
		.expect("`empty` should register.")
}

/// HTTP client that accepts the self-signed certificates `httpmock` serves.
#[cfg(feature = "reqwest")]
pub fn test_http_client() -> ReqwestHttpClient {
	let client = reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(reqwest::redirect::Policy::none())
		.build()
		.expect("Failed to build insecure reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}
