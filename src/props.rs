//! Flat, dotted-key configuration consumed by the credential provider.
//!
//! [`Props`] is the read side of whatever property source the job runner loads. The crate
//! never writes back into it; it only looks up keys listed in [`keys`] plus the
//! retriever-owned entries under [`keys::CREDENTIALS_PREFIX`].

// self
use crate::{_prelude::*, error::ConfigError};

/// Configuration keys understood by the crate.
pub mod keys {
	/// Identifier of the credential retriever to load from the registry.
	pub const CREDENTIAL_RETRIEVER: &str = "provider.credential_retriever";
	/// Base URL of the authority that issues access tokens.
	pub const AUTHORITY: &str = "provider.authority";
	/// Absolute token endpoint; defaults to `<authority>/oauth2/token`.
	pub const TOKEN_ENDPOINT: &str = "provider.token_endpoint";
	/// Container key the access token is registered under.
	pub const KEY_FOR_CREDS: &str = "provider.key_for_creds";
	/// Registration key used when [`KEY_FOR_CREDS`] is unset.
	pub const KEY_FOR_CREDS_DEFAULT: &str = "accessToken";
	/// Application client identifier used by refresh-token credentials.
	pub const CLIENT_ID: &str = "provider.client_id";
	/// Optional application client secret used by refresh-token credentials.
	pub const CLIENT_SECRET: &str = "provider.client_secret";
	/// Client authentication method (`client_secret_basic` or `client_secret_post`).
	pub const CLIENT_AUTH: &str = "provider.client_auth";
	/// Whitespace-separated scopes requested on every exchange.
	pub const SCOPE: &str = "provider.scope";
	/// `resource` form parameter sent on every exchange.
	pub const RESOURCE: &str = "provider.resource";
	/// Size of the authority worker pool.
	pub const WORKER_THREADS: &str = "provider.worker_threads";
	/// Worker pool size used when [`WORKER_THREADS`] is unset.
	pub const WORKER_THREADS_DEFAULT: usize = 2;
	/// Prefix owned by the props-backed credential retriever.
	pub const CREDENTIALS_PREFIX: &str = "credentials.";
}

/// Ordered string-to-string configuration map.
///
/// Values may hold client secrets, so the [`Debug`] implementation prints keys only.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Props(BTreeMap<String, String>);
impl Props {
	/// Creates an empty property set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces a property, returning the previous value.
	pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
		self.0.insert(key.into(), value.into())
	}

	/// Builder-style variant of [`put`](Self::put).
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.put(key, value);

		self
	}

	/// Returns the value stored at `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// Returns `true` when `key` is present, even if its value is empty.
	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	/// Returns the value at `key` or a [`ConfigError::MissingKey`].
	pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
		self.get(key).ok_or_else(|| ConfigError::MissingKey { key: key.to_owned() })
	}

	/// Parses the value at `key`, returning `None` when the key is absent.
	pub fn parse<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
	where
		T: FromStr,
		T::Err: Display,
	{
		let Some(raw) = self.get(key) else {
			return Ok(None);
		};

		raw.trim().parse::<T>().map(Some).map_err(|e| ConfigError::InvalidValue {
			key: key.to_owned(),
			reason: e.to_string(),
		})
	}

	/// Returns every entry whose key starts with `prefix`, with the prefix stripped.
	pub fn map_by_prefix(&self, prefix: &str) -> BTreeMap<String, String> {
		self.0
			.range(prefix.to_owned()..)
			.take_while(|(key, _)| key.starts_with(prefix))
			.map(|(key, value)| (key[prefix.len()..].to_owned(), value.clone()))
			.collect()
	}

	/// Number of properties.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no properties are set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterator over property keys in order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}
}
impl Debug for Props {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Props").field("keys", &self.0.keys().collect::<Vec<_>>()).finish()
	}
}
impl<K, V> FromIterator<(K, V)> for Props
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
impl<K, V> Extend<(K, V)> for Props
where
	K: Into<String>,
	V: Into<String>,
{
	fn extend<I>(&mut self, iter: I)
	where
		I: IntoIterator<Item = (K, V)>,
	{
		self.0.extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
	}
}
