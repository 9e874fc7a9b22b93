//! Execution-scoped credential containers that receive resolved access tokens.

// self
use crate::_prelude::*;

/// Write side of the job runner's secret store.
///
/// The job runner owns the container and its lifecycle; the provider only calls
/// [`set_secret`](Self::set_secret), once per successful registration. Writing an existing key
/// replaces its value.
pub trait CredentialContainer
where
	Self: Send + Sync,
{
	/// Stores `value` under `key`, replacing any previous value.
	fn set_secret(&self, key: &[u8], value: Vec<u8>);
}

type SecretMap = Arc<RwLock<HashMap<Vec<u8>, Vec<u8>>>>;

/// Thread-safe in-memory [`CredentialContainer`] for embedding and tests.
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct Credentials(SecretMap);
impl Credentials {
	/// Creates an empty container.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a copy of the secret stored under `key`.
	pub fn secret(&self, key: impl AsRef<[u8]>) -> Option<Vec<u8>> {
		self.0.read().get(key.as_ref()).cloned()
	}

	/// Returns `true` when `key` holds a secret.
	pub fn contains(&self, key: impl AsRef<[u8]>) -> bool {
		self.0.read().contains_key(key.as_ref())
	}

	/// Number of stored secrets.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no secrets are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Snapshot of the stored keys.
	pub fn keys(&self) -> Vec<Vec<u8>> {
		self.0.read().keys().cloned().collect()
	}
}
impl CredentialContainer for Credentials {
	fn set_secret(&self, key: &[u8], value: Vec<u8>) {
		self.0.write().insert(key.to_vec(), value);
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let keys = self
			.0
			.read()
			.keys()
			.map(|key| String::from_utf8_lossy(key).into_owned())
			.collect::<Vec<_>>();

		f.debug_struct("Credentials").field("keys", &keys).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn last_write_wins_and_clones_share_state() {
		let creds = Credentials::new();
		let view = creds.clone();

		creds.set_secret(b"accessToken", b"first".to_vec());
		creds.set_secret(b"accessToken", b"second".to_vec());

		assert_eq!(view.len(), 1);
		assert_eq!(view.secret("accessToken"), Some(b"second".to_vec()));
	}

	#[test]
	fn debug_lists_keys_only() {
		let creds = Credentials::new();

		creds.set_secret(b"accessToken", b"eyJ0eXAi".to_vec());

		let rendered = format!("{creds:?}");

		assert!(rendered.contains("accessToken"));
		assert!(!rendered.contains("eyJ0eXAi"));
	}
}
