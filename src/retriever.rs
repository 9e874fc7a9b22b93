//! Credential retrievers (username → [`Credential`]) and the registry that loads them by name.
//!
//! `props` holds the built-in [`PropsRetriever`], which reads `credentials.<user>.<field>`
//! entries straight out of the job configuration. `registry` maps configured identifiers to
//! retriever factories so deployments can plug in their own backend (a vault lookup, a
//! database) without touching the provider.

pub mod props;
pub mod registry;

pub use props::*;
pub use registry::*;

// self
use crate::{_prelude::*, credential::Credential};

/// Maps a username to the credential the authority should see for that user.
///
/// Lookups are pure reads and must not perform network I/O. Returning `Ok(None)` means the
/// user simply has no credential; the provider logs a warning and skips registration.
/// Returning `Err` means the retriever could not answer, and the registration call fails.
pub trait CredentialRetriever
where
	Self: Send + Sync,
{
	/// Returns the credential configured for `username`, if any.
	fn credential_for_user(&self, username: &str) -> Result<Option<Credential>, LookupError>;
}

/// Failure reported by a retriever that could not answer a lookup.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum LookupError {
	/// The retriever refuses to serve this user at all.
	#[error("Credential retriever does not support user `{username}`.")]
	UnsupportedUser {
		/// Username passed to the lookup.
		username: String,
	},
	/// The retriever's backing store failed.
	#[error("Credential backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	struct SingleUser;
	impl CredentialRetriever for SingleUser {
		fn credential_for_user(&self, username: &str) -> Result<Option<Credential>, LookupError> {
			match username {
				"myuser" => Ok(Some(Credential::client_secret("id", "secret"))),
				_ => Err(LookupError::UnsupportedUser { username: username.into() }),
			}
		}
	}

	#[test]
	fn retrievers_are_usable_as_trait_objects() {
		let retriever: Arc<dyn CredentialRetriever> = Arc::new(SingleUser);

		let known = retriever.credential_for_user("myuser").expect("Known user should resolve.");

		assert!(known.is_some());
		assert_eq!(
			retriever.credential_for_user("otheruser"),
			Err(LookupError::UnsupportedUser { username: "otheruser".into() })
		);
	}
}
