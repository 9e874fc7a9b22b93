//! Observability for credential registration.
//!
//! - Every `register` call runs inside a `job_credentials.register` span carrying the `user`
//!   field; see [`registration_span`].
//! - Enable `metrics` to increment the `oauth2_job_credentials_registration_total` counter for
//!   every attempt and its outcome, labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegistrationOutcome {
	/// Entry to `register`.
	Attempt,
	/// A token was written to the container.
	Registered,
	/// The retriever had no credential for the user.
	Skipped,
	/// The lookup or the exchange failed.
	Failure,
}
impl RegistrationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Attempt => "attempt",
			Self::Registered => "registered",
			Self::Skipped => "skipped",
			Self::Failure => "failure",
		}
	}
}
impl Display for RegistrationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
