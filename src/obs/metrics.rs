// self
use crate::obs::RegistrationOutcome;

/// Records a registration outcome via the global metrics recorder (when enabled).
pub fn record_registration_outcome(outcome: RegistrationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_job_credentials_registration_total",
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_registration_outcome_without_recorder() {
		record_registration_outcome(RegistrationOutcome::Failure);
	}
}
