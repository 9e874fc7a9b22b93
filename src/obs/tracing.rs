/// Span wrapping one `register` call.
///
/// The span is created at `INFO` so the `user` field accompanies every event the lookup and the
/// exchange emit beneath it.
pub fn registration_span(username: &str) -> tracing::Span {
	tracing::info_span!("job_credentials.register", user = username)
}
