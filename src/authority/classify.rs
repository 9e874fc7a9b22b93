//! Maps token endpoint failures onto the crate's exchange error taxonomy.
//!
//! Classification only looks at plain data (status code, OAuth fields, body preview), so it
//! stays independent of the HTTP stack that produced the failure.

// self
use crate::_prelude::*;

/// Canonical categories for a failed token exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenErrorKind {
	/// The authority rejected the grant (bad or expired refresh token).
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Requested scopes or resource are not granted.
	InsufficientScope,
	/// Failure is temporary and may be retried by the caller.
	Transient,
}

/// Facts about one failed token request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenErrorContext {
	/// HTTP status code, when a response arrived.
	pub http_status: Option<u16>,
	/// OAuth `error` field.
	pub oauth_error: Option<String>,
	/// OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Start of a non-JSON response body.
	pub body_preview: Option<String>,
}
impl TokenErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth `error` code.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description`.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds a truncated body preview.
	pub fn with_body_preview(mut self, body: impl AsRef<str>) -> Self {
		let body = body.as_ref();
		let mut preview = body.chars().take(Self::BODY_PREVIEW_LIMIT).collect::<String>();

		if preview.len() < body.len() {
			preview.push('…');
		}

		self.body_preview = Some(preview);

		self
	}

	/// Classifies the failure.
	///
	/// Structured OAuth fields win over body hints, which win over the status code.
	pub fn classify(&self) -> TokenErrorKind {
		classify_oauth_error(self.oauth_error.as_deref(), self.error_description.as_deref())
			.or_else(|| classify_body(self.body_preview.as_deref()))
			.unwrap_or_else(|| classify_status(self.http_status))
	}
}

fn classify_oauth_error(
	oauth_error: Option<&str>,
	error_description: Option<&str>,
) -> Option<TokenErrorKind> {
	oauth_error
		.and_then(match_error_code)
		.or_else(|| error_description.and_then(match_error_code))
		.or_else(|| classify_body(error_description))
}

fn match_error_code(value: &str) -> Option<TokenErrorKind> {
	const INVALID_GRANT: [&str; 2] = ["invalid_grant", "access_denied"];
	const INVALID_CLIENT: [&str; 2] = ["invalid_client", "unauthorized_client"];
	const INSUFFICIENT_SCOPE: [&str; 3] =
		["invalid_scope", "insufficient_scope", "invalid_resource"];
	const TRANSIENT: [&str; 2] = ["temporarily_unavailable", "server_error"];

	let matches = |codes: &[&str]| codes.iter().any(|code| value.eq_ignore_ascii_case(code));

	if matches(&INVALID_GRANT) {
		Some(TokenErrorKind::InvalidGrant)
	} else if matches(&INVALID_CLIENT) {
		Some(TokenErrorKind::InvalidClient)
	} else if matches(&INSUFFICIENT_SCOPE) {
		Some(TokenErrorKind::InsufficientScope)
	} else if matches(&TRANSIENT) {
		Some(TokenErrorKind::Transient)
	} else {
		None
	}
}

fn classify_body(body: Option<&str>) -> Option<TokenErrorKind> {
	let lowered = body?.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant") => Some(TokenErrorKind::InvalidGrant),
		text if text.contains("invalid_client") => Some(TokenErrorKind::InvalidClient),
		text if text.contains("insufficient_scope") || text.contains("invalid_scope") =>
			Some(TokenErrorKind::InsufficientScope),
		text if text.contains("temporarily_unavailable") || text.contains("retry") =>
			Some(TokenErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> TokenErrorKind {
	match status {
		Some(400 | 404 | 410) => TokenErrorKind::InvalidGrant,
		Some(401) => TokenErrorKind::InvalidClient,
		Some(403) => TokenErrorKind::InsufficientScope,
		_ => TokenErrorKind::Transient,
	}
}
