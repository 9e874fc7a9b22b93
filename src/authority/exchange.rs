//! One OAuth 2.0 token exchange over `oauth2` + the instrumented reqwest transport.

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError,
	RefreshToken, RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	authority::{
		ClientAuthMethod, GrantType, TokenGrant, TokenRequest,
		classify::{TokenErrorContext, TokenErrorKind},
		transport::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	},
	error::{ConfigError, ExchangeError, TransientError, TransportError},
	secret::SecretString,
};

type TokenClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type RequestError = BasicRequestTokenError<HttpClientError<ReqwestError>>;

/// Owned inputs for one exchange, so the future can move onto the worker pool.
pub(crate) struct Exchange {
	pub(crate) http_client: ReqwestHttpClient,
	pub(crate) token_url: TokenUrl,
	pub(crate) client_auth: ClientAuthMethod,
	pub(crate) request: TokenRequest,
}
impl Exchange {
	pub(crate) async fn run(self) -> Result<SecretString, ExchangeError> {
		let Self { http_client, token_url, client_auth, request } = self;
		let TokenRequest { grant, scopes, resource } = request;
		let grant_type = grant.grant_type();
		let meta = ResponseMetadataSlot::default();
		let handle = http_client.instrumented(meta.clone());
		let client = oauth_client(&grant, token_url, client_auth);
		let scopes = scopes.into_iter().map(Scope::new);
		let response = match &grant {
			TokenGrant::ClientCredentials { .. } => {
				let mut request = client.exchange_client_credentials().add_scopes(scopes);

				if let Some(resource) = resource {
					request = request.add_extra_param("resource", resource);
				}

				request.request_async(&handle).await
			},
			TokenGrant::RefreshToken { refresh_token, .. } => {
				let refresh_token = RefreshToken::new(refresh_token.expose().to_owned());
				let mut request = client.exchange_refresh_token(&refresh_token).add_scopes(scopes);

				if let Some(resource) = resource {
					request = request.add_extra_param("resource", resource);
				}

				request.request_async(&handle).await
			},
		}
		.map_err(|err| map_request_error(grant_type, meta.take(), err))?;
		let access_token = response.access_token().secret();

		if access_token.is_empty() {
			return Err(TransientError::TokenEndpoint {
				message: "access_token is empty".into(),
				status: None,
				retry_after: None,
			}
			.into());
		}

		Ok(SecretString::new(access_token.to_owned()))
	}
}

fn oauth_client(
	grant: &TokenGrant,
	token_url: TokenUrl,
	client_auth: ClientAuthMethod,
) -> TokenClient {
	let mut client =
		BasicClient::new(ClientId::new(grant.client_id().to_owned())).set_token_uri(token_url);

	if let Some(secret) = grant.client_secret() {
		client = client.set_client_secret(ClientSecret::new(secret.expose().to_owned()));
	}
	if matches!(client_auth, ClientAuthMethod::ClientSecretPost) {
		client = client.set_auth_type(AuthType::RequestBody);
	}

	client
}

fn map_request_error(
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: RequestError,
) -> ExchangeError {
	let meta = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response(response, meta),
		RequestTokenError::Request(error) => map_transport_error(grant, meta, error),
		RequestTokenError::Parse(source, body) => {
			let ctx = with_status(
				TokenErrorContext::new().with_body_preview(String::from_utf8_lossy(&body)),
				meta,
			);

			match meta_status(meta) {
				// Non-2xx bodies that are not OAuth JSON still carry a classifiable status.
				Some(status) if !(200..300).contains(&status) => classified(
					ctx.classify(),
					format!("Token endpoint answered HTTP {status} with a non-OAuth body"),
					meta,
				),
				status => TransientError::TokenResponseParse { source, status }.into(),
			}
		},
		RequestTokenError::Other(message) => transient(message, meta),
	}
}

fn map_server_response(
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> ExchangeError {
	let code = response.error().as_ref().to_string();
	let mut ctx = TokenErrorContext::new().with_oauth_error(code.clone());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}

	let ctx = with_status(ctx, meta);
	let message = match response.error_description() {
		Some(description) => format!("{code}: {description}"),
		None => code,
	};

	classified(ctx.classify(), message, meta)
}

fn map_transport_error(
	grant: GrantType,
	meta: Option<&ResponseMetadata>,
	err: HttpClientError<ReqwestError>,
) -> ExchangeError {
	match err {
		HttpClientError::Reqwest(inner) => map_reqwest_error(grant, meta, *inner),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => transient(
			format!("HTTP client error while calling the token endpoint: {message}"),
			meta,
		),
		_ => transient("HTTP client error while calling the token endpoint".into(), meta),
	}
}

fn map_reqwest_error(
	grant: GrantType,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> ExchangeError {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "request to the token endpoint timed out".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	tracing::debug!(grant = %grant, error = %err, "token endpoint unreachable");

	TransportError::from(err).into()
}

fn classified(
	kind: TokenErrorKind,
	reason: String,
	meta: Option<&ResponseMetadata>,
) -> ExchangeError {
	match kind {
		TokenErrorKind::InvalidGrant => ExchangeError::InvalidGrant { reason },
		TokenErrorKind::InvalidClient => ExchangeError::InvalidClient { reason },
		TokenErrorKind::InsufficientScope => ExchangeError::InsufficientScope { reason },
		TokenErrorKind::Transient => transient(reason, meta),
	}
}

fn transient(message: String, meta: Option<&ResponseMetadata>) -> ExchangeError {
	TransientError::TokenEndpoint {
		message,
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn with_status(ctx: TokenErrorContext, meta: Option<&ResponseMetadata>) -> TokenErrorContext {
	match meta_status(meta) {
		Some(status) => ctx.with_http_status(status),
		None => ctx,
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}
