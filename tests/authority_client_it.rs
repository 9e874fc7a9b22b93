mod common;

// std
use std::net::TcpListener;
// crates.io
use httpmock::prelude::*;
// self
use common::*;
use oauth2_job_credentials::{
	AuthorityClient, TokenAuthority, TokenGrant, TokenRequest,
	authority::ClientAuthMethod,
	error::{ExchangeError, TransientError, TransportError},
};

const TOKEN_PATH: &str = "/tenant/oauth2/token";

fn client_for(server: &MockServer) -> AuthorityClient {
	AuthorityClient::builder(server.url("/tenant"))
		.http_client(test_http_client())
		.build()
		.expect("Authority client should build against the mock server.")
}

fn client_credentials() -> TokenRequest {
	TokenRequest::new(TokenGrant::ClientCredentials {
		client_id: "5555".into(),
		client_secret: "6666".into(),
	})
}

fn refresh_token() -> TokenRequest {
	TokenRequest::new(TokenGrant::RefreshToken {
		client_id: "job-runner".into(),
		client_secret: Some("app-secret".into()),
		refresh_token: "stale-refresh".into(),
	})
}

#[test]
fn client_credentials_exchange_returns_the_access_token() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(POST)
			.path(TOKEN_PATH)
			.header("authorization", "Basic NTU1NTo2NjY2")
			.header("content-type", "application/x-www-form-urlencoded");
		then.status(200).header("content-type", "application/json").body(
			"{\"access_token\":\"MyCoolAccessToken\",\"token_type\":\"bearer\",\"expires_in\":3600}",
		);
	});
	let client = client_for(&server);
	let token = client
		.exchange(client_credentials().with_scopes(["api.read"]).with_resource("https://storage"))
		.expect("Client credentials exchange should succeed.");

	assert_eq!(token.expose(), ACCESS_TOKEN);

	mock.assert();
}

#[test]
fn client_secret_post_exchange_succeeds() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(POST).path("/custom/token");
		then.status(200)
			.header("content-type", "application/json")
			.body("{\"access_token\":\"posted-token\",\"token_type\":\"bearer\"}");
	});
	let client = AuthorityClient::builder(server.url("/tenant"))
		.token_endpoint(server.url("/custom/token"))
		.client_auth(ClientAuthMethod::ClientSecretPost)
		.http_client(test_http_client())
		.build()
		.expect("Authority client should build with a custom token endpoint.");
	let token =
		client.exchange(client_credentials()).expect("Form-posted exchange should succeed.");

	assert_eq!(token.expose(), "posted-token");

	mock.assert();
}

#[test]
fn invalid_client_is_classified() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(POST).path(TOKEN_PATH);
		then.status(401)
			.header("content-type", "application/json")
			.body("{\"error\":\"invalid_client\",\"error_description\":\"bad secret\"}");
	});
	let err = client_for(&server)
		.exchange(client_credentials())
		.expect_err("Rejected client credentials should fail.");

	assert!(matches!(
		err,
		ExchangeError::InvalidClient { ref reason } if reason.contains("bad secret")
	));

	mock.assert();
}

#[test]
fn invalid_grant_on_refresh_is_classified() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(POST).path(TOKEN_PATH);
		then.status(400)
			.header("content-type", "application/json")
			.body("{\"error\":\"invalid_grant\"}");
	});
	let err = client_for(&server)
		.exchange(refresh_token())
		.expect_err("Stale refresh token should fail.");

	assert!(matches!(err, ExchangeError::InvalidGrant { .. }));

	mock.assert();
}

#[test]
fn throttling_carries_status_and_retry_after() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(POST).path(TOKEN_PATH);
		then.status(429).header("retry-after", "7");
	});
	let err = client_for(&server)
		.exchange(client_credentials())
		.expect_err("Throttled exchange should fail.");

	match err {
		ExchangeError::Transient(TransientError::TokenEndpoint { status, retry_after, .. }) => {
			assert_eq!(status, Some(429));
			assert_eq!(retry_after, Some(time::Duration::seconds(7)));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	mock.assert();
}

#[test]
fn non_oauth_server_errors_are_transient() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(POST).path(TOKEN_PATH);
		then.status(502).header("content-type", "text/plain").body("upstream exploded");
	});
	let err = client_for(&server)
		.exchange(client_credentials())
		.expect_err("Gateway failure should fail.");

	assert!(matches!(
		err,
		ExchangeError::Transient(TransientError::TokenEndpoint { status: Some(502), .. })
	));

	mock.assert();
}

#[test]
fn empty_access_token_is_rejected() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(POST).path(TOKEN_PATH);
		then.status(200)
			.header("content-type", "application/json")
			.body("{\"access_token\":\"\",\"token_type\":\"bearer\"}");
	});
	let err = client_for(&server)
		.exchange(client_credentials())
		.expect_err("Empty access token should be rejected.");

	assert!(matches!(err, ExchangeError::Transient(TransientError::TokenEndpoint { .. })));

	mock.assert();
}

#[test]
fn unreachable_authority_is_a_transport_error() {
	let port = TcpListener::bind("127.0.0.1:0")
		.and_then(|listener| listener.local_addr())
		.expect("Ephemeral port should be available.")
		.port();
	let client = AuthorityClient::builder(format!("http://127.0.0.1:{port}/tenant"))
		.http_client(test_http_client())
		.build()
		.expect("Loopback authority should build.");
	let err = client.exchange(client_credentials()).expect_err("Closed port should fail.");

	assert!(matches!(err, ExchangeError::Transport(TransportError::Network { .. })));
}

#[test]
fn concurrent_exchanges_share_one_client() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(POST).path(TOKEN_PATH);
		then.status(200)
			.header("content-type", "application/json")
			.body("{\"access_token\":\"shared\",\"token_type\":\"bearer\"}");
	});
	let client = client_for(&server);

	std::thread::scope(|scope| {
		for _ in 0..6 {
			let client = &client;

			scope.spawn(move || {
				let token =
					client.exchange(client_credentials()).expect("Exchange should succeed.");

				assert_eq!(token.expose(), "shared");
			});
		}
	});

	mock.assert_calls(6);
}

#[test]
fn single_thread_pool_resolves_hostnames_for_concurrent_exchanges() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(POST).path(TOKEN_PATH);
		then.status(200)
			.header("content-type", "application/json")
			.body("{\"access_token\":\"resolved\",\"token_type\":\"bearer\"}");
	});
	let client = AuthorityClient::builder(format!("http://localhost:{}/tenant", server.port()))
		.worker_threads(1)
		.http_client(test_http_client())
		.build()
		.expect("Single-thread authority client should build.");

	std::thread::scope(|scope| {
		for _ in 0..4 {
			let client = &client;

			scope.spawn(move || {
				let token =
					client.exchange(client_credentials()).expect("Exchange should succeed.");

				assert_eq!(token.expose(), "resolved");
			});
		}
	});

	mock.assert_calls(4);
}
