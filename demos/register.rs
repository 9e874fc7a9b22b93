//! Registers an access token for a job user against a mock authority, using the props-backed
//! credential retriever and the default authority client settings.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth2_job_credentials::{
	CredentialProvider, Credentials, Props, RetrieverRegistry,
	authority::{AuthorityClientBuilder, ReqwestHttpClient},
	props::keys,
	reqwest::{Client, redirect::Policy},
};

fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt().with_target(false).init();

	let server = MockServer::start();
	let token_mock = server.mock(|when, then| {
		when.method(POST).path("/tenant/oauth2/token");
		then.status(200).header("content-type", "application/json").body(
			"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
		);
	});
	let props = Props::from_iter([
		(keys::CREDENTIAL_RETRIEVER, "props".to_owned()),
		(keys::AUTHORITY, server.url("/tenant")),
		(keys::SCOPE, "https://storage.example.com/.default".to_owned()),
		("credentials.etl.client_id", "5555".to_owned()),
		("credentials.etl.client_secret", "6666".to_owned()),
	]);
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(Policy::none())
			.build()?,
	);
	let authority = AuthorityClientBuilder::from_props(&props)?.http_client(http_client).build()?;
	let registry = RetrieverRegistry::default();
	let provider = CredentialProvider::with_authority(props, &registry, Arc::new(authority))?;
	let creds = Credentials::new();

	provider.register("etl", &creds)?;
	provider.register("nobody", &creds)?;

	println!("Registered keys: {:?}.", creds);

	token_mock.assert();

	Ok(())
}
