//! Attach OAuth 2.0 access tokens to job credential containers.
//!
//! A [`CredentialProvider`] is built once from flat [`Props`]: it loads the configured
//! [`CredentialRetriever`] from a [`RetrieverRegistry`] and a shared [`TokenAuthority`]. Each
//! [`CredentialProvider::register`] call then looks up the job user's [`Credential`],
//! exchanges it for a bearer access token, and writes the token into the job's
//! [`CredentialContainer`] under the configured key.
//!
//! ```no_run
//! use oauth2_job_credentials::{CredentialProvider, Credentials, Props, RetrieverRegistry};
//!
//! # fn main() -> oauth2_job_credentials::Result<()> {
//! let props = Props::from_iter([
//!     ("provider.credential_retriever", "props"),
//!     ("provider.authority", "https://login.example.com/tenant"),
//!     ("credentials.etl.client_id", "5555"),
//!     ("credentials.etl.client_secret", "6666"),
//! ]);
//! let provider = CredentialProvider::new(props, &RetrieverRegistry::default())?;
//! let creds = Credentials::new();
//!
//! provider.register("etl", &creds)?;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod authority;
pub mod container;
pub mod credential;
pub mod error;
pub mod obs;
pub mod props;
pub mod provider;
pub mod retriever;
pub mod secret;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		str::FromStr,
		sync::Arc,
	};
	#[cfg(feature = "reqwest")]
	pub use std::{future::Future, pin::Pin};

	#[cfg(feature = "reqwest")]
	pub use parking_lot::Mutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::Duration;
	#[cfg(feature = "reqwest")]
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::Result;
}

#[cfg(feature = "reqwest")] pub use authority::AuthorityClient;
pub use authority::{TokenAuthority, TokenGrant, TokenRequest};
pub use container::{CredentialContainer, Credentials};
pub use credential::Credential;
pub use error::{Error, Result};
pub use props::Props;
pub use provider::{CredentialProvider, Registration};
#[cfg(feature = "reqwest")] pub use reqwest;
pub use retriever::{CredentialRetriever, LookupError, PropsRetriever, RetrieverRegistry};
pub use secret::SecretString;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tracing_subscriber as _};
