//! Retriever backed by `credentials.<user>.<field>` configuration entries.

// self
use crate::{
	_prelude::*,
	credential::{Credential, CredentialKind},
	props::{Props, keys},
	retriever::{CredentialRetriever, LookupError},
};

const CLIENT_ID: &str = "client_id";
const CLIENT_SECRET: &str = "client_secret";
const REFRESH_TOKEN: &str = "refresh_token";

/// Configuration entry rejected while building a [`PropsRetriever`].
///
/// Rejected entries never produce a credential; construction continues without them.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum MalformedEntry {
	/// Key has no `.<field>` part after the username.
	#[error("Entry `{key}` does not name a field.")]
	MissingField {
		/// Key with the `credentials.` prefix stripped.
		key: String,
	},
	/// Key starts with the separator, leaving the username empty.
	#[error("Entry `{key}` does not name a user.")]
	MissingUsername {
		/// Key with the `credentials.` prefix stripped.
		key: String,
	},
	/// A `client_id` has no sibling `client_secret`.
	#[error("User `{username}` has a client_id but no client_secret.")]
	MissingClientSecret {
		/// Affected user.
		username: String,
	},
	/// A `client_secret` has no sibling `client_id`.
	#[error("User `{username}` has a client_secret but no client_id.")]
	MissingClientId {
		/// Affected user.
		username: String,
	},
	/// A credential field is present but empty.
	#[error("User `{username}` has an empty {field}.")]
	EmptyValue {
		/// Affected user.
		username: String,
		/// Empty field name.
		field: &'static str,
	},
	/// The user already has a credential of another kind.
	#[error("User `{username}` already has a {existing} credential; ignoring {field}.")]
	Conflicting {
		/// Affected user.
		username: String,
		/// Credential kind that was kept.
		existing: CredentialKind,
		/// Field that was ignored.
		field: String,
	},
	/// Field name is not understood.
	#[error("User `{username}` has unknown field `{field}`.")]
	UnknownField {
		/// Affected user.
		username: String,
		/// Unrecognized field name.
		field: String,
	},
}
impl MalformedEntry {
	/// Returns `true` when the entry looked like a credential but could not be used.
	pub fn is_incomplete(&self) -> bool {
		!matches!(self, Self::UnknownField { .. })
	}
}

/// Immutable username → credential map built once from configuration.
///
/// Supported entries, all under [`keys::CREDENTIALS_PREFIX`]:
///
/// ```text
/// credentials.alice.client_id     = 1234
/// credentials.alice.client_secret = 5678
/// credentials.bob.refresh_token   = 9999
/// ```
///
/// The remainder of each key is split on its first `.`, so usernames cannot contain one. A
/// `client_id` needs its `client_secret` sibling; a user with both a client secret pair and a
/// refresh token keeps the client secret.
#[derive(Clone, Debug, Default)]
pub struct PropsRetriever {
	credentials: HashMap<String, Credential>,
	dropped: Vec<MalformedEntry>,
}
impl PropsRetriever {
	/// Registry identifier of the built-in retriever.
	pub const NAME: &'static str = "props";

	/// Builds the retriever from every entry under [`keys::CREDENTIALS_PREFIX`].
	pub fn new(props: &Props) -> Self {
		let entries = props.map_by_prefix(keys::CREDENTIALS_PREFIX);
		let mut retriever = Self::default();

		for (key, value) in &entries {
			let Some((username, field)) = key.split_once('.') else {
				retriever.drop_entry(MalformedEntry::MissingField { key: key.clone() });

				continue;
			};

			if username.is_empty() {
				retriever.drop_entry(MalformedEntry::MissingUsername { key: key.clone() });

				continue;
			}

			match field {
				CLIENT_ID => {
					let Some(secret) = entries.get(&format!("{username}.{CLIENT_SECRET}")) else {
						retriever.drop_entry(MalformedEntry::MissingClientSecret {
							username: username.to_owned(),
						});

						continue;
					};

					if value.is_empty() || secret.is_empty() {
						let field = if value.is_empty() { CLIENT_ID } else { CLIENT_SECRET };

						retriever.drop_entry(MalformedEntry::EmptyValue {
							username: username.to_owned(),
							field,
						});

						continue;
					}

					tracing::info!(
						user = username,
						client_id = %value,
						"adding client secret credential"
					);

					retriever.insert(username, field, Credential::client_secret(value, secret.as_str()));
				},
				CLIENT_SECRET =>
					if entries.contains_key(&format!("{username}.{CLIENT_ID}")) {
						tracing::debug!(user = username, "client_secret consumed by its client_id");
					} else {
						retriever.drop_entry(MalformedEntry::MissingClientId {
							username: username.to_owned(),
						});
					},
				REFRESH_TOKEN => {
					if value.is_empty() {
						retriever.drop_entry(MalformedEntry::EmptyValue {
							username: username.to_owned(),
							field: REFRESH_TOKEN,
						});

						continue;
					}

					tracing::info!(user = username, "adding refresh token credential");

					retriever.insert(username, field, Credential::refresh_token(value.as_str()));
				},
				other => retriever.drop_entry(MalformedEntry::UnknownField {
					username: username.to_owned(),
					field: other.to_owned(),
				}),
			}
		}

		retriever
	}

	/// Entries rejected during construction, in key order.
	pub fn dropped_entries(&self) -> &[MalformedEntry] {
		&self.dropped
	}

	/// Number of users with a usable credential.
	pub fn len(&self) -> usize {
		self.credentials.len()
	}

	/// Returns `true` when no user has a usable credential.
	pub fn is_empty(&self) -> bool {
		self.credentials.is_empty()
	}

	/// Users with a usable credential, sorted.
	pub fn usernames(&self) -> Vec<&str> {
		let mut names = self.credentials.keys().map(String::as_str).collect::<Vec<_>>();

		names.sort_unstable();

		names
	}

	fn insert(&mut self, username: &str, field: &str, credential: Credential) {
		if let Some(existing) = self.credentials.get(username) {
			let existing = existing.kind();

			self.drop_entry(MalformedEntry::Conflicting {
				username: username.to_owned(),
				existing,
				field: field.to_owned(),
			});

			return;
		}

		self.credentials.insert(username.to_owned(), credential);
	}

	fn drop_entry(&mut self, entry: MalformedEntry) {
		if entry.is_incomplete() {
			tracing::error!(%entry, "dropping credential entry");
		} else {
			tracing::info!(%entry, "ignoring credential entry");
		}

		self.dropped.push(entry);
	}
}
impl CredentialRetriever for PropsRetriever {
	fn credential_for_user(&self, username: &str) -> Result<Option<Credential>, LookupError> {
		Ok(self.credentials.get(username).cloned())
	}
}
