//! Name → factory registry that resolves the configured credential retriever.

// std
use std::borrow::Borrow;
// self
use crate::{
	_prelude::*,
	error::BoxError,
	props::{Props, keys},
	retriever::{CredentialRetriever, PropsRetriever},
};

const NAME_MAX_LEN: usize = 128;

/// Factory that builds a retriever from the active configuration.
pub type RetrieverFactory =
	Arc<dyn Fn(&Props) -> Result<Arc<dyn CredentialRetriever>, BoxError> + Send + Sync>;

/// Failure to resolve or build the configured retriever. Always fatal for the provider.
#[derive(Debug, ThisError)]
pub enum PluginError {
	/// The configuration does not name a retriever.
	#[error("Configuration key `{key}` must name a credential retriever.")]
	MissingIdentifier {
		/// Key that was expected to hold the identifier.
		key: &'static str,
	},
	/// The configured identifier is not a valid retriever name.
	#[error("Credential retriever identifier is invalid.")]
	InvalidIdentifier(#[from] IdentifierError),
	/// No factory is registered under the identifier.
	#[error("Credential retriever `{name}` is not registered; known retrievers: [{}].", .known.join(", "))]
	Unknown {
		/// Configured identifier.
		name: String,
		/// Identifiers the registry knows about.
		known: Vec<String>,
	},
	/// A factory is already registered under the identifier.
	#[error("Credential retriever `{name}` is already registered.")]
	Duplicate {
		/// Conflicting identifier.
		name: String,
	},
	/// The factory ran and failed.
	#[error("Credential retriever `{name}` failed to initialize.")]
	Construction {
		/// Identifier whose factory failed.
		name: String,
		/// Error returned by the factory.
		#[source]
		source: BoxError,
	},
}

/// Error returned when a retriever name fails validation.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The name is empty.
	#[error("Retriever name cannot be empty.")]
	Empty,
	/// The name contains whitespace characters.
	#[error("Retriever name `{name}` contains whitespace.")]
	ContainsWhitespace {
		/// Rejected name.
		name: String,
	},
	/// The name exceeded the allowed length.
	#[error("Retriever name exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted length in bytes.
		max: usize,
	},
}

/// Validated retriever identifier.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RetrieverName(String);
impl RetrieverName {
	/// Creates a name after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		if view.is_empty() {
			return Err(IdentifierError::Empty);
		}
		if view.chars().any(char::is_whitespace) {
			return Err(IdentifierError::ContainsWhitespace { name: view.to_owned() });
		}
		if view.len() > NAME_MAX_LEN {
			return Err(IdentifierError::TooLong { max: NAME_MAX_LEN });
		}

		Ok(Self(view.to_owned()))
	}

	/// Returns the name as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for RetrieverName {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for RetrieverName {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "RetrieverName({})", self.0)
	}
}
impl Display for RetrieverName {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for RetrieverName {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

/// Registry of retriever factories, populated at process start.
///
/// [`RetrieverRegistry::default`] contains the built-in [`PropsRetriever`] under
/// [`PropsRetriever::NAME`]; [`RetrieverRegistry::empty`] starts blank.
#[derive(Clone)]
pub struct RetrieverRegistry {
	factories: BTreeMap<RetrieverName, RetrieverFactory>,
}
impl RetrieverRegistry {
	/// Creates a registry without any factories.
	pub fn empty() -> Self {
		Self { factories: BTreeMap::new() }
	}

	/// Registers `factory` under `name`.
	///
	/// The factory may return any retriever type and any error type; both are boxed.
	pub fn register<R, E, F>(&mut self, name: &str, factory: F) -> Result<&mut Self, PluginError>
	where
		R: 'static + CredentialRetriever,
		E: Into<BoxError>,
		F: 'static + Send + Sync + Fn(&Props) -> Result<R, E>,
	{
		let name = RetrieverName::new(name)?;

		if self.factories.contains_key(&name) {
			return Err(PluginError::Duplicate { name: name.0 });
		}

		let factory: RetrieverFactory =
			Arc::new(move |props: &Props| -> Result<Arc<dyn CredentialRetriever>, BoxError> {
				factory(props)
					.map(|retriever| Arc::new(retriever) as Arc<dyn CredentialRetriever>)
					.map_err(Into::into)
			});

		self.factories.insert(name, factory);

		Ok(self)
	}

	/// Builder-style variant of [`register`](Self::register).
	pub fn with<R, E, F>(mut self, name: &str, factory: F) -> Result<Self, PluginError>
	where
		R: 'static + CredentialRetriever,
		E: Into<BoxError>,
		F: 'static + Send + Sync + Fn(&Props) -> Result<R, E>,
	{
		self.register(name, factory)?;

		Ok(self)
	}

	/// Returns `true` when a factory is registered under `name`.
	pub fn contains(&self, name: &str) -> bool {
		self.factories.contains_key(name)
	}

	/// Registered identifiers, sorted.
	pub fn names(&self) -> Vec<String> {
		self.factories.keys().map(ToString::to_string).collect()
	}

	/// Resolves [`keys::CREDENTIAL_RETRIEVER`] and builds the retriever it names.
	pub fn load(&self, props: &Props) -> Result<Arc<dyn CredentialRetriever>, PluginError> {
		let raw = props
			.get(keys::CREDENTIAL_RETRIEVER)
			.ok_or(PluginError::MissingIdentifier { key: keys::CREDENTIAL_RETRIEVER })?;
		let name = RetrieverName::new(raw)?;

		tracing::debug!(retriever = %name, "loading credential retriever");

		let factory = self
			.factories
			.get(name.as_str())
			.ok_or_else(|| PluginError::Unknown { name: name.to_string(), known: self.names() })?;

		factory(props).map_err(|source| PluginError::Construction { name: name.0, source })
	}
}
impl Default for RetrieverRegistry {
	fn default() -> Self {
		let mut factories = BTreeMap::new();
		let builtin: RetrieverFactory =
			Arc::new(|props: &Props| -> Result<Arc<dyn CredentialRetriever>, BoxError> {
				Ok(Arc::new(PropsRetriever::new(props)))
			});

		factories.insert(RetrieverName(PropsRetriever::NAME.to_owned()), builtin);

		Self { factories }
	}
}
impl Debug for RetrieverRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RetrieverRegistry").field("names", &self.names()).finish()
	}
}
