//! Contract values and type identities.
//!
//! A [`Contract`] is supplied fresh by the caller for each dispatch and is
//! never retained by the dispatch layer beyond one execution. Type identity
//! is textual: a [`TypeTag`] names the input or output model explicitly, so
//! contract identities stay stable across builds without any runtime type
//! scanning.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Suffix stripped from contract names when deriving a method name.
const CONTRACT_SUFFIX: &str = "Contract";

/// Stable textual identity of an input or output model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(Cow<'static, str>);

impl TypeTag {
    /// Output tag for raw string passthrough: the transport payload is
    /// returned verbatim without decoding.
    pub const STRING: Self = Self(Cow::Borrowed("string"));

    /// Output tag for operations without a result model; decoding yields a
    /// fixed empty sentinel.
    pub const VOID: Self = Self(Cow::Borrowed("void"));

    /// Builds a tag from an owned name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Builds a tag from a static name without allocating.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Returns the tag's textual name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }

    /// Returns `true` for the raw string passthrough tag.
    #[must_use]
    pub fn is_string(&self) -> bool {
        *self == Self::STRING
    }

    /// Returns `true` for the void sentinel tag.
    #[must_use]
    pub fn is_void(&self) -> bool {
        *self == Self::VOID
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Description of one remote operation.
///
/// Contracts are plain values: the dispatch layer reads them, mutation
/// handlers may rewrite them, and providers execute them. The optional URL
/// and token fields override the transport defaults for a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    name: String,
    input: TypeTag,
    output: TypeTag,
    path: Option<String>,
    payload: Value,
    url: Option<Url>,
    token: Option<String>,
}

impl Contract {
    /// Builds a contract with an empty payload.
    #[must_use]
    pub fn new(name: impl Into<String>, input: TypeTag, output: TypeTag) -> Self {
        Self {
            name: name.into(),
            input,
            output,
            path: None,
            payload: Value::Null,
            url: None,
            token: None,
        }
    }

    /// Attaches the request payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Sets an explicit routing path, taking precedence over the derived
    /// method name.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Overrides the transport base URL for this call only.
    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Overrides the auth token for this call only.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// The contract's concrete name, one of the three identity components.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The input model tag.
    #[must_use]
    pub fn input(&self) -> &TypeTag {
        &self.input
    }

    /// The output model tag.
    #[must_use]
    pub fn output(&self) -> &TypeTag {
        &self.output
    }

    /// The explicit routing path, when one was set.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The request payload.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The per-call URL override, when one was set.
    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// The per-call token override, when one was set.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Resolves the remote method name for this contract.
    ///
    /// An explicit path wins. Otherwise the contract name is used, with a
    /// trailing `Contract` suffix stripped so `GetProfileContract` maps to
    /// `GetProfile`.
    #[must_use]
    pub fn method_name(&self) -> String {
        if let Some(path) = self.path.as_deref()
            && !path.is_empty()
        {
            return path.to_owned();
        }
        strip_contract_suffix(&self.name).to_owned()
    }
}

fn strip_contract_suffix(name: &str) -> &str {
    if name.len() > CONTRACT_SUFFIX.len() {
        let split = name.len() - CONTRACT_SUFFIX.len();
        if let Some((head, tail)) = name.split_at_checked(split)
            && tail.eq_ignore_ascii_case(CONTRACT_SUFFIX)
        {
            return head;
        }
    }
    name
}
