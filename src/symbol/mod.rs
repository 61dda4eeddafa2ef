//! Symbol identities parsed from canonical symbol URIs.
//!
//! A [`Symbol`] is a value type: equality, ordering and hashing are defined
//! solely over its canonical URI, which is computed once at construction.

pub mod context;
mod parser;

pub use context::SymbolContext;
pub use parser::{is_simple_identifier, parse_symbol, unparse};

use crate::SymbolKind;
use crate::error::ParseResult;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Scheme reserved for document-local symbols
pub const LOCAL_SCHEME: &str = "local";

/// Kind marker attached to one descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suffix {
    Namespace,
    Type,
    Term,
    Method,
    Parameter,
    TypeParameter,
    Meta,
    Macro,
    Local,
}

impl Suffix {
    pub fn kind(self) -> SymbolKind {
        match self {
            Suffix::Namespace => SymbolKind::Namespace,
            Suffix::Type => SymbolKind::Type,
            Suffix::Term => SymbolKind::Term,
            Suffix::Method => SymbolKind::Method,
            Suffix::Parameter => SymbolKind::Parameter,
            Suffix::TypeParameter => SymbolKind::TypeParameter,
            Suffix::Meta => SymbolKind::Meta,
            Suffix::Macro => SymbolKind::Macro,
            Suffix::Local => SymbolKind::Local,
        }
    }
}

/// One path segment of a symbol (module, class, method, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descriptor {
    pub name: String,
    pub suffix: Suffix,
    /// Overload disambiguator; always `Some` for methods, possibly empty.
    pub disambiguator: Option<String>,
}

impl Descriptor {
    pub fn new(name: impl Into<String>, suffix: Suffix) -> Self {
        let disambiguator = (suffix == Suffix::Method).then(String::new);
        Self {
            name: name.into(),
            suffix,
            disambiguator,
        }
    }

    pub fn method(name: impl Into<String>, disambiguator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suffix: Suffix::Method,
            disambiguator: Some(disambiguator.into()),
        }
    }
}

/// Package coordinates. Empty fields mean "absent".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Package {
    pub manager: String,
    pub name: String,
    pub version: String,
}

impl Package {
    pub fn new(
        manager: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            manager: manager.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.manager.is_empty() && self.name.is_empty() && self.version.is_empty()
    }
}

/// A canonical identifier for a declaration in the indexed codebase
#[derive(Debug, Clone)]
pub struct Symbol {
    uri: String,
    scheme: String,
    package: Package,
    descriptors: Vec<Descriptor>,
}

impl Symbol {
    /// Build a symbol from its parts; the canonical URI is derived here.
    pub fn new(scheme: impl Into<String>, package: Package, descriptors: Vec<Descriptor>) -> Self {
        let mut symbol = Self {
            uri: String::new(),
            scheme: scheme.into(),
            package,
            descriptors,
        };
        symbol.uri = unparse(&symbol);
        symbol
    }

    /// A document-local symbol such as `local 42`
    pub fn local(id: impl Into<String>) -> Self {
        Self::new(
            LOCAL_SCHEME,
            Package::default(),
            vec![Descriptor::new(id, Suffix::Local)],
        )
    }

    pub fn parse(uri: &str) -> ParseResult<Self> {
        parse_symbol(uri)
    }

    /// Used by the parser, which has already validated that `uri` is canonical.
    pub(crate) fn from_parts(
        uri: String,
        scheme: String,
        package: Package,
        descriptors: Vec<Descriptor>,
    ) -> Self {
        Self {
            uri,
            scheme,
            package,
            descriptors,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn is_local(&self) -> bool {
        self.scheme == LOCAL_SCHEME
    }

    /// Kind of the last descriptor. A symbol with no descriptors names a
    /// package root and is reported as a namespace.
    pub fn kind(&self) -> SymbolKind {
        if self.is_local() {
            return SymbolKind::Local;
        }
        self.descriptors
            .last()
            .map(|d| d.suffix.kind())
            .unwrap_or(SymbolKind::Namespace)
    }

    /// Name of the last descriptor
    pub fn name(&self) -> &str {
        self.descriptors
            .last()
            .map(|d| d.name.as_str())
            .unwrap_or_default()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.uri.cmp(&other.uri)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl FromStr for Symbol {
    type Err = crate::error::SymbolParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_symbol(s)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.uri)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let uri = String::deserialize(deserializer)?;
        parse_symbol(&uri).map_err(serde::de::Error::custom)
    }
}
