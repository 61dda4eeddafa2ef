//! Error types for the code intelligence index
//!
//! One enum per concern, built with thiserror. Parse and decode errors abort
//! the operation that raised them; provider errors are caught per symbol by
//! batch embedding and surfaced everywhere else.

use std::path::PathBuf;
use thiserror::Error;

/// A malformed symbol URI.
///
/// Renders as the message, the offending URI and a caret under the byte
/// where scanning stopped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct SymbolParseError {
    pub message: String,
    pub uri: String,
    pub index: usize,
}

impl SymbolParseError {
    pub fn new(message: impl Into<String>, uri: &str, index: usize) -> Self {
        Self {
            message: message.into(),
            uri: uri.to_string(),
            index,
        }
    }

    /// `"<message>\n<uri>\n<'_' * index>^"`
    pub fn diagnostic(&self) -> String {
        format!("{}\n{}\n{}^", self.message, self.uri, "_".repeat(self.index))
    }
}

impl std::fmt::Display for SymbolParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.diagnostic())
    }
}

/// Errors raised while decoding a binary index
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to read index '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unexpected end of input at byte {offset}: needed {needed} more byte(s)")]
    Truncated { offset: usize, needed: usize },

    #[error("Varint at byte {offset} exceeds 64 bits")]
    VarintOverflow { offset: usize },

    #[error("Unsupported wire type {wire_type} at byte {offset}")]
    InvalidWireType { offset: usize, wire_type: u8 },

    #[error("Field {field} at byte {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize, field: &'static str },

    #[error("Occurrence range at byte {offset} has {len} element(s), expected 3 or 4")]
    InvalidRange { offset: usize, len: usize },

    #[error("Occurrence range at byte {offset} has a negative position {value}")]
    NegativePosition { offset: usize, value: i32 },
}

impl DecodeError {
    pub fn status_code(&self) -> String {
        match self {
            Self::Io { .. } => "INDEX_READ_ERROR",
            Self::Truncated { .. } => "INDEX_TRUNCATED",
            Self::VarintOverflow { .. } => "INDEX_VARINT_OVERFLOW",
            Self::InvalidWireType { .. } => "INDEX_INVALID_WIRE_TYPE",
            Self::InvalidUtf8 { .. } => "INDEX_INVALID_UTF8",
            Self::InvalidRange { .. } | Self::NegativePosition { .. } => "INDEX_INVALID_RANGE",
        }
        .to_string()
    }
}

/// Errors raised while constructing a symbol graph
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid symbol in document '{path}': {source}")]
    InvalidSymbol {
        path: String,
        source: SymbolParseError,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl GraphError {
    pub fn status_code(&self) -> String {
        match self {
            Self::InvalidSymbol { .. } => "INVALID_SYMBOL".to_string(),
            Self::Decode(e) => e.status_code(),
        }
    }
}

/// Failures of the external embedding or source providers
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Embedding provider failed: {reason}")]
    Embedding { reason: String },

    #[error("Source provider failed: {reason}")]
    Source { reason: String },

    #[error("Failed to access source file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ProviderError {
    pub fn status_code(&self) -> String {
        match self {
            Self::Embedding { .. } => "EMBEDDING_PROVIDER_ERROR",
            Self::Source { .. } => "SOURCE_PROVIDER_ERROR",
            Self::Io { .. } => "SOURCE_IO_ERROR",
        }
        .to_string()
    }
}

/// Errors raised while persisting or restoring an embedding map
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding map '{path}' already exists\nSuggestion: pass overwrite to replace it")]
    AlreadyExists { path: PathBuf },

    #[error("Embedding map '{path}' does not exist\nSuggestion: build the embeddings first")]
    NotFound { path: PathBuf },

    #[error("Failed to access embedding map '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize embedding map: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Embedding map key is not a valid symbol: {0}")]
    InvalidKey(#[from] SymbolParseError),
}

impl EmbeddingError {
    pub fn status_code(&self) -> String {
        match self {
            Self::AlreadyExists { .. } => "EMBEDDINGS_EXIST",
            Self::NotFound { .. } => "EMBEDDINGS_NOT_FOUND",
            Self::Io { .. } => "EMBEDDINGS_IO_ERROR",
            Self::Serialization(_) => "EMBEDDINGS_SERIALIZATION_ERROR",
            Self::InvalidKey(_) => "EMBEDDINGS_INVALID_KEY",
        }
        .to_string()
    }
}

/// Cosine similarity is undefined for these inputs
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityError {
    #[error("Cosine similarity is undefined for a zero-magnitude vector")]
    ZeroMagnitude,

    #[error("Cosine similarity is undefined for a vector with non-finite components")]
    NonFinite,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors raised by nearest-neighbour search
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("No embeddings available for search")]
    NoEmbeddings,

    #[error("Symbol '{uri}' has no stored embedding")]
    UnknownSymbol { uri: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Query embedding is unusable: {0}")]
    Similarity(#[from] SimilarityError),
}

impl SearchError {
    pub fn status_code(&self) -> String {
        match self {
            Self::NoEmbeddings => "NO_EMBEDDINGS".to_string(),
            Self::UnknownSymbol { .. } => "SYMBOL_NOT_EMBEDDED".to_string(),
            Self::Provider(e) => e.status_code(),
            Self::Similarity(_) => "INVALID_QUERY_EMBEDDING".to_string(),
        }
    }
}

/// Errors surfaced to callers of the query mini-language
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid query '{query}': {reason}\nSuggestion: use 'type:<symbol|exact|source|replace> <args>'")]
    Invalid { query: String, reason: String },

    #[error("Symbol '{uri}' not found in the index")]
    NotFound { uri: String },

    #[error(transparent)]
    Parse(#[from] SymbolParseError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl QueryError {
    pub fn invalid(query: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            query: query.to_string(),
            reason: reason.into(),
        }
    }

    pub fn status_code(&self) -> String {
        match self {
            Self::Invalid { .. } => "INVALID_QUERY".to_string(),
            Self::NotFound { .. } => "SYMBOL_NOT_FOUND".to_string(),
            Self::Parse(_) => "PARSE_ERROR".to_string(),
            Self::Provider(e) => e.status_code(),
        }
    }
}

/// Result type alias for symbol parsing
pub type ParseResult<T> = Result<T, SymbolParseError>;

/// Result type alias for index decoding
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type alias for graph construction
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for provider calls
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Result type alias for embedding persistence
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;
