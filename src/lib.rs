/// The main library module for symdex
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod query;
pub mod scip;
pub mod semantic;
pub mod source;
pub mod symbol;
pub mod types;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{
    DecodeError, DecodeResult, EmbeddingError, EmbeddingResult, GraphError, GraphResult,
    ParseResult, ProviderError, ProviderResult, QueryError, SearchError, SimilarityError,
    SymbolParseError,
};
pub use graph::{File, GraphStats, SymbolGraph, SymbolGraphBuilder, SymbolReference};
pub use query::{Query, QueryDispatcher, QueryResult, SourceLookup};
pub use scip::{Index, SymbolRoles, load_index};
pub use semantic::{
    EmbeddingMap, EmbeddingProvider, FastEmbedProvider, SimilaritySearch, SymbolEmbedding,
    UpdateReport, cosine_similarity,
};
pub use source::{SourceProvider, SourceTree, WorkspaceSources};
pub use symbol::{Descriptor, Package, Suffix, Symbol, SymbolContext, parse_symbol, unparse};
pub use types::{FileId, Range, SymbolId, SymbolKind};
