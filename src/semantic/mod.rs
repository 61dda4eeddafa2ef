//! Semantic search over symbol source text
//!
//! Symbols are embedded through an [`EmbeddingProvider`] into an
//! [`EmbeddingMap`], which [`SimilaritySearch`] ranks by cosine similarity.

mod map;
mod provider;
mod search;

pub use map::{EmbeddingMap, SymbolEmbedding, UpdateReport};
pub use provider::{EmbeddingProvider, FastEmbedProvider, models_dir};
pub use search::{SimilaritySearch, cosine_similarity};
