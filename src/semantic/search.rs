//! Cosine similarity over an [`EmbeddingMap`].

use super::map::EmbeddingMap;
use super::provider::EmbeddingProvider;
use crate::Symbol;
use crate::error::{SearchError, SimilarityError};

/// Cosine similarity of two vectors, clamped to `[-1, 1]`.
///
/// # Errors
/// Undefined for vectors of different length, with zero magnitude, or
/// holding non-finite components.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let magnitude_a = magnitude(a)?;
    let magnitude_b = magnitude(b)?;
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();

    let similarity = dot_product / (magnitude_a * magnitude_b);
    if !similarity.is_finite() {
        return Err(SimilarityError::NonFinite);
    }
    // Rounding can push |cos| a hair past 1
    Ok(similarity.clamp(-1.0, 1.0))
}

/// Euclidean norm, or why the vector cannot take part in a cosine.
fn magnitude(vector: &[f32]) -> Result<f32, SimilarityError> {
    let magnitude = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if !magnitude.is_finite() {
        Err(SimilarityError::NonFinite)
    } else if magnitude == 0.0 {
        Err(SimilarityError::ZeroMagnitude)
    } else {
        Ok(magnitude)
    }
}

/// Nearest-neighbour queries against one embedding map
pub struct SimilaritySearch<'a> {
    map: &'a EmbeddingMap,
    embedder: &'a dyn EmbeddingProvider,
}

impl<'a> SimilaritySearch<'a> {
    pub fn new(map: &'a EmbeddingMap, embedder: &'a dyn EmbeddingProvider) -> Self {
        Self { map, embedder }
    }

    /// Pairwise similarities in map enumeration order.
    ///
    /// Only the lower triangle is computed; the upper one is mirrored.
    /// Pairs involving a zero or non-finite vector (or differing
    /// dimensions) are `NaN`.
    pub fn similarity_matrix(&self) -> Vec<Vec<f32>> {
        let vectors: Vec<&[f32]> = self.map.iter().map(|e| e.vector.as_slice()).collect();
        let n = vectors.len();
        let mut matrix = vec![vec![f32::NAN; n]; n];

        for i in 0..n {
            if magnitude(vectors[i]).is_ok() {
                matrix[i][i] = 1.0;
            }
            for j in 0..i {
                let similarity = cosine_similarity(vectors[i], vectors[j]).unwrap_or(f32::NAN);
                matrix[i][j] = similarity;
                matrix[j][i] = similarity;
            }
        }
        matrix
    }

    /// The `k` symbols most similar to `query`, best first.
    pub fn nearest(&self, query: &str, k: usize) -> Result<Vec<Symbol>, SearchError> {
        Ok(self
            .nearest_scored(query, k)?
            .into_iter()
            .map(|(symbol, _)| symbol)
            .collect())
    }

    /// Like [`SimilaritySearch::nearest`], with scores. Ties keep map
    /// enumeration order.
    pub fn nearest_scored(&self, query: &str, k: usize) -> Result<Vec<(Symbol, f32)>, SearchError> {
        if self.map.is_empty() {
            return Err(SearchError::NoEmbeddings);
        }

        let query_vector = self.embedder.embed(query)?;
        magnitude(&query_vector)?;
        tracing::debug!("[search] ranking {} embedding(s) for {query:?}", self.map.len());

        Ok(self.rank(&query_vector, k, None))
    }

    /// The `k` symbols closest to the stored embedding of `symbol`,
    /// excluding `symbol` itself. No provider call.
    pub fn most_similar_to(&self, symbol: &Symbol, k: usize) -> Result<Vec<(Symbol, f32)>, SearchError> {
        let embedding = self.map.get(symbol).ok_or_else(|| SearchError::UnknownSymbol {
            uri: symbol.uri().to_string(),
        })?;
        magnitude(&embedding.vector)?;

        Ok(self.rank(&embedding.vector, k, Some(symbol)))
    }

    fn rank(&self, target: &[f32], k: usize, exclude: Option<&Symbol>) -> Vec<(Symbol, f32)> {
        let mut scored: Vec<(Symbol, f32)> = self
            .map
            .iter()
            .filter(|e| exclude != Some(&e.symbol))
            .filter_map(|e| match cosine_similarity(target, &e.vector) {
                Ok(score) => Some((e.symbol.clone(), score)),
                Err(SimilarityError::ZeroMagnitude) => None,
                Err(SimilarityError::NonFinite) => {
                    tracing::debug!("[search] skipping {}: non-finite embedding", e.symbol);
                    None
                }
                Err(err) => {
                    tracing::warn!("[search] skipping {}: {err}", e.symbol);
                    None
                }
            })
            .collect();

        // Stable: equal scores stay in enumeration order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }
}
