//! Symbol → embedding map with staleness-aware updates and JSON persistence.
//!
//! Construction runs in chunks of `batch_size` symbols. Inside a chunk the
//! source lookups and provider calls may run on a rayon pool, but every
//! insertion happens on the calling thread, so the map itself needs no
//! synchronization. With checkpointing enabled the map is written after each
//! chunk so an interrupted build keeps its progress.

use super::provider::EmbeddingProvider;
use crate::Symbol;
use crate::config::EmbeddingConfig;
use crate::error::{EmbeddingError, EmbeddingResult};
use crate::source::SourceProvider;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Cached embedding plus the text it was computed from
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEmbedding {
    pub symbol: Symbol,
    pub vector: Vec<f32>,
    pub source_code: String,
}

/// On-disk shape of one entry, keyed by canonical URI
#[derive(Serialize)]
struct StoredEmbeddingRef<'a> {
    vector: &'a [f32],
    source_code: &'a str,
}

#[derive(Deserialize)]
struct StoredEmbedding {
    vector: Vec<f32>,
    source_code: String,
}

/// Outcome counts of a build or update pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    /// Provider called and entry written
    pub computed: usize,
    /// Stored source matched, no provider call
    pub unchanged: usize,
    /// Excluded kind, denylisted or without resolvable source
    pub skipped: usize,
    /// Provider or source failure
    pub failed: usize,
}

impl UpdateReport {
    pub fn total(&self) -> usize {
        self.computed + self.unchanged + self.skipped + self.failed
    }
}

enum Outcome {
    Computed(SymbolEmbedding),
    Unchanged,
    Unresolved,
    Failed,
}

/// Embeddings ordered by canonical URI
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingMap {
    entries: BTreeMap<Symbol, SymbolEmbedding>,
}

impl EmbeddingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed every eligible symbol in `symbols`.
    ///
    /// Symbols of non-embeddable kinds, denylisted URIs and symbols without
    /// source are skipped. Per-symbol failures are logged and omitted.
    pub fn build<'a>(
        symbols: impl IntoIterator<Item = &'a Symbol>,
        embedder: &dyn EmbeddingProvider,
        sources: &dyn SourceProvider,
        config: &EmbeddingConfig,
    ) -> EmbeddingResult<Self> {
        let mut map = Self::new();
        let report = map.update_embeddings(symbols, embedder, sources, config)?;
        tracing::info!(
            "[embed] built {} embedding(s) with {}: {} skipped, {} failed",
            report.computed,
            embedder.name(),
            report.skipped,
            report.failed
        );
        Ok(map)
    }

    /// Re-resolve the source of `symbols` and recompute only the entries
    /// that are missing or whose source text changed.
    pub fn update_embeddings<'a>(
        &mut self,
        symbols: impl IntoIterator<Item = &'a Symbol>,
        embedder: &dyn EmbeddingProvider,
        sources: &dyn SourceProvider,
        config: &EmbeddingConfig,
    ) -> EmbeddingResult<UpdateReport> {
        let mut report = UpdateReport::default();
        let mut eligible = Vec::new();
        for symbol in symbols {
            if symbol.kind().is_embeddable() && !config.is_denied(symbol.uri()) {
                eligible.push(symbol);
            } else {
                report.skipped += 1;
            }
        }

        let pool = if config.parallel {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(config.parallel_threads)
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    tracing::warn!("[embed] thread pool unavailable, embedding sequentially: {e}");
                    None
                }
            }
        } else {
            None
        };

        let batch_size = config.batch_size.max(1);
        let chunks = eligible.len().div_ceil(batch_size);
        for (n, chunk) in eligible.chunks(batch_size).enumerate() {
            let outcomes: Vec<Outcome> = match &pool {
                Some(pool) => pool.install(|| {
                    chunk
                        .par_iter()
                        .map(|symbol| self.refresh(symbol, embedder, sources))
                        .collect()
                }),
                None => chunk
                    .iter()
                    .map(|symbol| self.refresh(symbol, embedder, sources))
                    .collect(),
            };

            let mut chunk_changed = false;
            for outcome in outcomes {
                match outcome {
                    Outcome::Computed(embedding) => {
                        self.entries.insert(embedding.symbol.clone(), embedding);
                        report.computed += 1;
                        chunk_changed = true;
                    }
                    Outcome::Unchanged => report.unchanged += 1,
                    Outcome::Unresolved => report.skipped += 1,
                    Outcome::Failed => report.failed += 1,
                }
            }

            tracing::debug!("[embed] chunk {}/{chunks} done", n + 1);
            if config.checkpoint && chunk_changed {
                self.save(&config.path, true)?;
            }
        }

        Ok(report)
    }

    /// Decide what to do with one symbol. Never mutates the map.
    fn refresh(
        &self,
        symbol: &Symbol,
        embedder: &dyn EmbeddingProvider,
        sources: &dyn SourceProvider,
    ) -> Outcome {
        let source_code = match sources.source_of(symbol) {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::debug!("[embed] no source for {symbol}");
                return Outcome::Unresolved;
            }
            Err(e) => {
                tracing::warn!("[embed] source lookup failed for {symbol}: {e}");
                return Outcome::Failed;
            }
        };

        if self
            .entries
            .get(symbol)
            .is_some_and(|existing| existing.source_code == source_code)
        {
            return Outcome::Unchanged;
        }

        match embedder.embed(&source_code) {
            Ok(vector) => Outcome::Computed(SymbolEmbedding {
                symbol: symbol.clone(),
                vector,
                source_code,
            }),
            Err(e) => {
                tracing::warn!("[embed] skipping {symbol}: {e}");
                Outcome::Failed
            }
        }
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&SymbolEmbedding> {
        self.entries.get(symbol)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn insert(&mut self, embedding: SymbolEmbedding) -> Option<SymbolEmbedding> {
        self.entries.insert(embedding.symbol.clone(), embedding)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in canonical-URI order
    pub fn iter(&self) -> impl Iterator<Item = &SymbolEmbedding> {
        self.entries.values()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.keys()
    }

    /// Write the map as JSON. Fails if `path` exists and `overwrite` is not
    /// set.
    pub fn save(&self, path: impl AsRef<Path>, overwrite: bool) -> EmbeddingResult<()> {
        let path = path.as_ref();
        if path.exists() && !overwrite {
            return Err(EmbeddingError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        let io_error = |source| EmbeddingError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let stored: BTreeMap<&str, StoredEmbeddingRef<'_>> = self
            .entries
            .values()
            .map(|e| {
                (
                    e.symbol.uri(),
                    StoredEmbeddingRef {
                        vector: &e.vector,
                        source_code: &e.source_code,
                    },
                )
            })
            .collect();

        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &stored)?;
        writer.flush().map_err(io_error)?;

        tracing::debug!("[embed] saved {} embedding(s) to {}", self.len(), path.display());
        Ok(())
    }

    /// Read a map written by [`EmbeddingMap::save`]. Keys are re-parsed as
    /// symbols.
    pub fn load(path: impl AsRef<Path>) -> EmbeddingResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EmbeddingError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path).map_err(|source| EmbeddingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stored: BTreeMap<String, StoredEmbedding> =
            serde_json::from_reader(BufReader::new(file))?;

        let mut entries = BTreeMap::new();
        for (uri, entry) in stored {
            let symbol = Symbol::parse(&uri)?;
            entries.insert(
                symbol.clone(),
                SymbolEmbedding {
                    symbol,
                    vector: entry.vector,
                    source_code: entry.source_code,
                },
            );
        }

        tracing::debug!("[embed] loaded {} embedding(s) from {}", entries.len(), path.display());
        Ok(Self { entries })
    }
}
