//! Queryable graph of files, symbols and references.
//!
//! The graph is an arena: files and symbols live in vectors and are addressed
//! by [`FileId`]/[`SymbolId`] handles. Two edge lists hang off the arena:
//!
//! - `contains` (File → Symbol), one edge per declaration, deduplicated
//! - `reference` (Symbol → File), one edge per occurrence, carrying a
//!   [`SymbolReference`]
//!
//! Graphs are assembled by [`SymbolGraphBuilder`] and are immutable afterward.
//! Lookups of unknown symbols or files return empty collections.

pub mod builder;

pub use builder::SymbolGraphBuilder;

use crate::error::GraphResult;
use crate::scip::{self, Index, Metadata, Occurrence, SymbolRoles};
use crate::symbol::SymbolContext;
use crate::{FileId, Range, Symbol, SymbolId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// One indexed source file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct File {
    pub path: String,
    pub language: String,
    /// Occurrences exactly as decoded from the index
    pub occurrences: Vec<Occurrence>,
}

/// An occurrence of a symbol at a location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolReference {
    pub symbol: Symbol,
    /// 0-based, as stored in the index
    pub line: u32,
    /// 0-based, as stored in the index
    pub column: u32,
    pub roles: SymbolRoles,
    pub enclosing_range: Option<Range>,
}

impl SymbolReference {
    pub fn is_definition(&self) -> bool {
        self.roles.is_definition()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ReferenceEdge {
    file: FileId,
    reference: SymbolReference,
}

/// Node and edge counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub files: usize,
    pub symbols: usize,
    pub contains_edges: usize,
    pub reference_edges: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolGraph {
    files: Vec<File>,
    symbols: Vec<Symbol>,
    file_ids: HashMap<String, FileId>,
    symbol_ids: HashMap<String, SymbolId>,
    /// Declared symbols per file, in declaration order
    contains: Vec<Vec<SymbolId>>,
    contains_set: HashSet<(FileId, SymbolId)>,
    /// Reference edges per symbol, in insertion order
    references: Vec<Vec<ReferenceEdge>>,
    /// Documentation from the symbol's declarations
    documentation: Vec<Vec<String>>,
    metadata: Option<Metadata>,
}

impl SymbolGraph {
    /// Build the graph for a decoded index.
    pub fn build(index: &Index) -> GraphResult<Self> {
        let mut builder = SymbolGraphBuilder::new();
        builder.add_index(index)?;
        Ok(builder.finish())
    }

    /// Load the index at `path` and build its graph.
    pub fn from_path(path: impl AsRef<Path>) -> GraphResult<Self> {
        let index = scip::load_index(path)?;
        Self::build(&index)
    }

    pub fn all_files(&self) -> &[File] {
        &self.files
    }

    /// Every symbol node, unfiltered, in insertion order
    pub fn all_symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn contains_symbol(&self, symbol: &Symbol) -> bool {
        self.symbol_ids.contains_key(symbol.uri())
    }

    pub fn symbol_id(&self, symbol: &Symbol) -> Option<SymbolId> {
        self.symbol_ids.get(symbol.uri()).copied()
    }

    pub fn file(&self, path: &str) -> Option<&File> {
        self.file_ids.get(path).map(|id| &self.files[id.index()])
    }

    /// Symbols declared in `path`
    pub fn symbols_in(&self, path: &str) -> Vec<&Symbol> {
        self.file_ids
            .get(path)
            .map(|id| {
                self.contains[id.index()]
                    .iter()
                    .map(|sid| &self.symbols[sid.index()])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every recorded occurrence of `symbol`, grouped by file path.
    pub fn references(&self, symbol: &Symbol) -> BTreeMap<String, Vec<SymbolReference>> {
        let mut grouped: BTreeMap<String, Vec<SymbolReference>> = BTreeMap::new();
        for edge in self.edges_of(symbol) {
            grouped
                .entry(self.files[edge.file.index()].path.clone())
                .or_default()
                .push(edge.reference.clone());
        }
        grouped
    }

    pub fn reference_count(&self, symbol: &Symbol) -> usize {
        self.edges_of(symbol).len()
    }

    /// Symbols whose canonical URI contains `fragment`
    pub fn symbols_matching(&self, fragment: &str) -> HashSet<Symbol> {
        self.symbols
            .iter()
            .filter(|s| s.uri().contains(fragment))
            .cloned()
            .collect()
    }

    /// The first reference carrying the definition role, with its file path
    pub fn definition(&self, symbol: &Symbol) -> Option<(&str, &SymbolReference)> {
        self.edges_of(symbol)
            .iter()
            .find(|edge| edge.reference.is_definition())
            .map(|edge| {
                (
                    self.files[edge.file.index()].path.as_str(),
                    &edge.reference,
                )
            })
    }

    /// Paths of the files declaring `symbol`
    pub fn declaring_files(&self, symbol: &Symbol) -> Vec<&str> {
        let Some(id) = self.symbol_id(symbol) else {
            return Vec::new();
        };
        let mut files: Vec<FileId> = self
            .contains_set
            .iter()
            .filter(|(_, sid)| *sid == id)
            .map(|(fid, _)| *fid)
            .collect();
        files.sort();
        files
            .into_iter()
            .map(|fid| self.files[fid.index()].path.as_str())
            .collect()
    }

    pub fn documentation(&self, symbol: &Symbol) -> &[String] {
        self.symbol_id(symbol)
            .map(|id| self.documentation[id.index()].as_slice())
            .unwrap_or_default()
    }

    /// Human-readable summary of where `symbol` lives and is used.
    pub fn context(&self, symbol: &Symbol) -> String {
        SymbolContext::collect(self, symbol).format_full("")
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            files: self.files.len(),
            symbols: self.symbols.len(),
            contains_edges: self.contains_set.len(),
            reference_edges: self.references.iter().map(Vec::len).sum(),
        }
    }

    fn edges_of(&self, symbol: &Symbol) -> &[ReferenceEdge] {
        self.symbol_id(symbol)
            .map(|id| self.references[id.index()].as_slice())
            .unwrap_or_default()
    }
}
