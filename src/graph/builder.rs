//! Assembles a [`SymbolGraph`] from decoded index documents.

use super::{File, ReferenceEdge, SymbolGraph, SymbolReference};
use crate::error::{GraphError, GraphResult};
use crate::scip::{Document, Index, SymbolInformation};
use crate::{FileId, Symbol, SymbolId};

/// Append-only construction of a [`SymbolGraph`].
///
/// Symbol nodes are keyed by canonical URI, so repeated declarations of the
/// same symbol (across or within documents) map onto one node.
#[derive(Debug, Default)]
pub struct SymbolGraphBuilder {
    graph: SymbolGraph,
}

impl SymbolGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_index(&mut self, index: &Index) -> GraphResult<()> {
        if index.metadata.is_some() {
            self.graph.metadata = index.metadata.clone();
        }
        for document in &index.documents {
            self.add_document(document)?;
        }
        for info in &index.external_symbols {
            self.add_external(info)?;
        }

        tracing::info!(
            "[graph] built {} file(s), {} symbol(s), {} reference(s)",
            self.graph.files.len(),
            self.graph.symbols.len(),
            self.graph.references.iter().map(Vec::len).sum::<usize>()
        );
        Ok(())
    }

    /// Add one document: its file node, declared symbols and occurrences.
    pub fn add_document(&mut self, document: &Document) -> GraphResult<FileId> {
        let path = document.relative_path.as_str();
        let file_id = self.file_node(document);

        for info in &document.symbols {
            let symbol_id = self.symbol_node(&info.symbol, path)?;
            self.record_documentation(symbol_id, info);
            if self.graph.contains_set.insert((file_id, symbol_id)) {
                self.graph.contains[file_id.index()].push(symbol_id);
            }
        }

        for occurrence in &document.occurrences {
            if occurrence.symbol.is_empty() {
                continue;
            }
            let symbol_id = self.symbol_node(&occurrence.symbol, path)?;
            let reference = SymbolReference {
                symbol: self.graph.symbols[symbol_id.index()].clone(),
                line: occurrence.range.start_line,
                column: occurrence.range.start_column,
                roles: occurrence.roles,
                enclosing_range: occurrence.enclosing_range,
            };
            self.graph.references[symbol_id.index()].push(ReferenceEdge {
                file: file_id,
                reference,
            });
        }

        tracing::debug!(
            "[graph] {path}: {} declaration(s), {} occurrence(s)",
            document.symbols.len(),
            document.occurrences.len()
        );
        Ok(file_id)
    }

    /// Add a symbol defined outside the indexed documents. It gets a node
    /// but no `contains` edge.
    pub fn add_external(&mut self, info: &SymbolInformation) -> GraphResult<SymbolId> {
        let symbol_id = self.symbol_node(&info.symbol, "<external>")?;
        self.record_documentation(symbol_id, info);
        Ok(symbol_id)
    }

    pub fn finish(self) -> SymbolGraph {
        self.graph
    }

    fn file_node(&mut self, document: &Document) -> FileId {
        let graph = &mut self.graph;
        if let Some(&id) = graph.file_ids.get(&document.relative_path) {
            // Same path indexed twice: keep one node, append its occurrences
            graph.files[id.index()]
                .occurrences
                .extend(document.occurrences.iter().cloned());
            return id;
        }

        let id = FileId::from_index(graph.files.len());
        graph.files.push(File {
            path: document.relative_path.clone(),
            language: document.language.clone(),
            occurrences: document.occurrences.clone(),
        });
        graph.file_ids.insert(document.relative_path.clone(), id);
        graph.contains.push(Vec::new());
        id
    }

    fn symbol_node(&mut self, uri: &str, path: &str) -> GraphResult<SymbolId> {
        if let Some(&id) = self.graph.symbol_ids.get(uri) {
            return Ok(id);
        }

        let symbol = Symbol::parse(uri).map_err(|source| GraphError::InvalidSymbol {
            path: path.to_string(),
            source,
        })?;

        let graph = &mut self.graph;
        let id = SymbolId::from_index(graph.symbols.len());
        graph.symbol_ids.insert(symbol.uri().to_string(), id);
        graph.symbols.push(symbol);
        graph.references.push(Vec::new());
        graph.documentation.push(Vec::new());
        Ok(id)
    }

    fn record_documentation(&mut self, id: SymbolId, info: &SymbolInformation) {
        let docs = &mut self.graph.documentation[id.index()];
        if docs.is_empty() && !info.documentation.is_empty() {
            docs.clone_from(&info.documentation);
        }
    }
}
