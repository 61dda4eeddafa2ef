//! Symbol context aggregation for human-readable display

use crate::Symbol;
use crate::graph::{SymbolGraph, SymbolReference};
use serde::Serialize;
use std::fmt;

/// Everything the graph knows about one symbol
#[derive(Debug, Clone, Serialize)]
pub struct SymbolContext {
    /// The symbol itself
    pub symbol: Symbol,
    /// File declaring (or else defining) the symbol, if any
    pub file_path: Option<String>,
    /// Declared documentation, possibly empty
    pub documentation: Vec<String>,
    /// Every reference with the path of its file, grouped by file
    pub references: Vec<(String, SymbolReference)>,
}

impl SymbolContext {
    /// Gather the context of `symbol` from `graph`. Unknown symbols yield an
    /// empty context.
    pub fn collect(graph: &SymbolGraph, symbol: &Symbol) -> Self {
        let file_path = graph
            .declaring_files(symbol)
            .first()
            .copied()
            .or_else(|| graph.definition(symbol).map(|(path, _)| path))
            .map(str::to_string);

        let references = graph
            .references(symbol)
            .into_iter()
            .flat_map(|(path, refs)| refs.into_iter().map(move |r| (path.clone(), r)))
            .collect();

        Self {
            symbol: symbol.clone(),
            file_path,
            documentation: graph.documentation(symbol).to_vec(),
            references,
        }
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Format just the location line
    pub fn format_location(&self) -> String {
        match &self.file_path {
            Some(path) => format!("{} ({}) in {path}", self.symbol, self.symbol.kind()),
            None => format!("{} ({}) not in any indexed file", self.symbol, self.symbol.kind()),
        }
    }

    /// Format comprehensive output
    pub fn format_full(&self, indent: &str) -> String {
        let mut output = String::new();
        self.append_header(&mut output, indent);
        self.append_documentation(&mut output, indent);
        self.append_references(&mut output, indent);
        output
    }

    fn append_header(&self, output: &mut String, indent: &str) {
        output.push_str(&format!("{indent}{}\n", self.format_location()));
    }

    fn append_documentation(&self, output: &mut String, indent: &str) {
        // First two lines only
        let doc = self.documentation.join("\n");
        let preview: Vec<&str> = doc.lines().filter(|l| !l.trim().is_empty()).take(2).collect();
        if preview.is_empty() {
            return;
        }
        output.push_str(&format!("{indent}Doc: {}", preview.join(" ")));
        if doc.lines().filter(|l| !l.trim().is_empty()).count() > 2 {
            output.push_str("...");
        }
        output.push('\n');
    }

    fn append_references(&self, output: &mut String, indent: &str) {
        output.push_str(&format!(
            "{indent}References: {}\n",
            self.reference_count()
        ));
        for (path, reference) in &self.references {
            // Stored 0-based, shown 1-based
            output.push_str(&format!(
                "{indent}  {path}:{}:{} {}\n",
                reference.line + 1,
                reference.column + 1,
                reference.roles
            ));
        }
    }
}

impl fmt::Display for SymbolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_location())
    }
}
