use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a symbol node in the graph arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

/// Handle of a file node in the graph arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

/// Source span of an occurrence, 0-based as stored in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

/// What a symbol denotes, derived from the suffix of its last descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
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

impl SymbolId {
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FileId {
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Range {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

impl SymbolKind {
    /// Kinds worth a semantic embedding. Locals, parameters, type parameters,
    /// metadata and macros are too small or too noisy to rank.
    pub fn is_embeddable(self) -> bool {
        !matches!(
            self,
            SymbolKind::Local
                | SymbolKind::Parameter
                | SymbolKind::TypeParameter
                | SymbolKind::Meta
                | SymbolKind::Macro
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Namespace => "Namespace",
            SymbolKind::Type => "Type",
            SymbolKind::Term => "Term",
            SymbolKind::Method => "Method",
            SymbolKind::Parameter => "Parameter",
            SymbolKind::TypeParameter => "TypeParameter",
            SymbolKind::Meta => "Meta",
            SymbolKind::Macro => "Macro",
            SymbolKind::Local => "Local",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
