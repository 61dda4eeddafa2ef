//! Source-text providers.
//!
//! [`SourceProvider`] maps a symbol to the literal text backing it.
//! [`SourceTree`] adds file-level access plus an in-memory rename that can be
//! flushed back to disk. [`WorkspaceSources`] implements both over the files
//! of an indexed workspace.

use crate::error::{ProviderError, ProviderResult};
use crate::graph::SymbolGraph;
use crate::{Range, Symbol};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Resolves the source text of a symbol.
///
/// `Ok(None)` means the symbol has no resolvable text; errors are reserved
/// for provider failures.
pub trait SourceProvider: Sync {
    fn source_of(&self, symbol: &Symbol) -> ProviderResult<Option<String>>;
}

/// A set of source files that can be searched and rewritten.
pub trait SourceTree: SourceProvider {
    /// Paths of all resolved files, sorted
    fn files(&self) -> Vec<String>;

    /// Text lines of `path`, empty for unknown files
    fn lines(&self, path: &str) -> Vec<String>;

    /// Rename whole-identifier occurrences of `find` to `replace` in memory,
    /// returning the number of occurrences changed.
    fn rename_identifier(&mut self, find: &str, replace: &str) -> ProviderResult<usize>;

    /// Write modified files back to storage, returning how many were written.
    fn flush(&mut self) -> ProviderResult<usize>;
}

#[derive(Debug, Clone)]
struct SourceFile {
    text: String,
    dirty: bool,
}

/// Where a symbol is defined
#[derive(Debug, Clone, PartialEq)]
struct Definition {
    path: String,
    line: u32,
    enclosing_range: Option<Range>,
}

/// Source files of an indexed workspace, held in memory.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSources {
    root: PathBuf,
    files: BTreeMap<String, SourceFile>,
    definitions: HashMap<String, Definition>,
}

impl WorkspaceSources {
    /// An empty tree rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Read every file of `graph` from `root` and record symbol definitions.
    /// Files missing on disk are skipped with a warning.
    pub fn open(root: impl AsRef<Path>, graph: &SymbolGraph) -> Self {
        let mut sources = Self::new(root.as_ref());
        for file in graph.all_files() {
            let full = sources.root.join(&file.path);
            match std::fs::read_to_string(&full) {
                Ok(text) => sources.insert(file.path.clone(), text),
                Err(e) => {
                    tracing::warn!("[source] skipping {}: {e}", full.display());
                }
            }
        }
        sources.index_definitions(graph);

        tracing::debug!(
            "[source] loaded {} file(s), {} definition(s)",
            sources.files.len(),
            sources.definitions.len()
        );
        sources
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Add or replace an in-memory file
    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.files.insert(
            path.into(),
            SourceFile {
                text: text.into(),
                dirty: false,
            },
        );
    }

    pub fn text(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(|f| f.text.as_str())
    }

    /// Record the definition site of every symbol in `graph`.
    pub fn index_definitions(&mut self, graph: &SymbolGraph) {
        for symbol in graph.all_symbols() {
            if let Some((path, reference)) = graph.definition(symbol) {
                self.definitions.insert(
                    symbol.uri().to_string(),
                    Definition {
                        path: path.to_string(),
                        line: reference.line,
                        enclosing_range: reference.enclosing_range,
                    },
                );
            }
        }
    }
}

impl SourceProvider for WorkspaceSources {
    fn source_of(&self, symbol: &Symbol) -> ProviderResult<Option<String>> {
        let Some(definition) = self.definitions.get(symbol.uri()) else {
            return Ok(None);
        };
        let Some(file) = self.files.get(&definition.path) else {
            return Ok(None);
        };

        let lines: Vec<&str> = file.text.lines().collect();
        let text = match definition.enclosing_range {
            Some(range) => slice_range(&lines, range),
            None => lines
                .get(definition.line as usize)
                .map(|line| line.trim_end().to_string()),
        };
        Ok(text.filter(|t| !t.trim().is_empty()))
    }
}

impl SourceTree for WorkspaceSources {
    fn files(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    fn lines(&self, path: &str) -> Vec<String> {
        self.files
            .get(path)
            .map(|f| f.text.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn rename_identifier(&mut self, find: &str, replace: &str) -> ProviderResult<usize> {
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(find))).map_err(|e| {
            ProviderError::Source {
                reason: format!("Cannot rename '{find}': {e}"),
            }
        })?;

        let mut total = 0;
        for (path, file) in &mut self.files {
            let count = pattern.find_iter(&file.text).count();
            if count == 0 {
                continue;
            }
            file.text = pattern
                .replace_all(&file.text, regex::NoExpand(replace))
                .into_owned();
            file.dirty = true;
            total += count;
            tracing::debug!("[source] renamed {count} occurrence(s) in {path}");
        }
        Ok(total)
    }

    fn flush(&mut self) -> ProviderResult<usize> {
        let mut written = 0;
        for (path, file) in self.files.iter_mut().filter(|(_, f)| f.dirty) {
            let full = self.root.join(path);
            std::fs::write(&full, &file.text).map_err(|source| ProviderError::Io {
                path: full.clone(),
                source,
            })?;
            file.dirty = false;
            written += 1;
        }
        if written > 0 {
            tracing::info!("[source] wrote {written} file(s)");
        }
        Ok(written)
    }
}

/// Text covered by `range`. Columns count characters; out-of-bounds
/// positions are clamped to the file. An inverted range covers nothing.
fn slice_range(lines: &[&str], range: Range) -> Option<String> {
    let start = range.start_line as usize;
    if start >= lines.len() || range.end_line < range.start_line {
        return None;
    }
    let end = (range.end_line as usize).min(lines.len() - 1);

    let mut out = Vec::with_capacity(end - start + 1);
    for (row, line) in lines.iter().enumerate().take(end + 1).skip(start) {
        let chars: Vec<char> = line.chars().collect();
        let from = if row == start {
            (range.start_column as usize).min(chars.len())
        } else {
            0
        };
        let to = if row == range.end_line as usize {
            (range.end_column as usize).clamp(from, chars.len())
        } else {
            chars.len()
        };
        out.push(chars[from..to].iter().collect::<String>());
    }
    Some(out.join("\n"))
}
