//! The `type:<kind> <argument>` query language.
//!
//! | query                                   | result                          |
//! |-----------------------------------------|---------------------------------|
//! | `type:symbol <uri>`                     | references grouped by file      |
//! | `type:exact <pattern>`                  | 1-based matching lines per file |
//! | `type:source <uri>`                     | source text of the symbol       |
//! | `type:replace <find> <replace> <flush>` | number of identifiers renamed   |
//!
//! `<flush>` is `True` or `False` and controls whether renamed files are
//! written back.

use crate::error::QueryError;
use crate::graph::{SymbolGraph, SymbolReference};
use crate::source::SourceTree;
use crate::Symbol;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const PREFIX: &str = "type:";

/// A parsed query
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Symbol(Symbol),
    Exact(String),
    Source(Symbol),
    Replace {
        find: String,
        replace: String,
        flush: bool,
    },
}

impl Query {
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        // Only the separator after the kind is dropped; patterns and URIs
        // may carry significant spaces.
        let Some((head, argument)) = input.trim_start().split_once(' ') else {
            return Err(QueryError::invalid(input, "expected 'type:<kind> <argument>'"));
        };
        let Some(kind) = head.strip_prefix(PREFIX) else {
            return Err(QueryError::invalid(input, "missing 'type:' prefix"));
        };
        if argument.trim().is_empty() {
            return Err(QueryError::invalid(input, "missing argument"));
        }

        match kind {
            "symbol" => Ok(Query::Symbol(Symbol::parse(argument)?)),
            "exact" => Ok(Query::Exact(argument.to_string())),
            "source" => Ok(Query::Source(Symbol::parse(argument)?)),
            "replace" => {
                let args: Vec<&str> = argument.split_whitespace().collect();
                let [find, replace, flush] = args[..] else {
                    return Err(QueryError::invalid(
                        input,
                        "replace takes '<find> <replace> <True|False>'",
                    ));
                };
                let flush = match flush {
                    "True" | "true" => true,
                    "False" | "false" => false,
                    other => {
                        return Err(QueryError::invalid(
                            input,
                            format!("expected True or False, got '{other}'"),
                        ));
                    }
                };
                Ok(Query::Replace {
                    find: find.to_string(),
                    replace: replace.to_string(),
                    flush,
                })
            }
            other => Err(QueryError::invalid(input, format!("unknown kind '{other}'"))),
        }
    }
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Outcome of a source lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SourceLookup {
    Found(String),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum QueryResult {
    References(BTreeMap<String, Vec<SymbolReference>>),
    /// 1-based line numbers per file
    Matches(BTreeMap<String, Vec<usize>>),
    Source(SourceLookup),
    /// Number of identifier occurrences renamed
    Renamed(usize),
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::References(grouped) => {
                for (path, refs) in grouped {
                    for r in refs {
                        writeln!(f, "{path}:{}:{} {}", r.line + 1, r.column + 1, r.roles)?;
                    }
                }
                Ok(())
            }
            QueryResult::Matches(matches) => {
                for (path, lines) in matches {
                    for line in lines {
                        writeln!(f, "{path}:{line}")?;
                    }
                }
                Ok(())
            }
            QueryResult::Source(SourceLookup::Found(text)) => writeln!(f, "{text}"),
            QueryResult::Source(SourceLookup::NotFound) => writeln!(f, "source not found"),
            QueryResult::Renamed(count) => writeln!(f, "renamed {count} occurrence(s)"),
        }
    }
}

/// Routes queries to the graph or the source tree
pub struct QueryDispatcher<'g, S: SourceTree> {
    graph: &'g SymbolGraph,
    sources: S,
}

impl<'g, S: SourceTree> QueryDispatcher<'g, S> {
    pub fn new(graph: &'g SymbolGraph, sources: S) -> Self {
        Self { graph, sources }
    }

    pub fn sources(&self) -> &S {
        &self.sources
    }

    pub fn into_sources(self) -> S {
        self.sources
    }

    /// Parse and run one query.
    pub fn dispatch(&mut self, query: &str) -> Result<QueryResult, QueryError> {
        let parsed = Query::parse(query)?;
        tracing::debug!("[query] {parsed:?}");
        self.run(parsed)
    }

    pub fn run(&mut self, query: Query) -> Result<QueryResult, QueryError> {
        match query {
            Query::Symbol(symbol) => Ok(QueryResult::References(self.graph.references(&symbol))),
            Query::Exact(pattern) => Ok(QueryResult::Matches(self.exact(&pattern))),
            Query::Source(symbol) => {
                if !self.graph.contains_symbol(&symbol) {
                    return Err(QueryError::NotFound {
                        uri: symbol.uri().to_string(),
                    });
                }
                let lookup = match self.sources.source_of(&symbol)? {
                    Some(text) => SourceLookup::Found(text),
                    None => SourceLookup::NotFound,
                };
                Ok(QueryResult::Source(lookup))
            }
            Query::Replace {
                find,
                replace,
                flush,
            } => {
                let count = self.sources.rename_identifier(&find, &replace)?;
                if flush {
                    self.sources.flush()?;
                }
                tracing::info!("[query] renamed {count} occurrence(s) of {find} to {replace}");
                Ok(QueryResult::Renamed(count))
            }
        }
    }

    fn exact(&self, pattern: &str) -> BTreeMap<String, Vec<usize>> {
        let mut matches = BTreeMap::new();
        for path in self.sources.files() {
            let lines: Vec<usize> = self
                .sources
                .lines(&path)
                .iter()
                .enumerate()
                .filter(|(_, line)| line.contains(pattern))
                .map(|(i, _)| i + 1)
                .collect();
            if !lines.is_empty() {
                matches.insert(path, lines);
            }
        }
        matches
    }
}
