//! Shared fixtures: a tiny protobuf encoder for SCIP indexes, a temporary
//! workspace and deterministic providers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use symdex::{EmbeddingProvider, ProviderError, ProviderResult, SourceProvider, Symbol};
use tempfile::TempDir;

fn varint(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

fn len_field(field: u32, payload: &[u8], out: &mut Vec<u8>) {
    varint(u64::from(field << 3 | 2), out);
    varint(payload.len() as u64, out);
    out.extend_from_slice(payload);
}

fn varint_field(field: u32, value: u64, out: &mut Vec<u8>) {
    varint(u64::from(field << 3), out);
    varint(value, out);
}

fn packed(values: &[i32]) -> Vec<u8> {
    let mut out = Vec::new();
    for v in values {
        varint(*v as i64 as u64, &mut out);
    }
    out
}

/// One occurrence to encode
pub struct Occ {
    pub symbol: String,
    pub range: Vec<i32>,
    pub roles: u32,
    pub enclosing: Option<Vec<i32>>,
}

impl Occ {
    pub fn new(symbol: &str, range: &[i32], roles: u32) -> Self {
        Self {
            symbol: symbol.to_string(),
            range: range.to_vec(),
            roles,
            enclosing: None,
        }
    }

    pub fn enclosing(mut self, range: &[i32]) -> Self {
        self.enclosing = Some(range.to_vec());
        self
    }
}

/// One document to encode
#[derive(Default)]
pub struct Doc {
    pub path: String,
    pub symbols: Vec<String>,
    pub occurrences: Vec<Occ>,
}

impl Doc {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Default::default()
        }
    }

    pub fn declare(mut self, symbol: &str) -> Self {
        self.symbols.push(symbol.to_string());
        self
    }

    pub fn occurrence(mut self, occ: Occ) -> Self {
        self.occurrences.push(occ);
        self
    }
}

pub const DEFINITION: u32 = 1;
pub const READ_ACCESS: u32 = 8;

/// Encode documents as a SCIP `Index` message
pub fn encode_index(documents: &[Doc]) -> Vec<u8> {
    let mut index = Vec::new();

    let mut tool = Vec::new();
    len_field(1, b"fixture-indexer", &mut tool);
    let mut metadata = Vec::new();
    varint_field(1, 0, &mut metadata);
    len_field(2, &tool, &mut metadata);
    len_field(3, b"file:///workspace", &mut metadata);
    len_field(1, &metadata, &mut index);

    for doc in documents {
        let mut document = Vec::new();
        len_field(1, doc.path.as_bytes(), &mut document);
        for occ in &doc.occurrences {
            let mut occurrence = Vec::new();
            len_field(1, &packed(&occ.range), &mut occurrence);
            len_field(2, occ.symbol.as_bytes(), &mut occurrence);
            varint_field(3, u64::from(occ.roles), &mut occurrence);
            if let Some(enclosing) = &occ.enclosing {
                len_field(7, &packed(enclosing), &mut occurrence);
            }
            len_field(2, &occurrence, &mut document);
        }
        for symbol in &doc.symbols {
            let mut info = Vec::new();
            len_field(1, symbol.as_bytes(), &mut info);
            len_field(3, b"Fixture documentation.", &mut info);
            len_field(3, &info, &mut document);
        }
        len_field(4, b"python", &mut document);
        len_field(2, &document, &mut index);
    }
    index
}

/// A temporary workspace holding an index and source files
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn add_index(&self, documents: &[Doc]) -> PathBuf {
        let path = self.dir.path().join("index.scip");
        fs::write(&path, encode_index(documents)).expect("Failed to write index");
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Deterministic provider counting its calls. Texts sharing words get
/// similar vectors.
pub struct CountingProvider {
    calls: AtomicUsize,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for CountingProvider {
    fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains("UNEMBEDDABLE") {
            return Err(ProviderError::Embedding {
                reason: "rejected".to_string(),
            });
        }

        let mut vector = vec![0.05_f32; 16];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let bucket = word.bytes().fold(7u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
            vector[(bucket % 16) as usize] += 1.0;
        }
        Ok(vector)
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Source text from a fixed table keyed by URI
pub struct TableSources(pub HashMap<String, String>);

impl TableSources {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    pub fn set(&mut self, uri: &str, text: &str) {
        self.0.insert(uri.to_string(), text.to_string());
    }
}

impl SourceProvider for TableSources {
    fn source_of(&self, symbol: &Symbol) -> ProviderResult<Option<String>> {
        Ok(self.0.get(symbol.uri()).cloned())
    }
}
