//! Loader for binary SCIP cross-reference indexes.
//!
//! A straight structured deserialization of the protobuf layout
//! (documents → symbol declarations → occurrences). No graph semantics live
//! here; see [`crate::graph`] for that.
//!
//! # Decoded fields
//!
//! | message           | fields                                                   |
//! |-------------------|----------------------------------------------------------|
//! | Index             | 1 metadata, 2 documents, 3 external_symbols              |
//! | Metadata          | 1 version, 2 tool_info, 3 project_root, 4 text encoding  |
//! | Document          | 1 relative_path, 2 occurrences, 3 symbols, 4 language    |
//! | SymbolInformation | 1 symbol, 3 documentation, 4 relationships, 6 display_name, 8 enclosing_symbol |
//! | Occurrence        | 1 range, 2 symbol, 3 symbol_roles, 7 enclosing_range     |
//!
//! Everything else is skipped by wire type.

mod roles;
mod wire;

pub use roles::SymbolRoles;

use crate::Range;
use crate::error::{DecodeError, DecodeResult};
use memmap2::MmapOptions;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use wire::{WireReader, WireType};

/// A decoded index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
    pub metadata: Option<Metadata>,
    pub documents: Vec<Document>,
    /// Symbols defined outside the indexed documents
    pub external_symbols: Vec<SymbolInformation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub version: i32,
    pub tool_info: Option<ToolInfo>,
    pub project_root: String,
    pub text_document_encoding: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub relative_path: String,
    pub language: String,
    pub occurrences: Vec<Occurrence>,
    pub symbols: Vec<SymbolInformation>,
}

/// A declared symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SymbolInformation {
    pub symbol: String,
    pub documentation: Vec<String>,
    pub relationships: Vec<Relationship>,
    pub display_name: String,
    pub enclosing_symbol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub symbol: String,
    pub is_reference: bool,
    pub is_implementation: bool,
    pub is_type_definition: bool,
    pub is_definition: bool,
}

/// A use of a symbol at a source location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    pub symbol: String,
    pub range: Range,
    pub roles: SymbolRoles,
    /// Span of the whole syntax node the occurrence belongs to, when recorded
    pub enclosing_range: Option<Range>,
}

/// Memory-map and decode the index at `path`.
pub fn load_index(path: impl AsRef<Path>) -> DecodeResult<Index> {
    let path = path.as_ref();
    let io_error = |source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let len = file.metadata().map_err(io_error)?.len();
    if len == 0 {
        // Cannot map an empty file; an empty message is a valid empty index
        return Ok(Index::default());
    }

    let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(io_error)?;
    let index = Index::decode(&mmap)?;

    tracing::debug!(
        "[scip] loaded {} document(s) from {}",
        index.documents.len(),
        path.display()
    );
    Ok(index)
}

impl Index {
    /// Decode an index from its protobuf bytes.
    pub fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        let mut reader = WireReader::new(bytes);
        let mut index = Index::default();

        while !reader.at_end() {
            match reader.read_key()? {
                (1, WireType::Len) => {
                    index.metadata = Some(Metadata::decode(reader.read_message()?)?);
                }
                (2, WireType::Len) => index
                    .documents
                    .push(Document::decode(reader.read_message()?)?),
                (3, WireType::Len) => index
                    .external_symbols
                    .push(SymbolInformation::decode(reader.read_message()?)?),
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }

        Ok(index)
    }

    pub fn occurrence_count(&self) -> usize {
        self.documents.iter().map(|d| d.occurrences.len()).sum()
    }
}

impl Metadata {
    fn decode(mut reader: WireReader<'_>) -> DecodeResult<Self> {
        let mut metadata = Metadata::default();
        while !reader.at_end() {
            match reader.read_key()? {
                (1, WireType::Varint) => metadata.version = reader.read_int32()?,
                (2, WireType::Len) => {
                    metadata.tool_info = Some(ToolInfo::decode(reader.read_message()?)?);
                }
                (3, WireType::Len) => {
                    metadata.project_root = reader.read_string("metadata.project_root")?;
                }
                (4, WireType::Varint) => metadata.text_document_encoding = reader.read_int32()?,
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(metadata)
    }
}

impl ToolInfo {
    fn decode(mut reader: WireReader<'_>) -> DecodeResult<Self> {
        let mut info = ToolInfo::default();
        while !reader.at_end() {
            match reader.read_key()? {
                (1, WireType::Len) => info.name = reader.read_string("tool_info.name")?,
                (2, WireType::Len) => info.version = reader.read_string("tool_info.version")?,
                (3, WireType::Len) => info
                    .arguments
                    .push(reader.read_string("tool_info.arguments")?),
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(info)
    }
}

impl Document {
    fn decode(mut reader: WireReader<'_>) -> DecodeResult<Self> {
        let mut document = Document::default();
        while !reader.at_end() {
            match reader.read_key()? {
                (1, WireType::Len) => {
                    document.relative_path = reader.read_string("document.relative_path")?;
                }
                (2, WireType::Len) => document
                    .occurrences
                    .push(Occurrence::decode(reader.read_message()?)?),
                (3, WireType::Len) => document
                    .symbols
                    .push(SymbolInformation::decode(reader.read_message()?)?),
                (4, WireType::Len) => document.language = reader.read_string("document.language")?,
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(document)
    }
}

impl SymbolInformation {
    fn decode(mut reader: WireReader<'_>) -> DecodeResult<Self> {
        let mut info = SymbolInformation::default();
        while !reader.at_end() {
            match reader.read_key()? {
                (1, WireType::Len) => info.symbol = reader.read_string("symbol_information.symbol")?,
                (3, WireType::Len) => info
                    .documentation
                    .push(reader.read_string("symbol_information.documentation")?),
                (4, WireType::Len) => info
                    .relationships
                    .push(Relationship::decode(reader.read_message()?)?),
                (6, WireType::Len) => {
                    info.display_name = reader.read_string("symbol_information.display_name")?;
                }
                (8, WireType::Len) => {
                    info.enclosing_symbol =
                        reader.read_string("symbol_information.enclosing_symbol")?;
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(info)
    }
}

impl Relationship {
    fn decode(mut reader: WireReader<'_>) -> DecodeResult<Self> {
        let mut relationship = Relationship::default();
        while !reader.at_end() {
            match reader.read_key()? {
                (1, WireType::Len) => {
                    relationship.symbol = reader.read_string("relationship.symbol")?;
                }
                (2, WireType::Varint) => relationship.is_reference = reader.read_bool()?,
                (3, WireType::Varint) => relationship.is_implementation = reader.read_bool()?,
                (4, WireType::Varint) => relationship.is_type_definition = reader.read_bool()?,
                (5, WireType::Varint) => relationship.is_definition = reader.read_bool()?,
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }
        Ok(relationship)
    }
}

impl Occurrence {
    fn decode(mut reader: WireReader<'_>) -> DecodeResult<Self> {
        let start = reader.offset();
        let mut range = Vec::with_capacity(4);
        let mut enclosing = Vec::new();
        let mut symbol = String::new();
        let mut raw_roles = 0;

        while !reader.at_end() {
            match reader.read_key()? {
                (1, wire_type @ (WireType::Len | WireType::Varint)) => {
                    reader.read_repeated_int32(wire_type, &mut range)?;
                }
                (2, WireType::Len) => symbol = reader.read_string("occurrence.symbol")?,
                (3, WireType::Varint) => raw_roles = reader.read_int32()?,
                (7, wire_type @ (WireType::Len | WireType::Varint)) => {
                    reader.read_repeated_int32(wire_type, &mut enclosing)?;
                }
                (_, wire_type) => reader.skip(wire_type)?,
            }
        }

        let enclosing_range = if enclosing.is_empty() {
            None
        } else {
            Some(decode_range(&enclosing, start)?)
        };

        Ok(Occurrence {
            symbol,
            range: decode_range(&range, start)?,
            roles: SymbolRoles::decode(raw_roles),
            enclosing_range,
        })
    }
}

/// `[line, start_col, end_col]` (single line) or
/// `[start_line, start_col, end_line, end_col]`
fn decode_range(values: &[i32], offset: usize) -> DecodeResult<Range> {
    let position = |value: i32| {
        u32::try_from(value).map_err(|_| DecodeError::NegativePosition { offset, value })
    };
    match *values {
        [line, start, end] => Ok(Range::new(
            position(line)?,
            position(start)?,
            position(line)?,
            position(end)?,
        )),
        [start_line, start, end_line, end] => Ok(Range::new(
            position(start_line)?,
            position(start)?,
            position(end_line)?,
            position(end)?,
        )),
        _ => Err(DecodeError::InvalidRange {
            offset,
            len: values.len(),
        }),
    }
}
