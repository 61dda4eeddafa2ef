//! Minimal protobuf wire-format reader.
//!
//! Only what the index schema needs: varints, length-delimited fields,
//! packed repeated int32 and skipping of unknown fields. Offsets in errors
//! are absolute positions in the original buffer.

use crate::error::{DecodeError, DecodeResult};

/// Maximum nesting of deprecated group fields we are willing to skip
const MAX_GROUP_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WireType {
    Varint,
    Fixed64,
    Len,
    StartGroup,
    EndGroup,
    Fixed32,
}

impl WireType {
    fn from_bits(bits: u8, offset: usize) -> DecodeResult<Self> {
        match bits {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            wire_type => Err(DecodeError::InvalidWireType { offset, wire_type }),
        }
    }
}

/// Cursor over one protobuf message
#[derive(Debug, Clone)]
pub(crate) struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> WireReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            base: 0,
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Absolute offset of the cursor
    pub(crate) fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn take(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        let remaining = self.buf.len() - self.pos;
        if len > remaining {
            return Err(DecodeError::Truncated {
                offset: self.offset(),
                needed: len - remaining,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub(crate) fn read_varint(&mut self) -> DecodeResult<u64> {
        let start = self.offset();
        let mut value: u64 = 0;
        for shift in (0..64).step_by(7) {
            let byte = match self.buf.get(self.pos) {
                Some(b) => *b,
                None => {
                    return Err(DecodeError::Truncated {
                        offset: self.offset(),
                        needed: 1,
                    });
                }
            };
            self.pos += 1;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                // The tenth byte may only carry the final bit
                if shift == 63 && byte > 1 {
                    return Err(DecodeError::VarintOverflow { offset: start });
                }
                return Ok(value);
            }
        }
        Err(DecodeError::VarintOverflow { offset: start })
    }

    /// Reads a field key, returning `(field_number, wire_type)`.
    pub(crate) fn read_key(&mut self) -> DecodeResult<(u32, WireType)> {
        let offset = self.offset();
        let key = self.read_varint()?;
        let wire_type = WireType::from_bits((key & 0x7) as u8, offset)?;
        Ok(((key >> 3) as u32, wire_type))
    }

    pub(crate) fn read_int32(&mut self) -> DecodeResult<i32> {
        // int32 is sign-extended to 64 bits on the wire
        Ok(self.read_varint()? as i64 as i32)
    }

    pub(crate) fn read_bool(&mut self) -> DecodeResult<bool> {
        Ok(self.read_varint()? != 0)
    }

    pub(crate) fn read_bytes(&mut self) -> DecodeResult<&'a [u8]> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| DecodeError::Truncated {
            offset: self.offset(),
            needed: usize::MAX,
        })?;
        self.take(len)
    }

    pub(crate) fn read_string(&mut self, field: &'static str) -> DecodeResult<String> {
        let offset = self.offset();
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| DecodeError::InvalidUtf8 { offset, field })
    }

    /// Reader over an embedded message
    pub(crate) fn read_message(&mut self) -> DecodeResult<WireReader<'a>> {
        let len_offset = self.offset();
        let bytes = self.read_bytes()?;
        let header = self.offset() - len_offset - bytes.len();
        Ok(WireReader {
            buf: bytes,
            pos: 0,
            base: len_offset + header,
        })
    }

    /// Appends a repeated int32 field, accepting both packed and unpacked
    /// encodings.
    pub(crate) fn read_repeated_int32(
        &mut self,
        wire_type: WireType,
        out: &mut Vec<i32>,
    ) -> DecodeResult<()> {
        match wire_type {
            WireType::Len => {
                let mut packed = self.read_message()?;
                while !packed.at_end() {
                    out.push(packed.read_int32()?);
                }
                Ok(())
            }
            WireType::Varint => {
                out.push(self.read_int32()?);
                Ok(())
            }
            _ => Err(DecodeError::InvalidWireType {
                offset: self.offset(),
                wire_type: wire_type as u8,
            }),
        }
    }

    /// Skips the value of a field we do not decode.
    pub(crate) fn skip(&mut self, wire_type: WireType) -> DecodeResult<()> {
        self.skip_nested(wire_type, 0)
    }

    fn skip_nested(&mut self, wire_type: WireType, depth: usize) -> DecodeResult<()> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.take(8)?;
            }
            WireType::Fixed32 => {
                self.take(4)?;
            }
            WireType::Len => {
                self.read_bytes()?;
            }
            WireType::StartGroup => {
                if depth >= MAX_GROUP_DEPTH {
                    return Err(DecodeError::InvalidWireType {
                        offset: self.offset(),
                        wire_type: 3,
                    });
                }
                loop {
                    if self.at_end() {
                        return Err(DecodeError::Truncated {
                            offset: self.offset(),
                            needed: 1,
                        });
                    }
                    let (_, inner) = self.read_key()?;
                    if inner == WireType::EndGroup {
                        break;
                    }
                    self.skip_nested(inner, depth + 1)?;
                }
            }
            WireType::EndGroup => {
                return Err(DecodeError::InvalidWireType {
                    offset: self.offset(),
                    wire_type: 4,
                });
            }
        }
        Ok(())
    }
}
