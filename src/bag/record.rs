// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record-level encoding for the ROS1 bag format.
//!
//! Every on-disk unit is a record:
//!
//! ```text
//! <header_len: u32><header><data_len: u32><data>
//! ```
//!
//! where the header block is a sequence of `<field_len: u32><name>=<value>`
//! fields. Fields are always emitted in ascending key order so that the
//! same record contents always produce the same bytes.
//!
//! ## Op Codes
//! - 0x00: None (un-opcoded header block, used for connection metadata)
//! - 0x02: Message data
//! - 0x03: Bag header
//! - 0x04: Index data
//! - 0x05: Chunk
//! - 0x06: Chunk info
//! - 0x07: Connection

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{BagError, Result};

/// Version line at the start of every bag file.
pub const MAGIC: &[u8; 13] = b"#ROSBAG V2.0\n";

/// Size of the region `[0, BAG_HEADER_SLOT_LEN)` holding the magic and the
/// padded bag header record.
pub const BAG_HEADER_SLOT_LEN: usize = 4096;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Record kind stored in the `op` header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// No `op` field is emitted
    None = 0x00,
    /// Message data record
    MsgData = 0x02,
    /// Bag header record
    BagHeader = 0x03,
    /// Per-connection index of a chunk
    IndexData = 0x04,
    /// Chunk record
    Chunk = 0x05,
    /// Chunk summary in the trailer
    ChunkInfo = 0x06,
    /// Connection record
    Connection = 0x07,
}

impl OpCode {
    /// Raw byte value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parse a raw op byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(OpCode::None),
            0x02 => Some(OpCode::MsgData),
            0x03 => Some(OpCode::BagHeader),
            0x04 => Some(OpCode::IndexData),
            0x05 => Some(OpCode::Chunk),
            0x06 => Some(OpCode::ChunkInfo),
            0x07 => Some(OpCode::Connection),
            _ => None,
        }
    }
}

/// Bag timestamp: seconds and nanoseconds, each written as a little-endian
/// 32-bit word.
///
/// Only non-negative timestamps whose seconds fit in 32 bits are
/// representable; [`Time::from_nanos`] rejects everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Time {
    /// Whole seconds
    pub sec: u32,
    /// Nanoseconds within the second
    pub nsec: u32,
}

impl Time {
    /// The zero timestamp.
    pub const ZERO: Time = Time { sec: 0, nsec: 0 };

    /// Split a nanosecond timestamp into seconds and nanoseconds.
    pub fn from_nanos(nanos: i64) -> Result<Self> {
        if nanos < 0 {
            return Err(BagError::InvalidTimestamp { nanos });
        }
        let sec = u32::try_from(nanos / NANOS_PER_SEC)
            .map_err(|_| BagError::InvalidTimestamp { nanos })?;
        let nsec = (nanos % NANOS_PER_SEC) as u32;
        Ok(Time { sec, nsec })
    }

    /// Total nanoseconds.
    pub fn as_nanos(self) -> u64 {
        self.sec as u64 * NANOS_PER_SEC as u64 + self.nsec as u64
    }

    /// Encode as `sec || nsec`, little-endian.
    pub fn to_le_bytes(self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[..4].copy_from_slice(&self.sec.to_le_bytes());
        bytes[4..].copy_from_slice(&self.nsec.to_le_bytes());
        bytes
    }

    /// Decode from `sec || nsec`, little-endian.
    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Time {
            sec: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            nsec: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

/// A set of `name=value` fields making up a record header block.
///
/// Fields keep insertion order in memory; ordering by key happens when the
/// block is encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordHeader {
    fields: Vec<(String, Vec<u8>)>,
}

impl RecordHeader {
    /// Create an empty header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a raw field value, replacing any previous value for `name`.
    pub fn set_bytes(&mut self, name: &str, value: impl Into<Vec<u8>>) -> &mut Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
        self
    }

    /// Set a string field.
    pub fn set_str(&mut self, name: &str, value: &str) -> &mut Self {
        self.set_bytes(name, value.as_bytes())
    }

    /// Set a single-byte field.
    pub fn set_u8(&mut self, name: &str, value: u8) -> &mut Self {
        self.set_bytes(name, vec![value])
    }

    /// Set a little-endian u32 field.
    pub fn set_u32(&mut self, name: &str, value: u32) -> &mut Self {
        self.set_bytes(name, value.to_le_bytes())
    }

    /// Set a little-endian i32 field.
    pub fn set_i32(&mut self, name: &str, value: i32) -> &mut Self {
        self.set_bytes(name, value.to_le_bytes())
    }

    /// Set a little-endian u64 field.
    pub fn set_u64(&mut self, name: &str, value: u64) -> &mut Self {
        self.set_bytes(name, value.to_le_bytes())
    }

    /// Set a time field (`sec || nsec`).
    pub fn set_time(&mut self, name: &str, value: Time) -> &mut Self {
        self.set_bytes(name, value.to_le_bytes())
    }

    /// Raw value of a field.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_slice())
    }

    /// Field value as a u32, if present and exactly 4 bytes.
    pub fn get_u32(&self, name: &str) -> Option<u32> {
        let bytes: [u8; 4] = self.get(name)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    /// Field value as a u64, if present and exactly 8 bytes.
    pub fn get_u64(&self, name: &str) -> Option<u64> {
        let bytes: [u8; 8] = self.get(name)?.try_into().ok()?;
        Some(u64::from_le_bytes(bytes))
    }

    /// Field value as a time, if present and exactly 8 bytes.
    pub fn get_time(&self, name: &str) -> Option<Time> {
        let bytes: [u8; 8] = self.get(name)?.try_into().ok()?;
        Some(Time::from_le_bytes(bytes))
    }

    /// Field value as UTF-8 text.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        std::str::from_utf8(self.get(name)?).ok()
    }

    /// The record op code, if an `op` field is present.
    pub fn op(&self) -> Option<OpCode> {
        match self.get("op")? {
            [byte] => OpCode::from_u8(*byte),
            _ => None,
        }
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the header has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encode as `header_len || block`.
    ///
    /// When `op` is not [`OpCode::None`] an `op` field is added before the
    /// fields are sorted by key.
    pub fn encode(&self, op: OpCode) -> Result<Vec<u8>> {
        let op_value = [op.as_u8()];
        let mut fields: Vec<(&[u8], &[u8])> = self
            .fields
            .iter()
            .filter(|(key, _)| op == OpCode::None || key != "op")
            .map(|(key, value)| (key.as_bytes(), value.as_slice()))
            .collect();
        if op != OpCode::None {
            fields.push((b"op", &op_value));
        }
        fields.sort_by(|a, b| a.0.cmp(b.0));

        let block_len: usize = fields
            .iter()
            .map(|(key, value)| 4 + key.len() + 1 + value.len())
            .sum();

        let mut out = Vec::with_capacity(4 + block_len);
        out.write_u32::<LittleEndian>(length_prefix("record header", block_len)?)?;
        for (key, value) in fields {
            let field_len = key.len() + 1 + value.len();
            out.write_u32::<LittleEndian>(length_prefix("header field", field_len)?)?;
            out.extend_from_slice(key);
            out.push(b'=');
            out.extend_from_slice(value);
        }
        Ok(out)
    }

    /// Encode and write to `dst`, returning the number of bytes written
    /// (length prefix included).
    pub fn write_to<W: Write>(&self, dst: &mut W, op: OpCode) -> Result<usize> {
        let bytes = self.encode(op)?;
        dst.write_all(&bytes)?;
        Ok(bytes.len())
    }

    /// Decode a header block (without its length prefix).
    pub fn decode(block: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(block);
        let mut header = RecordHeader::new();

        while (cursor.position() as usize) < block.len() {
            let field_len = cursor.read_u32::<LittleEndian>().map_err(|e| {
                BagError::parse("RecordHeader::decode", format!("Failed to read field_len: {e}"))
            })? as usize;

            let mut field = vec![0u8; field_len];
            cursor.read_exact(&mut field).map_err(|e| {
                BagError::parse(
                    "RecordHeader::decode",
                    format!("Field of {field_len} bytes is truncated: {e}"),
                )
            })?;

            let eq_pos = field.iter().position(|&b| b == b'=').ok_or_else(|| {
                BagError::parse("RecordHeader::decode", "Field has no '=' separator")
            })?;
            let name = std::str::from_utf8(&field[..eq_pos]).map_err(|e| {
                BagError::parse("RecordHeader::decode", format!("Field name is not UTF-8: {e}"))
            })?;
            header.set_bytes(name, &field[eq_pos + 1..]);
        }

        Ok(header)
    }
}

/// Write a length-prefixed data section, returning bytes written.
pub fn write_data<W: Write>(dst: &mut W, data: &[u8]) -> Result<usize> {
    dst.write_u32::<LittleEndian>(length_prefix("record data", data.len())?)?;
    dst.write_all(data)?;
    Ok(4 + data.len())
}

/// Convert a length into its 32-bit prefix.
pub(crate) fn length_prefix(what: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| BagError::RecordTooLarge { what, len })
}
