// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! In-memory chunk buffering.
//!
//! Messages are accumulated in a [`ChunkBuffer`] until the writer decides to
//! flush it. A flushed chunk is written as one CHUNK record followed by one
//! IDXDATA record per connection it contains, and leaves behind a
//! [`ChunkInfo`] used to build the CHUNK_INFO records of the trailer.

use std::collections::BTreeMap;
use std::io::Write;

use super::connection::Connection;
use super::record::{length_prefix, write_data, OpCode, RecordHeader, Time};
use crate::Result;

/// Index data version
const INDEX_VERSION: u32 = 1;

/// Chunk info version
const CHUNK_INFO_VERSION: u32 = 1;

/// Size of one IDXDATA entry: time (8 bytes) + offset (4 bytes)
const INDEX_ENTRY_LEN: usize = 12;

/// Size of one CHUNK_INFO entry: connection id + message count
const CHUNK_INFO_ENTRY_LEN: usize = 8;

/// Index entry for message lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Message timestamp
    pub time: Time,
    /// Offset of the MSGDATA record within the chunk data
    pub offset: u32,
}

/// Chunk currently being filled.
#[derive(Debug, Clone)]
pub struct ChunkBuffer {
    ordinal: u32,
    data: Vec<u8>,
    index: BTreeMap<u32, Vec<IndexEntry>>,
    start_time: Option<Time>,
    end_time: Option<Time>,
}

impl ChunkBuffer {
    /// Create an empty chunk with the given sequence number.
    pub fn new(ordinal: u32) -> Self {
        Self {
            ordinal,
            data: Vec::new(),
            index: BTreeMap::new(),
            start_time: None,
            end_time: None,
        }
    }

    /// Append a MSGDATA record and index it under `conn_id`.
    ///
    /// Nothing is buffered if the payload or the resulting offset cannot be
    /// represented in 32 bits.
    pub fn append(&mut self, conn_id: u32, time: Time, payload: &[u8]) -> Result<()> {
        let offset = length_prefix("chunk offset", self.data.len())?;
        length_prefix("message payload", payload.len())?;

        let mut header = RecordHeader::new();
        header.set_u32("conn", conn_id);
        header.set_time("time", time);
        let record = header.encode(OpCode::MsgData)?;

        self.data.extend(record);
        write_data(&mut self.data, payload)?;

        self.index
            .entry(conn_id)
            .or_default()
            .push(IndexEntry { time, offset });
        self.start_time = Some(self.start_time.map_or(time, |t| t.min(time)));
        self.end_time = Some(self.end_time.map_or(time, |t| t.max(time)));

        Ok(())
    }

    /// Append a CONNECTION record. Connection records are not indexed.
    pub fn append_connection(&mut self, connection: &Connection) -> Result<()> {
        let record = connection.encode_record()?;
        self.data.extend(record);
        Ok(())
    }

    /// Buffered bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been buffered.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sequence number of this chunk.
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Raw chunk data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Earliest message time, if any message was appended.
    pub fn start_time(&self) -> Option<Time> {
        self.start_time
    }

    /// Latest message time, if any message was appended.
    pub fn end_time(&self) -> Option<Time> {
        self.end_time
    }

    /// Per-connection index entries in append order.
    pub fn index(&self) -> &BTreeMap<u32, Vec<IndexEntry>> {
        &self.index
    }

    /// Number of distinct connections with messages in this chunk.
    pub fn connection_count(&self) -> usize {
        self.index.len()
    }

    /// Number of messages in this chunk.
    pub fn message_count(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    /// Write the CHUNK record and its IDXDATA records, returning bytes written.
    pub fn write_to<W: Write>(&self, dst: &mut W) -> Result<usize> {
        let mut header = RecordHeader::new();
        header.set_str("compression", "none");
        header.set_u32("size", length_prefix("chunk", self.data.len())?);
        let mut written = header.write_to(dst, OpCode::Chunk)?;
        written += write_data(dst, &self.data)?;

        for (conn_id, entries) in &self.index {
            let mut header = RecordHeader::new();
            header.set_u32("ver", INDEX_VERSION);
            header.set_u32("conn", *conn_id);
            header.set_u32("count", entries.len() as u32);
            written += header.write_to(dst, OpCode::IndexData)?;

            let mut data = Vec::with_capacity(entries.len() * INDEX_ENTRY_LEN);
            for entry in entries {
                data.extend_from_slice(&entry.time.to_le_bytes());
                data.extend_from_slice(&entry.offset.to_le_bytes());
            }
            written += write_data(dst, &data)?;
        }

        Ok(written)
    }

    /// Summary of this chunk once written at `position`.
    pub fn summary(&self, position: u64) -> ChunkInfo {
        ChunkInfo {
            ordinal: self.ordinal,
            position,
            start_time: self.start_time.unwrap_or(Time::ZERO),
            end_time: self.end_time.unwrap_or(Time::ZERO),
            message_counts: self
                .index
                .iter()
                .map(|(conn_id, entries)| (*conn_id, entries.len() as u32))
                .collect(),
        }
    }
}

/// Chunk info for the bag summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    /// Chunk sequence number
    pub ordinal: u32,
    /// Offset of the CHUNK record in the file
    pub position: u64,
    /// Earliest message time (zero for a chunk without messages)
    pub start_time: Time,
    /// Latest message time (zero for a chunk without messages)
    pub end_time: Time,
    /// Message count per connection id
    pub message_counts: BTreeMap<u32, u32>,
}

impl ChunkInfo {
    /// Total messages in the chunk.
    pub fn message_count(&self) -> u64 {
        self.message_counts.values().map(|&c| c as u64).sum()
    }

    /// Write the CHUNK_INFO record, returning bytes written.
    pub fn write_to<W: Write>(&self, dst: &mut W) -> Result<usize> {
        let mut header = RecordHeader::new();
        header.set_u32("ver", CHUNK_INFO_VERSION);
        header.set_u64("chunk_pos", self.position);
        header.set_time("start_time", self.start_time);
        header.set_time("end_time", self.end_time);
        header.set_u32("count", self.message_counts.len() as u32);
        let mut written = header.write_to(dst, OpCode::ChunkInfo)?;

        let mut data = Vec::with_capacity(self.message_counts.len() * CHUNK_INFO_ENTRY_LEN);
        for (conn_id, count) in &self.message_counts {
            data.extend_from_slice(&conn_id.to_le_bytes());
            data.extend_from_slice(&count.to_le_bytes());
        }
        written += write_data(dst, &data)?;

        Ok(written)
    }
}
