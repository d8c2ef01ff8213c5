// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.
//!
//! A minimal bag reader: enough to walk the records of a file produced by
//! the writer and check what ended up on disk.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use byteorder::{LittleEndian, ReadBytesExt};

use robobag::bag::{OpCode, RecordHeader, Time, BAG_HEADER_SLOT_LEN, MAGIC};

// ============================================================================
// Temporary Files
// ============================================================================

/// Create a temporary bag file path and a cleanup guard for its directory.
pub fn temp_bag_path(name: &str) -> (PathBuf, CleanupGuard) {
    let random = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    let dir = std::env::temp_dir().join(format!(
        "robobag_test_{}_{}_{}",
        name,
        std::process::id(),
        random
    ));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{name}.bag"));
    (path, CleanupGuard(dir))
}

/// Removes the temporary directory on drop.
#[derive(Debug)]
pub struct CleanupGuard(PathBuf);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

// ============================================================================
// Failing Sink
// ============================================================================

/// In-memory sink that rejects writes once `limit` bytes have been stored.
#[derive(Debug)]
pub struct FailingSink {
    inner: Cursor<Vec<u8>>,
    limit: usize,
}

impl FailingSink {
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Cursor::new(Vec::new()),
            limit,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        self.inner.get_ref()
    }
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.inner.position() as usize + buf.len() > self.limit {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for FailingSink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

// ============================================================================
// Record Walker
// ============================================================================

/// One record read back from a bag.
#[derive(Debug, Clone)]
pub struct Record {
    /// Offset of the record relative to the walked buffer
    pub offset: usize,
    pub header: RecordHeader,
    pub data: Vec<u8>,
}

impl Record {
    pub fn op(&self) -> Option<OpCode> {
        self.header.op()
    }
}

/// Read consecutive records from `bytes` until the end of the buffer.
pub fn walk_records(bytes: &[u8]) -> Vec<Record> {
    let mut cursor = Cursor::new(bytes);
    let mut records = Vec::new();
    while (cursor.position() as usize) < bytes.len() {
        let offset = cursor.position() as usize;
        let header_len = cursor.read_u32::<LittleEndian>().unwrap() as usize;
        let mut block = vec![0u8; header_len];
        cursor.read_exact(&mut block).unwrap();
        let data_len = cursor.read_u32::<LittleEndian>().unwrap() as usize;
        let mut data = vec![0u8; data_len];
        cursor.read_exact(&mut data).unwrap();
        records.push(Record {
            offset,
            header: RecordHeader::decode(&block).unwrap(),
            data,
        });
    }
    records
}

// ============================================================================
// Parsed Bag
// ============================================================================

/// A message found inside a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMessage {
    pub conn: u32,
    pub time: Time,
    /// Offset of the MSGDATA record within the chunk data
    pub offset: u32,
    pub payload: Vec<u8>,
}

/// Connection metadata read from a CONNECTION record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionMeta {
    pub conn: u32,
    pub topic: String,
    pub message_type: String,
    pub md5sum: String,
    pub message_definition: String,
}

/// A CHUNK record with the IDXDATA records following it.
#[derive(Debug, Clone)]
pub struct ParsedChunk {
    pub position: u64,
    pub connections: Vec<ConnectionMeta>,
    pub messages: Vec<ChunkMessage>,
    /// conn id -> (time, offset) entries
    pub index: BTreeMap<u32, Vec<(Time, u32)>>,
}

/// CHUNK_INFO record contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChunkInfo {
    pub chunk_pos: u64,
    pub start_time: Time,
    pub end_time: Time,
    pub counts: Vec<(u32, u32)>,
}

/// The whole bag, split into its sections.
#[derive(Debug, Clone)]
pub struct ParsedBag {
    pub index_pos: u64,
    pub conn_count: u32,
    pub chunk_count: u32,
    pub chunks: Vec<ParsedChunk>,
    pub connections: Vec<ConnectionMeta>,
    pub chunk_infos: Vec<ParsedChunkInfo>,
}

impl ParsedBag {
    /// Parse a closed bag.
    pub fn parse(bytes: &[u8]) -> Self {
        assert!(bytes.starts_with(MAGIC), "missing version line");
        let slot = walk_records(&bytes[MAGIC.len()..BAG_HEADER_SLOT_LEN]);
        assert_eq!(slot.len(), 1, "header slot must hold one record");
        let bag_header = &slot[0];
        assert_eq!(bag_header.op(), Some(OpCode::BagHeader));
        assert!(bag_header.data.iter().all(|&b| b == b' '));

        let index_pos = bag_header.header.get_u64("index_pos").unwrap();
        let conn_count = bag_header.header.get_u32("conn_count").unwrap();
        let chunk_count = bag_header.header.get_u32("chunk_count").unwrap();
        assert!(index_pos as usize >= BAG_HEADER_SLOT_LEN);

        let mut chunks: Vec<ParsedChunk> = Vec::new();
        for record in walk_records(&bytes[BAG_HEADER_SLOT_LEN..index_pos as usize]) {
            match record.op() {
                Some(OpCode::Chunk) => {
                    assert_eq!(record.header.get_str("compression"), Some("none"));
                    assert_eq!(
                        record.header.get_u32("size"),
                        Some(record.data.len() as u32)
                    );
                    chunks.push(parse_chunk(
                        (BAG_HEADER_SLOT_LEN + record.offset) as u64,
                        &record.data,
                    ));
                }
                Some(OpCode::IndexData) => {
                    let chunk = chunks.last_mut().expect("IDXDATA before any CHUNK");
                    let conn = record.header.get_u32("conn").unwrap();
                    let count = record.header.get_u32("count").unwrap() as usize;
                    assert_eq!(record.header.get_u32("ver"), Some(1));
                    assert_eq!(record.data.len(), count * 12);
                    let mut cursor = Cursor::new(&record.data);
                    let entries = (0..count)
                        .map(|_| {
                            let sec = cursor.read_u32::<LittleEndian>().unwrap();
                            let nsec = cursor.read_u32::<LittleEndian>().unwrap();
                            let offset = cursor.read_u32::<LittleEndian>().unwrap();
                            (Time { sec, nsec }, offset)
                        })
                        .collect();
                    assert!(chunk.index.insert(conn, entries).is_none());
                }
                other => panic!("unexpected record {other:?} in data section"),
            }
        }

        let mut connections = Vec::new();
        let mut chunk_infos = Vec::new();
        for record in walk_records(&bytes[index_pos as usize..]) {
            match record.op() {
                Some(OpCode::Connection) => connections.push(parse_connection(&record)),
                Some(OpCode::ChunkInfo) => {
                    let count = record.header.get_u32("count").unwrap() as usize;
                    assert_eq!(record.header.get_u32("ver"), Some(1));
                    assert_eq!(record.data.len(), count * 8);
                    let mut cursor = Cursor::new(&record.data);
                    let counts = (0..count)
                        .map(|_| {
                            (
                                cursor.read_u32::<LittleEndian>().unwrap(),
                                cursor.read_u32::<LittleEndian>().unwrap(),
                            )
                        })
                        .collect();
                    chunk_infos.push(ParsedChunkInfo {
                        chunk_pos: record.header.get_u64("chunk_pos").unwrap(),
                        start_time: record.header.get_time("start_time").unwrap(),
                        end_time: record.header.get_time("end_time").unwrap(),
                        counts,
                    });
                }
                other => panic!("unexpected record {other:?} in index section"),
            }
        }

        ParsedBag {
            index_pos,
            conn_count,
            chunk_count,
            chunks,
            connections,
            chunk_infos,
        }
    }

    /// Messages per connection id, in file order.
    pub fn messages_by_connection(&self) -> BTreeMap<u32, Vec<(Time, Vec<u8>)>> {
        let mut out: BTreeMap<u32, Vec<(Time, Vec<u8>)>> = BTreeMap::new();
        for chunk in &self.chunks {
            for message in &chunk.messages {
                out.entry(message.conn)
                    .or_default()
                    .push((message.time, message.payload.clone()));
            }
        }
        out
    }
}

fn parse_chunk(position: u64, data: &[u8]) -> ParsedChunk {
    let mut connections = Vec::new();
    let mut messages = Vec::new();
    for record in walk_records(data) {
        match record.op() {
            Some(OpCode::Connection) => connections.push(parse_connection(&record)),
            Some(OpCode::MsgData) => messages.push(ChunkMessage {
                conn: record.header.get_u32("conn").unwrap(),
                time: record.header.get_time("time").unwrap(),
                offset: record.offset as u32,
                payload: record.data,
            }),
            other => panic!("unexpected record {other:?} in chunk"),
        }
    }
    ParsedChunk {
        position,
        connections,
        messages,
        index: BTreeMap::new(),
    }
}

fn parse_connection(record: &Record) -> ConnectionMeta {
    let metadata = RecordHeader::decode(&record.data).unwrap();
    assert_eq!(metadata.op(), None);
    let topic = record.header.get_str("topic").unwrap().to_string();
    assert_eq!(metadata.get_str("topic"), Some(topic.as_str()));
    ConnectionMeta {
        conn: record.header.get_u32("conn").unwrap(),
        topic,
        message_type: metadata.get_str("type").unwrap().to_string(),
        md5sum: metadata.get_str("md5sum").unwrap().to_string(),
        message_definition: metadata.get_str("message_definition").unwrap().to_string(),
    }
}
