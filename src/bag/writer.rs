// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! ROS1 bag file writer implementation.
//!
//! # ROS1 Bag Format Overview
//!
//! A bag file written by [`BagWriter`] has the following structure:
//! 1. Version line: `#ROSBAG V2.0\n`
//! 2. Bag header record, padded with spaces so that bytes `[0, 4096)` hold
//!    the version line and the header record
//! 3. For each flushed chunk:
//!    - Chunk record (connection records and message data records)
//!    - Index data records (one per connection in the chunk)
//! 4. Connection records (summary at end)
//! 5. Chunk info records (summary at end)
//!
//! The bag header is written with placeholder values when the file is
//! opened and patched in place on [`close`](BagWriter::close), once the
//! position of the summary section is known. Until then `index_pos` is 0,
//! which readers treat as "no index, scan the file".
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use robobag::BagWriter;
//!
//! let mut writer = BagWriter::open("output.bag")?;
//! let conn = writer.add_connection("/chatter", "std_msgs/String")?;
//!
//! let timestamp_ns = 1_234_567_890;
//! writer.write(&conn, timestamp_ns, b"\x05\x00\x00\x00hello")?;
//!
//! writer.close()?;
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use super::builder::{BagWriterBuilder, WriterConfig};
use super::chunk::{ChunkBuffer, ChunkInfo};
use super::connection::{Connection, ConnectionRegistry};
use super::record::{write_data, OpCode, RecordHeader, Time, BAG_HEADER_SLOT_LEN, MAGIC};
use crate::encoding::ros1::Ros1Message;
use crate::schema::short_name;
use crate::{BagError, Result};

/// Lifecycle of a writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// Accepting connections and messages
    Open,
    /// Summary written and header patched
    Closed,
    /// An I/O error left the file in an unknown state
    Failed,
}

/// ROS1 bag file writer.
///
/// Messages are buffered into chunks that are flushed once they exceed the
/// configured threshold. Dropping an open writer closes it; use
/// [`close`](BagWriter::close) to observe errors.
///
/// The bag starts at the sink's position when the writer is created. All
/// offsets stored in the bag are relative to that start, so the bag bytes
/// form a valid bag on their own even when the sink holds a prefix.
pub struct BagWriter<W: Write + Seek = BufWriter<File>> {
    sink: W,
    state: WriterState,
    /// Sink offset of the version line
    base: u64,
    /// Bytes of the bag written so far; the bag offset of the next record
    position: u64,
    config: WriterConfig,
    registry: ConnectionRegistry,
    /// Open chunk
    chunk: ChunkBuffer,
    /// Summaries of flushed chunks
    flushed: Vec<ChunkInfo>,
}

impl BagWriter<BufWriter<File>> {
    /// Create a new bag file with the default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        BagWriterBuilder::new().open(path)
    }

    /// Create a new bag file with the given configuration.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: WriterConfig) -> Result<Self> {
        BagWriterBuilder::new().config(config).open(path)
    }
}

impl<W: Write + Seek> BagWriter<W> {
    /// Start a bag in `sink` with the default configuration.
    pub fn new(sink: W) -> Result<Self> {
        BagWriterBuilder::new().build(sink)
    }

    /// Write the version line and the placeholder header, and open the
    /// first chunk.
    pub(crate) fn start(mut sink: W, config: WriterConfig, registry: ConnectionRegistry) -> Result<Self> {
        let base = sink
            .stream_position()
            .map_err(|e| BagError::io("querying sink position", e))?;
        let slot = encode_header_slot(0, 1, 1)?;
        sink.write_all(&slot)
            .map_err(|e| BagError::io("writing bag header", e))?;

        Ok(Self {
            sink,
            state: WriterState::Open,
            base,
            position: slot.len() as u64,
            config,
            registry,
            chunk: ChunkBuffer::new(0),
            flushed: Vec::new(),
        })
    }

    /// Register a new connection for `topic` carrying `message_type`.
    ///
    /// Every call creates a new connection, even for a pair that is already
    /// registered; use [`connection`](BagWriter::connection) to reuse one.
    pub fn add_connection(&mut self, topic: &str, message_type: &str) -> Result<Connection> {
        self.ensure_open("add connection")?;
        self.registry
            .add_connection(topic, message_type, &mut self.chunk)
    }

    /// Return the connection for `(topic, message_type)`, creating it on
    /// first use.
    pub fn connection(&mut self, topic: &str, message_type: &str) -> Result<Connection> {
        self.ensure_open("add connection")?;
        self.registry
            .get_or_create(topic, message_type, &mut self.chunk)
    }

    /// Write a serialized message.
    ///
    /// `timestamp` is in nanoseconds since the Unix epoch; negative values
    /// are rejected. The open chunk is flushed right after the message that
    /// pushes it past the threshold, so a single large message can make a
    /// chunk exceed the threshold.
    pub fn write(&mut self, connection: &Connection, timestamp: i64, data: &[u8]) -> Result<()> {
        self.ensure_open("write message")?;
        let time = Time::from_nanos(timestamp)?;
        self.check_connection(connection)?;

        self.chunk.append(connection.id, time, data)?;

        if self.chunk.size() > self.config.chunk_threshold {
            let result = self.flush_chunk();
            self.track(result)?;
        }
        Ok(())
    }

    /// Serialize and write a ROS1 message.
    ///
    /// The message type must match the connection's type; debug builds
    /// assert it.
    pub fn write_message<M: Ros1Message>(
        &mut self,
        connection: &Connection,
        timestamp: i64,
        message: &M,
    ) -> Result<()> {
        debug_assert!(
            M::TYPE_NAME == connection.message_type
                || short_name(M::TYPE_NAME) == short_name(&connection.message_type),
            "{} written to connection {} of type {}",
            M::TYPE_NAME,
            connection.id,
            connection.message_type
        );
        self.write(connection, timestamp, &message.to_bytes()?)
    }

    /// Flush the open chunk, write the summary section and patch the bag
    /// header.
    ///
    /// Calling `close` on a closed writer does nothing. A writer that failed
    /// on an earlier I/O error cannot be closed: the file has no summary and
    /// its header still holds placeholder values.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            WriterState::Open => {}
            WriterState::Closed => return Ok(()),
            WriterState::Failed => return Err(BagError::failed("close")),
        }
        let result = self.finish();
        self.track(result)?;
        self.state = WriterState::Closed;
        Ok(())
    }

    /// Whether the writer still accepts messages.
    pub fn is_open(&self) -> bool {
        self.state == WriterState::Open
    }

    /// All connections in id order.
    pub fn connections(&self) -> &[Connection] {
        self.registry.connections()
    }

    /// Summaries of the chunks flushed so far.
    pub fn chunk_infos(&self) -> &[ChunkInfo] {
        &self.flushed
    }

    /// Number of chunks flushed so far.
    pub fn chunk_count(&self) -> usize {
        self.flushed.len()
    }

    /// Bytes buffered in the open chunk.
    pub fn buffered_bytes(&self) -> usize {
        self.chunk.size()
    }

    /// Bytes of the bag written so far (excluding the open chunk).
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Writer configuration.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// The underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        match self.state {
            WriterState::Open => Ok(()),
            WriterState::Closed => Err(BagError::closed(operation)),
            WriterState::Failed => Err(BagError::failed(operation)),
        }
    }

    /// Reject connections that were not issued by this writer.
    fn check_connection(&self, connection: &Connection) -> Result<()> {
        match self.registry.get(connection.id) {
            Some(known)
                if known.topic == connection.topic
                    && known.message_type == connection.message_type =>
            {
                Ok(())
            }
            _ => Err(BagError::UnknownConnection {
                conn_id: connection.id,
                registered: self.registry.len(),
            }),
        }
    }

    /// Mark the writer failed if an I/O step went wrong.
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.state = WriterState::Failed;
        }
        result
    }

    /// Write the open chunk and its index, then start the next chunk.
    fn flush_chunk(&mut self) -> Result<()> {
        if self.chunk.is_empty() {
            return Ok(());
        }

        let position = self.position;
        let written = self.chunk.write_to(&mut self.sink)?;
        self.position += written as u64;

        let next = ChunkBuffer::new(self.chunk.ordinal() + 1);
        let chunk = std::mem::replace(&mut self.chunk, next);

        debug!(
            ordinal = chunk.ordinal(),
            position,
            size = chunk.size(),
            connections = chunk.connection_count(),
            messages = chunk.message_count(),
            "flushed chunk"
        );

        self.flushed.push(chunk.summary(position));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.flush_chunk()?;

        let index_pos = self.position;

        let mut summary = Vec::new();
        for connection in self.registry.connections() {
            summary.extend(connection.encode_record()?);
        }
        for chunk_info in &self.flushed {
            chunk_info.write_to(&mut summary)?;
        }
        self.sink
            .write_all(&summary)
            .map_err(|e| BagError::io("writing index", e))?;
        self.position += summary.len() as u64;

        let conn_count = self.registry.len() as u32;
        let chunk_count = self.flushed.len() as u32;
        let slot = encode_header_slot(index_pos, conn_count, chunk_count)?;

        self.sink
            .seek(SeekFrom::Start(self.base + MAGIC.len() as u64))
            .map_err(|e| BagError::io("seeking to bag header", e))?;
        self.sink
            .write_all(&slot[MAGIC.len()..])
            .map_err(|e| BagError::io("updating bag header", e))?;
        self.sink
            .seek(SeekFrom::Start(self.base + self.position))
            .map_err(|e| BagError::io("seeking to end of bag", e))?;
        self.sink
            .flush()
            .map_err(|e| BagError::io("flushing bag", e))?;

        info!(index_pos, conn_count, chunk_count, "closed bag");
        Ok(())
    }
}

impl<W: Write + Seek> Drop for BagWriter<W> {
    fn drop(&mut self) {
        if self.state == WriterState::Open {
            if let Err(e) = self.close() {
                warn!(error = %e, "failed to close bag writer on drop");
            }
        }
    }
}

impl<W: Write + Seek> std::fmt::Debug for BagWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BagWriter")
            .field("state", &self.state)
            .field("base", &self.base)
            .field("position", &self.position)
            .field("config", &self.config)
            .field("connections", &self.registry.len())
            .field("chunks", &self.flushed.len())
            .finish()
    }
}

/// Encode the version line and the bag header record, padded to exactly
/// [`BAG_HEADER_SLOT_LEN`] bytes.
///
/// All header fields are fixed width, so the padding length only depends on
/// the field set and the slot keeps its size when patched.
fn encode_header_slot(index_pos: u64, conn_count: u32, chunk_count: u32) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(BAG_HEADER_SLOT_LEN);
    buffer.extend_from_slice(MAGIC);

    let mut header = RecordHeader::new();
    header.set_u64("index_pos", index_pos);
    header.set_u32("conn_count", conn_count);
    header.set_u32("chunk_count", chunk_count);
    header.write_to(&mut buffer, OpCode::BagHeader)?;

    let padding = vec![b' '; BAG_HEADER_SLOT_LEN - buffer.len() - 4];
    write_data(&mut buffer, &padding)?;

    debug_assert_eq!(buffer.len(), BAG_HEADER_SLOT_LEN);
    Ok(buffer)
}
