// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! ROS1 bag writing.
//!
//! - [`record`] - Record and header-block encoding
//! - [`connection`] - Connection registry
//! - [`chunk`] - Chunk buffering and per-connection indexing
//! - [`writer`] - The bag writer
//! - [`builder`] - Writer configuration and builder

pub mod builder;
pub mod chunk;
pub mod connection;
pub mod record;
pub mod writer;

pub use builder::{BagWriterBuilder, WriterConfig, DEFAULT_CHUNK_THRESHOLD};
pub use chunk::{ChunkBuffer, ChunkInfo, IndexEntry};
pub use connection::{Connection, ConnectionRegistry};
pub use record::{OpCode, RecordHeader, Time, BAG_HEADER_SLOT_LEN, MAGIC};
pub use writer::BagWriter;
