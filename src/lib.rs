// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Robobag
//!
//! Writer for ROS1 bag files (format version 2.0).
//!
//! Messages are buffered into uncompressed chunks, each followed by a
//! per-connection index, and the file ends with a summary of all
//! connections and chunks. The bag header at the start of the file is
//! patched on close to point at that summary.
//!
//! ## Architecture
//!
//! - `bag/` - Record encoding, chunking and the writer itself
//! - `schema/` - Message definitions and MD5 sums for connection records
//! - `encoding/` - ROS1 serialization of the builtin message types
//! - `core/` - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use robobag::encoding::{RosHeader, Temperature};
//! use robobag::BagWriter;
//!
//! let mut writer = BagWriter::open("thermo.bag")?;
//! let conn = writer.add_connection("/thermo", "sensor_msgs/Temperature")?;
//!
//! let reading = Temperature {
//!     header: RosHeader::default(),
//!     temperature: 21.5,
//!     variance: 0.0,
//! };
//! writer.write_message(&conn, 1_700_000_000_000_000_000, &reading)?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

pub use core::{BagError, Result};

// Bag format
pub mod bag;

pub use bag::{
    BagWriter, BagWriterBuilder, ChunkInfo, Connection, Time, WriterConfig,
    DEFAULT_CHUNK_THRESHOLD,
};

// Message schemas
pub mod schema;

pub use schema::{MessageSchema, SchemaLookup, SchemaRegistry};

// Payload encoding
pub mod encoding;
