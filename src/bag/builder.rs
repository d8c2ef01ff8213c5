// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Builder pattern for creating bag writers.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::connection::ConnectionRegistry;
use super::writer::BagWriter;
use crate::schema::{SchemaLookup, SchemaRegistry};
use crate::{BagError, Result};

/// Default chunk threshold (20 MiB)
pub const DEFAULT_CHUNK_THRESHOLD: usize = 20 * 1024 * 1024;

/// Configuration for a bag writer.
///
/// Can be loaded from TOML:
///
/// ```toml
/// chunk_threshold = 1048576
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Flush the open chunk once its size exceeds this many bytes
    pub chunk_threshold: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            chunk_threshold: DEFAULT_CHUNK_THRESHOLD,
        }
    }
}

impl WriterConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| BagError::config(format!("Invalid writer config: {e}")))
    }

    /// Load a configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BagError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }
}

/// Builder for bag writers.
///
/// # Example
///
/// ```rust,no_run
/// use robobag::BagWriterBuilder;
///
/// let mut writer = BagWriterBuilder::new()
///     .chunk_threshold(1024 * 1024)
///     .open("output.bag")?;
/// let conn = writer.add_connection("/chatter", "std_msgs/String")?;
/// writer.write(&conn, 1_000_000_000, b"\x05\x00\x00\x00hello")?;
/// writer.close()?;
/// # Ok::<(), robobag::BagError>(())
/// ```
#[derive(Default)]
pub struct BagWriterBuilder {
    config: WriterConfig,
    schemas: Option<Box<dyn SchemaLookup>>,
}

impl BagWriterBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: WriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the chunk flush threshold in bytes.
    pub fn chunk_threshold(mut self, bytes: usize) -> Self {
        self.config.chunk_threshold = bytes;
        self
    }

    /// Resolve message schemas through `lookup` instead of the builtin registry.
    pub fn schema_lookup(mut self, lookup: impl SchemaLookup + 'static) -> Self {
        self.schemas = Some(Box::new(lookup));
        self
    }

    /// Create the file at `path` and start a bag in it.
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<BagWriter<BufWriter<File>>> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| BagError::io(format!("creating {}", path.display()), e))?;
        self.build(BufWriter::new(file))
    }

    /// Start a bag in an arbitrary seekable sink.
    pub fn build<W: Write + Seek>(self, sink: W) -> Result<BagWriter<W>> {
        let schemas = self
            .schemas
            .unwrap_or_else(|| Box::new(SchemaRegistry::with_builtins()));
        BagWriter::start(sink, self.config, ConnectionRegistry::new(schemas))
    }
}

impl std::fmt::Debug for BagWriterBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BagWriterBuilder")
            .field("config", &self.config)
            .field("custom_schemas", &self.schemas.is_some())
            .finish()
    }
}
