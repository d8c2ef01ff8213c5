// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Connection registry.
//!
//! A connection is a `(topic, message type)` pair with a sequential id and
//! the schema resolved for its type. Each new connection is serialized into
//! the chunk that is open at the time, and every connection is written again
//! to the trailer on close so a reader that only looks at the index section
//! still finds complete metadata.

use tracing::debug;

use super::chunk::ChunkBuffer;
use super::record::{OpCode, RecordHeader};
use crate::schema::{fallback_schema, SchemaLookup, SchemaRegistry};
use crate::Result;

/// A registered `(topic, message type)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Sequential id, starting from 0
    pub id: u32,
    /// Topic name (e.g. "/chatter")
    pub topic: String,
    /// Message type (e.g. "std_msgs/String")
    pub message_type: String,
    /// MD5 of the message definition
    pub md5sum: String,
    /// Message definition text
    pub message_definition: String,
}

impl Connection {
    /// Encode the CONNECTION record: `conn` + `topic` header, followed by
    /// the un-opcoded metadata block as the data section.
    pub fn encode_record(&self) -> Result<Vec<u8>> {
        let mut header = RecordHeader::new();
        header.set_u32("conn", self.id);
        header.set_str("topic", &self.topic);
        let mut out = header.encode(OpCode::Connection)?;

        let mut metadata = RecordHeader::new();
        metadata.set_str("topic", &self.topic);
        metadata.set_str("type", &self.message_type);
        metadata.set_str("md5sum", &self.md5sum);
        metadata.set_str("message_definition", &self.message_definition);
        out.extend(metadata.encode(OpCode::None)?);

        Ok(out)
    }
}

/// Owns every connection created by a writer.
pub struct ConnectionRegistry {
    connections: Vec<Connection>,
    schemas: Box<dyn SchemaLookup>,
}

impl ConnectionRegistry {
    /// Create a registry resolving schemas through `schemas`.
    pub fn new(schemas: Box<dyn SchemaLookup>) -> Self {
        Self {
            connections: Vec::new(),
            schemas,
        }
    }

    /// Create a new connection and serialize it into `chunk`.
    ///
    /// Unknown message types get the fallback schema.
    pub fn add_connection(
        &mut self,
        topic: &str,
        message_type: &str,
        chunk: &mut ChunkBuffer,
    ) -> Result<Connection> {
        let schema = self.schemas.lookup(message_type).unwrap_or_else(|| {
            debug!(message_type, "unknown message type, using fallback schema");
            fallback_schema()
        });

        let connection = Connection {
            id: self.connections.len() as u32,
            topic: topic.to_string(),
            message_type: message_type.to_string(),
            md5sum: schema.md5sum,
            message_definition: schema.definition,
        };

        chunk.append_connection(&connection)?;

        debug!(
            conn_id = connection.id,
            topic,
            message_type,
            md5sum = %connection.md5sum,
            "added connection"
        );

        self.connections.push(connection.clone());
        Ok(connection)
    }

    /// Return the connection for `(topic, message_type)`, creating it if needed.
    pub fn get_or_create(
        &mut self,
        topic: &str,
        message_type: &str,
        chunk: &mut ChunkBuffer,
    ) -> Result<Connection> {
        match self.find(topic, message_type) {
            Some(existing) => Ok(existing.clone()),
            None => self.add_connection(topic, message_type, chunk),
        }
    }

    /// Find an existing connection by topic and type.
    pub fn find(&self, topic: &str, message_type: &str) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.topic == topic && c.message_type == message_type)
    }

    /// Connection by id.
    pub fn get(&self, id: u32) -> Option<&Connection> {
        self.connections.get(id as usize)
    }

    /// All connections in id order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Number of connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connection has been added.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(Box::new(SchemaRegistry::with_builtins()))
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections)
            .finish_non_exhaustive()
    }
}
