// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message schema lookup for bag connections.
//!
//! Every connection record carries the message definition text and its
//! MD5 content hash. The writer resolves both through a [`SchemaLookup`]
//! keyed by message type name. [`SchemaRegistry`] is the default lookup and
//! ships with the builtin types from [`builtin_types`].
//!
//! Types the lookup does not know about are not an error: the writer falls
//! back to [`fallback_schema`] (`std_msgs/String`).

pub mod builtin_types;

use std::collections::BTreeMap;

use md5::{Digest, Md5};

pub use builtin_types::{
    header_schema, image_schema, string_schema, temperature_schema, HEADER_TYPE, IMAGE_TYPE,
    STRING_TYPE, TEMPERATURE_TYPE,
};

/// Definition text and content hash of a message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSchema {
    /// Full message definition as stored in the connection record
    pub definition: String,
    /// Lowercase hex MD5 fingerprint
    pub md5sum: String,
}

impl MessageSchema {
    /// Create a schema from a definition and a precomputed hash.
    pub fn new(definition: impl Into<String>, md5sum: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            md5sum: md5sum.into(),
        }
    }

    /// Build the schema of a flat message type (only primitive fields).
    ///
    /// The definition is normalized and hashed as-is. Types embedding other
    /// messages need the embedded hashes substituted into the hash text and
    /// should use [`MessageSchema::new`] instead.
    pub fn from_definition(definition: &str) -> Self {
        let normalized = normalize_definition(definition);
        let md5sum = md5_hex(&normalized);
        Self {
            definition: normalized,
            md5sum,
        }
    }
}

/// Resolves a message type name to its schema.
///
/// Implementations must be deterministic for a given type string.
pub trait SchemaLookup: Send {
    /// Look up a message type; `None` means unknown.
    fn lookup(&self, message_type: &str) -> Option<MessageSchema>;
}

/// Map of message type names to schemas.
///
/// Lookups try the exact name first, then the short name (last path
/// segment), so `sensor_msgs/msg/Image` and `Image` both resolve to
/// `sensor_msgs/Image`.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, MessageSchema>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the builtin types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, schema) in builtin_types::builtin_schemas() {
            registry.insert(name, schema);
        }
        registry
    }

    /// Register or replace a schema.
    pub fn insert(&mut self, message_type: impl Into<String>, schema: MessageSchema) {
        self.schemas.insert(message_type.into(), schema);
    }

    /// Resolve a type name.
    pub fn get(&self, message_type: &str) -> Option<&MessageSchema> {
        if let Some(schema) = self.schemas.get(message_type) {
            return Some(schema);
        }
        let wanted = short_name(message_type);
        self.schemas
            .iter()
            .find(|(name, _)| short_name(name) == wanted)
            .map(|(_, schema)| schema)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl SchemaLookup for SchemaRegistry {
    fn lookup(&self, message_type: &str) -> Option<MessageSchema> {
        self.get(message_type).cloned()
    }
}

/// Schema used for message types no lookup knows about.
pub fn fallback_schema() -> MessageSchema {
    string_schema()
}

/// Last path segment of a type name (`pkg/msg/Name` -> `Name`).
pub fn short_name(message_type: &str) -> &str {
    message_type.rsplit('/').next().unwrap_or(message_type)
}

/// Normalize a message definition.
///
/// Each line is trimmed and stripped of `#` comments, blank lines are
/// dropped and the rest are joined with `\n` without a trailing newline.
pub fn normalize_definition(definition: &str) -> String {
    definition
        .lines()
        .map(|line| match line.find('#') {
            Some(pos) => line[..pos].trim(),
            None => line.trim(),
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lowercase hex MD5 of `text`.
pub fn md5_hex(text: &str) -> String {
    hex::encode(Md5::digest(text.as_bytes()))
}
