// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for robobag.
//!
//! Provides error types for bag writing operations:
//! - File creation, write, seek and flush failures
//! - Writer lifecycle misuse (writing after close or after a failure)
//! - Out-of-range timestamps and oversized records
//! - Header block decoding and configuration loading

use std::io;

use thiserror::Error;

/// Errors that can occur while producing a bag file.
#[derive(Debug, Error)]
pub enum BagError {
    /// Underlying I/O failure while creating or writing the output
    #[error("I/O error while {context}: {source}")]
    Io {
        /// What the writer was doing
        context: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Operation attempted on a writer that has already been closed
    #[error("Cannot {operation}: bag writer is closed")]
    WriterClosed {
        /// Rejected operation
        operation: &'static str,
    },

    /// Operation attempted on a writer whose output failed earlier
    #[error("Cannot {operation}: bag writer failed on an earlier I/O error and the file is incomplete")]
    WriterFailed {
        /// Rejected operation
        operation: &'static str,
    },

    /// Timestamp outside the representable range of bag time
    #[error("Timestamp {nanos}ns is outside the supported range")]
    InvalidTimestamp {
        /// Timestamp in nanoseconds as passed by the caller
        nanos: i64,
    },

    /// Connection was not issued by this writer
    #[error("No connection with id {conn_id} (only {registered} connections registered)")]
    UnknownConnection {
        /// Connection id that was not found
        conn_id: u32,
        /// Number of connections registered so far
        registered: usize,
    },

    /// Length that does not fit the 32-bit length prefix
    #[error("{what} of {len} bytes exceeds the 32-bit length limit")]
    RecordTooLarge {
        /// What was being encoded
        what: &'static str,
        /// Offending length
        len: usize,
    },

    /// Malformed record header block
    #[error("Parse error in {context}: {message}")]
    Parse {
        /// What was being parsed
        context: String,
        /// Error message
        message: String,
    },

    /// Invalid writer configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },
}

impl BagError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        BagError::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a parse error.
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        BagError::Parse {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        BagError::Config {
            message: message.into(),
        }
    }

    /// Create a closed-writer error.
    pub fn closed(operation: &'static str) -> Self {
        BagError::WriterClosed { operation }
    }

    /// Create a failed-writer error.
    pub fn failed(operation: &'static str) -> Self {
        BagError::WriterFailed { operation }
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            BagError::Io { context, source } => {
                vec![("context", context.clone()), ("source", source.to_string())]
            }
            BagError::WriterClosed { operation } | BagError::WriterFailed { operation } => {
                vec![("operation", operation.to_string())]
            }
            BagError::InvalidTimestamp { nanos } => vec![("nanos", nanos.to_string())],
            BagError::UnknownConnection {
                conn_id,
                registered,
            } => vec![
                ("conn_id", conn_id.to_string()),
                ("registered", registered.to_string()),
            ],
            BagError::RecordTooLarge { what, len } => {
                vec![("what", what.to_string()), ("len", len.to_string())]
            }
            BagError::Parse { context, message } => {
                vec![("context", context.clone()), ("message", message.clone())]
            }
            BagError::Config { message } => vec![("message", message.clone())],
        }
    }
}

impl From<io::Error> for BagError {
    fn from(err: io::Error) -> Self {
        BagError::io("writing bag", err)
    }
}

/// Result type for robobag operations.
pub type Result<T> = std::result::Result<T, BagError>;
