// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout robobag.
//!
//! - [`BagError`] - Error taxonomy for the writer
//! - [`Result`] - Crate-wide result alias

pub mod error;

pub use error::{BagError, Result};
