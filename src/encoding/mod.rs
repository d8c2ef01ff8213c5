// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message payload encoding.
//!
//! - [`ros1`] - ROS1 serialization for the builtin message types

pub mod ros1;

pub use ros1::{Image, Ros1Message, RosHeader, StringMsg, Temperature};
