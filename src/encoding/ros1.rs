// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! ROS1 message serialization.
//!
//! ROS1 serializes fields in declaration order with no padding:
//! fixed-width integers and floats little-endian, `time` as two 32-bit
//! words, and strings and variable-length arrays prefixed with a 32-bit
//! element count.

use crate::bag::record::{length_prefix, Time};
use crate::schema::{HEADER_TYPE, IMAGE_TYPE, STRING_TYPE, TEMPERATURE_TYPE};
use crate::Result;

/// A message that can be serialized into a ROS1 payload.
pub trait Ros1Message {
    /// Full ROS type name (e.g. "std_msgs/String")
    const TYPE_NAME: &'static str;

    /// Append the serialized message to `buf`.
    ///
    /// Fails with [`BagError::RecordTooLarge`](crate::BagError::RecordTooLarge)
    /// if a string or array is too long for its 32-bit count.
    fn serialize(&self, buf: &mut Vec<u8>) -> Result<()>;

    /// Serialize into a new buffer.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.serialize(&mut buf)?;
        Ok(buf)
    }
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_f64(buf: &mut Vec<u8>, value: f64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Element count of a string or array; nothing is written if it overflows.
fn put_len(buf: &mut Vec<u8>, what: &'static str, len: usize) -> Result<()> {
    put_u32(buf, length_prefix(what, len)?);
    Ok(())
}

fn put_bytes(buf: &mut Vec<u8>, what: &'static str, bytes: &[u8]) -> Result<()> {
    put_len(buf, what, bytes.len())?;
    buf.extend_from_slice(bytes);
    Ok(())
}

/// `std_msgs/Header`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosHeader {
    /// Sequence number
    pub seq: u32,
    /// Acquisition time
    pub stamp: Time,
    /// Coordinate frame
    pub frame_id: String,
}

impl Ros1Message for RosHeader {
    const TYPE_NAME: &'static str = HEADER_TYPE;

    fn serialize(&self, buf: &mut Vec<u8>) -> Result<()> {
        put_u32(buf, self.seq);
        buf.extend_from_slice(&self.stamp.to_le_bytes());
        put_bytes(buf, "frame_id", self.frame_id.as_bytes())
    }
}

/// `sensor_msgs/Image`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub header: RosHeader,
    pub height: u32,
    pub width: u32,
    /// Pixel encoding (e.g. "rgb8")
    pub encoding: String,
    pub is_bigendian: u8,
    /// Row length in bytes
    pub step: u32,
    pub data: Vec<u8>,
}

impl Ros1Message for Image {
    const TYPE_NAME: &'static str = IMAGE_TYPE;

    fn serialize(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.reserve(self.data.len() + 64);
        self.header.serialize(buf)?;
        put_u32(buf, self.height);
        put_u32(buf, self.width);
        put_bytes(buf, "encoding", self.encoding.as_bytes())?;
        buf.push(self.is_bigendian);
        put_u32(buf, self.step);
        put_bytes(buf, "image data", &self.data)
    }
}

/// `sensor_msgs/Temperature`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Temperature {
    pub header: RosHeader,
    /// Degrees Celsius
    pub temperature: f64,
    /// 0 means unknown
    pub variance: f64,
}

impl Ros1Message for Temperature {
    const TYPE_NAME: &'static str = TEMPERATURE_TYPE;

    fn serialize(&self, buf: &mut Vec<u8>) -> Result<()> {
        self.header.serialize(buf)?;
        put_f64(buf, self.temperature);
        put_f64(buf, self.variance);
        Ok(())
    }
}

/// `std_msgs/String`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringMsg {
    pub data: String,
}

impl StringMsg {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

impl Ros1Message for StringMsg {
    const TYPE_NAME: &'static str = STRING_TYPE;

    fn serialize(&self, buf: &mut Vec<u8>) -> Result<()> {
        put_bytes(buf, "string", self.data.as_bytes())
    }
}
