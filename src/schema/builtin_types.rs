// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Predefined ROS1 message types.
//!
//! ## Supported Types
//!
//! - `std_msgs/String` - Single string field (also the fallback schema)
//! - `std_msgs/Header` - Sequence number, stamp and frame id
//! - `sensor_msgs/Image` - Raw image with a header
//! - `sensor_msgs/Temperature` - Temperature reading with a header
//!
//! Hashes follow the ROS1 rule: the hash text of a type embedding another
//! message replaces the embedded type name with that type's MD5 sum.
//! Definitions of composite types append the embedded definition after a
//! separator line, as rosbag stores them.

use super::{md5_hex, MessageSchema};

/// `std_msgs/String`
pub const STRING_TYPE: &str = "std_msgs/String";
/// `std_msgs/Header`
pub const HEADER_TYPE: &str = "std_msgs/Header";
/// `sensor_msgs/Image`
pub const IMAGE_TYPE: &str = "sensor_msgs/Image";
/// `sensor_msgs/Temperature`
pub const TEMPERATURE_TYPE: &str = "sensor_msgs/Temperature";

const STRING_DEF: &str = "string data";

const HEADER_DEF: &str = "uint32 seq\ntime stamp\nstring frame_id";

const IMAGE_FIELDS: &str = "uint32 height\n\
                            uint32 width\n\
                            string encoding\n\
                            uint8 is_bigendian\n\
                            uint32 step\n\
                            uint8[] data";

const TEMPERATURE_FIELDS: &str = "float64 temperature\nfloat64 variance";

const DEPENDENCY_SEPARATOR: &str =
    "================================================================================";

/// Schema of `std_msgs/String`.
pub fn string_schema() -> MessageSchema {
    MessageSchema::new(STRING_DEF, md5_hex(STRING_DEF))
}

/// Schema of `std_msgs/Header`.
pub fn header_schema() -> MessageSchema {
    MessageSchema::new(HEADER_DEF, md5_hex(HEADER_DEF))
}

/// Schema of `sensor_msgs/Image`.
pub fn image_schema() -> MessageSchema {
    with_header(IMAGE_FIELDS)
}

/// Schema of `sensor_msgs/Temperature`.
pub fn temperature_schema() -> MessageSchema {
    with_header(TEMPERATURE_FIELDS)
}

/// All builtin types, keyed by full type name.
pub fn builtin_schemas() -> Vec<(&'static str, MessageSchema)> {
    vec![
        (STRING_TYPE, string_schema()),
        (HEADER_TYPE, header_schema()),
        (IMAGE_TYPE, image_schema()),
        (TEMPERATURE_TYPE, temperature_schema()),
    ]
}

/// Schema of a type whose first field is `std_msgs/Header header`.
fn with_header(fields: &str) -> MessageSchema {
    let header = header_schema();
    let md5_text = format!("{} header\n{fields}", header.md5sum);
    let definition = format!(
        "{HEADER_TYPE} header\n{fields}\n{DEPENDENCY_SEPARATOR}\nMSG: {HEADER_TYPE}\n{}",
        header.definition
    );
    MessageSchema::new(definition, md5_hex(&md5_text))
}
