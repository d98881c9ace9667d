//! The framed message value type.

use serde::{Deserialize, Serialize};

/// A single message exchanged between two peers.
///
/// On the wire a message is one newline-terminated JSON object with exactly
/// four required keys: `op` (integer) and `data1`/`data2`/`data3` (strings).
/// The framework attaches no meaning to any of them; the opcode space is
/// entirely application-defined and `data1..data3` are opaque payload slots.
///
/// Messages are plain values with structural equality and no identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Application-defined operation code.
    #[serde(rename = "op")]
    pub opcode: i64,
    /// First payload field.
    pub data1: String,
    /// Second payload field.
    pub data2: String,
    /// Third payload field.
    pub data3: String,
}

impl Message {
    /// Create a message with the given opcode and empty payload fields.
    #[must_use]
    pub fn new(opcode: i64) -> Self {
        Self {
            opcode,
            data1: String::new(),
            data2: String::new(),
            data3: String::new(),
        }
    }

    /// Set the first payload field.
    #[must_use]
    pub fn with_data1(mut self, data1: impl Into<String>) -> Self {
        self.data1 = data1.into();
        self
    }

    /// Set the second payload field.
    #[must_use]
    pub fn with_data2(mut self, data2: impl Into<String>) -> Self {
        self.data2 = data2.into();
        self
    }

    /// Set the third payload field.
    #[must_use]
    pub fn with_data3(mut self, data3: impl Into<String>) -> Self {
        self.data3 = data3.into();
        self
    }
}
