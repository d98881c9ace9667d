//! # netline wire format
//!
//! Serializes a [`Message`] to, and deserializes it from, one
//! newline-terminated text line.
//!
//! The wire representation of a message is a compact JSON object with
//! exactly four required keys, `op` (integer) and `data1`/`data2`/`data3`
//! (strings), followed by a single `\n` terminator. Other keys may be
//! present and are ignored on decode. There is no handshake and no length
//! prefix; the newline is the only frame delimiter, in either direction.
//!
//! JSON string escaping guarantees the serialized text itself never
//! contains a literal newline, so the delimiter is unambiguous even when a
//! payload field contains `\n`.
//!
//! ```
//! use netline_core::Message;
//!
//! let message = Message::new(1).with_data1("hello");
//! let bytes = netline_wire::encode(&message);
//! assert_eq!(bytes.last(), Some(&b'\n'));
//!
//! let decoded = netline_wire::decode(&bytes[..bytes.len() - 1]).unwrap();
//! assert_eq!(decoded, message);
//! ```

use netline_core::{Error, Message, Result};

/// Encode a message as one newline-terminated JSON line.
///
/// # Panics
///
/// Debug builds assert that the serialized text contains no literal
/// newline. That invariant cannot be violated through the public `Message`
/// type (JSON escaping covers every payload byte), so a failure here is a
/// programming error in the codec itself, not a recoverable condition.
#[must_use]
pub fn encode(message: &Message) -> Vec<u8> {
    let mut line =
        serde_json::to_vec(message).expect("a Message always serializes to a JSON object");
    debug_assert!(
        !line.contains(&b'\n'),
        "encoded message must not contain a literal newline"
    );
    line.push(b'\n');
    line
}

/// Decode one line (without its terminator) into a message.
///
/// Accepts any JSON object carrying the four required keys with the
/// required types; unknown extra keys are ignored.
///
/// # Errors
///
/// Returns [`Error::InvalidMessage`] if the line is not valid JSON, or if
/// any required key is missing or of the wrong type. The error carries the
/// offending line for diagnostics; no partial state is retained.
pub fn decode(line: &[u8]) -> Result<Message> {
    serde_json::from_slice(line).map_err(|source| Error::InvalidMessage {
        line: String::from_utf8_lossy(line).into_owned(),
        details: source.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn round_trip(message: &Message) -> Message {
        let bytes = encode(message);
        decode(&bytes[..bytes.len() - 1]).expect("round trip must decode")
    }

    #[test]
    fn round_trips_plain_message() {
        let message = Message::new(1)
            .with_data1("hello")
            .with_data2("world")
            .with_data3("!");
        assert_eq!(round_trip(&message), message);
    }

    #[test]
    fn round_trips_unicode_payload() {
        let message = Message::new(-7).with_data1("приве́т").with_data2("🦀");
        assert_eq!(round_trip(&message), message);
    }

    #[test]
    fn newline_in_payload_stays_escaped_on_the_wire() {
        let message = Message::new(3).with_data1("line one\nline two");
        let bytes = encode(&message);
        // The only raw newline is the frame terminator.
        assert_eq!(bytes.iter().filter(|&&b| b == b'\n').count(), 1);
        assert_eq!(bytes.last(), Some(&b'\n'));
        assert_eq!(round_trip(&message), message);
    }

    #[test]
    fn encodes_compact_json_with_renamed_opcode() {
        let bytes = encode(&Message::new(200_000));
        let line = std::str::from_utf8(&bytes).unwrap();
        assert_eq!(
            line,
            "{\"op\":200000,\"data1\":\"\",\"data2\":\"\",\"data3\":\"\"}\n"
        );
    }

    #[test]
    fn rejects_missing_key() {
        let error = decode(br#"{"op":1,"data1":"a","data2":"b"}"#).unwrap_err();
        match error {
            Error::InvalidMessage { details, .. } => assert!(details.contains("data3")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_non_integer_opcode() {
        assert!(decode(br#"{"op":"1","data1":"","data2":"","data3":""}"#).is_err());
        assert!(decode(br#"{"op":1.5,"data1":"","data2":"","data3":""}"#).is_err());
    }

    #[test]
    fn rejects_non_string_payload_field() {
        assert!(decode(br#"{"op":1,"data1":7,"data2":"","data3":""}"#).is_err());
        assert!(decode(br#"{"op":1,"data1":"","data2":null,"data3":""}"#).is_err());
    }

    #[test]
    fn tolerates_extra_keys() {
        let message = decode(br#"{"op":2,"data1":"a","data2":"b","data3":"c","extra":[1,2]}"#)
            .expect("extra keys are not validated");
        assert_eq!(message.opcode, 2);
        assert_eq!(message.data1, "a");
    }

    #[test]
    fn rejects_line_that_is_not_json() {
        let error = decode(b"definitely not json").unwrap_err();
        match error {
            Error::InvalidMessage { line, .. } => assert_eq!(line, "definitely not json"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
