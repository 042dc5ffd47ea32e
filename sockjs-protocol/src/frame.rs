use serde_json::Value;

use crate::error::SockJsError;

/// Literal `OPEN` frame bytes.
pub const OPEN_FRAME: &str = "o\n";
/// Literal `HEARTBEAT` frame bytes.
pub const HEARTBEAT_FRAME: &str = "h\n";

/// Close code used when a second concurrent reader attaches to a locked session.
pub const CLOSE_ANOTHER_CONNECTION: (u16, &str) = (2010, "Another connection still open");
/// Close code used once a session has expired.
pub const CLOSE_GO_AWAY: (u16, &str) = (3000, "Go away!");

/// A value accepted by [`encode`]: either a bare application message (wrapped
/// in a single-element JSON array) or an already-structured JSON array/object
/// (serialized as-is).
pub enum Encodable {
    Text(String),
    Json(Value),
}

impl From<String> for Encodable {
    fn from(s: String) -> Self {
        Encodable::Text(s)
    }
}

impl From<&str> for Encodable {
    fn from(s: &str) -> Self {
        Encodable::Text(s.to_owned())
    }
}

/// Encode a single message or pre-built array/object for the wire.
///
/// Strings are wrapped in a one-element JSON array; arrays and objects are
/// serialized as-is with no inserted whitespace. Anything else is rejected.
pub fn encode(payload: Encodable) -> Result<String, SockJsError> {
    match payload {
        Encodable::Text(s) => serde_json::to_string(&[s]).map_err(SockJsError::internal),
        Encodable::Json(v @ (Value::Array(_) | Value::Object(_))) => {
            serde_json::to_string(&v).map_err(SockJsError::internal)
        }
        Encodable::Json(_) => Err(SockJsError::internal_msg(
            "unable to serialize: not a string, array, or object",
        )),
    }
}

/// Encode a batch of raw application messages as a JSON array — the body of
/// a `MESSAGE` frame. Always succeeds: a `Vec<String>` is always valid JSON.
pub fn encode_batch(messages: &[String]) -> String {
    serde_json::to_string(messages).expect("Vec<String> always serializes")
}

/// Decode a raw request body into a JSON value, per the `decode` contract:
/// UTF-8 decode then JSON parse.
pub fn decode(bytes: &[u8]) -> Result<Value, SockJsError> {
    use serde::de::Error as _;
    let text = std::str::from_utf8(bytes)
        .map_err(|e| SockJsError::InvalidJson(serde_json::Error::custom(e)))?;
    serde_json::from_str(text).map_err(SockJsError::InvalidJson)
}

/// Decode a request body expected to be a JSON array of message strings
/// (the `xhr_send` / `jsonp_send` / WS-inbound contract).
pub fn decode_messages(bytes: &[u8]) -> Result<Vec<String>, SockJsError> {
    use serde::de::Error as _;
    match decode(bytes)? {
        Value::Array(items) => items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                other => serde_json::from_value(other).map_err(SockJsError::InvalidJson),
            })
            .collect(),
        _ => Err(SockJsError::InvalidJson(serde_json::Error::custom(
            "expected a JSON array of messages",
        ))),
    }
}

/// Build the body of a `MESSAGE` frame: `"a" + payload_json`. The caller
/// decides whether to append a trailing newline for its transport.
pub fn message_frame(payload_json: &str) -> String {
    format!("a{payload_json}")
}

/// Build a `CLOSE` frame: `c[code,"reason"]`, optionally newline-terminated.
pub fn close_frame(code: u16, reason: &str, newline: bool) -> String {
    let body = format!("c[{code},\"{reason}\"]");
    if newline {
        format!("{body}\n")
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_wraps_bare_string_in_array() {
        assert_eq!(encode(Encodable::from("hello")).unwrap(), "[\"hello\"]");
    }

    #[test]
    fn encode_passes_through_array_and_object() {
        let arr = Value::Array(vec![Value::String("a".into()), Value::String("b".into())]);
        assert_eq!(encode(Encodable::Json(arr)).unwrap(), "[\"a\",\"b\"]");

        let obj = serde_json::json!({"a": 1, "b": 2});
        assert_eq!(encode(Encodable::Json(obj)).unwrap(), "{\"a\":1,\"b\":2}");
    }

    #[test]
    fn encode_rejects_bare_scalars() {
        assert!(encode(Encodable::Json(Value::Number(1.into()))).is_err());
        assert!(encode(Encodable::Json(Value::Bool(true))).is_err());
    }

    #[test]
    fn decode_rejects_invalid_json() {
        assert!(decode(b"not-json").is_err());
    }

    #[test]
    fn decode_messages_round_trips_string_array() {
        let messages = decode_messages(br#"["hello","world"]"#).unwrap();
        assert_eq!(messages, vec!["hello".to_owned(), "world".to_owned()]);
    }

    #[test]
    fn decode_messages_rejects_non_array() {
        assert!(decode_messages(br#"{"a":1}"#).is_err());
    }

    #[test]
    fn message_frame_prefixes_with_a() {
        assert_eq!(message_frame("[\"hello\"]"), "a[\"hello\"]");
    }

    #[test]
    fn close_frame_matches_wire_contract() {
        assert_eq!(
            close_frame(2010, "Another connection still open", false),
            "c[2010,\"Another connection still open\"]"
        );
        assert_eq!(
            close_frame(3000, "Go away!", true),
            "c[3000,\"Go away!\"]\n"
        );
    }

    #[test]
    fn encode_batch_always_succeeds_for_strings() {
        assert_eq!(encode_batch(&[]), "[]");
        assert_eq!(
            encode_batch(&["hello".to_owned()]),
            "[\"hello\"]"
        );
    }
}
