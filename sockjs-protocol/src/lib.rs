//! Wire-level framing and error taxonomy for the SockJS transport protocol.
//!
//! This crate has no knowledge of sessions, routing, or HTTP — it only
//! knows how to turn application messages into SockJS frames and back.

mod error;
mod frame;
mod iframe;

pub use error::SockJsError;
pub use frame::{
    close_frame, decode, decode_messages, encode, encode_batch, message_frame, Encodable,
    CLOSE_ANOTHER_CONNECTION, CLOSE_GO_AWAY, HEARTBEAT_FRAME, OPEN_FRAME,
};
pub use iframe::{render_iframe_html, IFRAME_HTML_TEMPLATE, IFRAME_MD5};
