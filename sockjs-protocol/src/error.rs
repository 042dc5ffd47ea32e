use std::fmt;

/// Taxonomy of failures that can occur while routing or framing a SockJS
/// request. The HTTP layer is the sole place these get turned into wire
/// responses; everything else just returns `Result<_, SockJsError>`.
#[derive(Debug, thiserror::Error)]
pub enum SockJsError {
    /// Unknown route, malformed URL, missing session when creation isn't
    /// permitted, or a transport the route disallows.
    #[error("{0}")]
    NotFound(String),

    /// Static resource hit with the wrong HTTP verb. Carries the `Allow`
    /// header value the response should advertise.
    #[error("405: Method Not Allowed")]
    MethodNotAllowed(&'static str),

    /// `xhr_send` / `jsonp_send` / inbound WS frame failed to parse as JSON.
    #[error("Broken JSON encoding.")]
    InvalidJson(#[source] serde_json::Error),

    /// Send transport invoked with an empty body.
    #[error("Payload expected.")]
    MissingPayload,

    /// `jsonp` polling without the required `c` callback query parameter.
    #[error("\"callback\" parameter required")]
    MissingCallback,

    /// Anything else; carries a source for `trace` mode to render.
    #[error("500: Internal Server Error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SockJsError {
    pub fn internal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        SockJsError::Internal(Box::new(err))
    }

    pub fn internal_msg(msg: impl Into<String>) -> Self {
        SockJsError::Internal(Box::new(MessageError(msg.into())))
    }

    /// Render the full `source()` chain, one cause per line, for `trace` mode.
    pub fn trace(&self) -> String {
        let mut lines = vec![self.to_string()];
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            lines.push(format!("caused by: {err}"));
            cause = err.source();
        }
        lines.join("\n")
    }
}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MessageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_renders_source_chain() {
        let inner = MessageError("database unreachable".to_owned());
        let err = SockJsError::internal(inner);
        assert_eq!(
            err.trace(),
            "500: Internal Server Error\ncaused by: database unreachable"
        );
    }

    #[test]
    fn trace_with_no_source_is_one_line() {
        let err = SockJsError::MissingPayload;
        assert_eq!(err.trace(), "Payload expected.");
    }

    #[test]
    fn display_messages_match_wire_contract() {
        assert_eq!(SockJsError::MissingPayload.to_string(), "Payload expected.");
        assert_eq!(
            SockJsError::MissingCallback.to_string(),
            "\"callback\" parameter required"
        );
        assert_eq!(
            SockJsError::NotFound("no such route".to_owned()).to_string(),
            "no such route"
        );
    }
}
