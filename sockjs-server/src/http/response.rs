//! Translates [`SockJsError`] into the literal wire responses the SockJS
//! protocol test suite expects. This is the sole place an error becomes an
//! HTTP body — everywhere else just returns `Result<_, SockJsError>`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sockjs_protocol::SockJsError;

pub type HttpResult<T = Response> = Result<T, SockJsError>;

/// Wraps a [`SockJsError`] together with whether `trace` mode is on, so the
/// `IntoResponse` impl knows whether to render the full cause chain.
pub struct ErrorResponse {
    pub error: SockJsError,
    pub trace: bool,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let body = if self.trace {
            self.error.trace()
        } else {
            match &self.error {
                SockJsError::NotFound(_) => "Not found".to_owned(),
                SockJsError::MethodNotAllowed(_) => "Method not allowed".to_owned(),
                other => other.to_string(),
            }
        };
        let status = match &self.error {
            SockJsError::NotFound(_) => StatusCode::NOT_FOUND,
            SockJsError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            SockJsError::InvalidJson(_) | SockJsError::MissingPayload | SockJsError::MissingCallback => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            SockJsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let SockJsError::MethodNotAllowed(allowed) = &self.error {
            let mut response = (status, body).into_response();
            response
                .headers_mut()
                .insert("Allow", allowed.parse().expect("allowed-methods string is valid header value"));
            return response;
        }
        (status, body).into_response()
    }
}
