use crate::rate_limit::RateLimitError;
use actix_web::{http::StatusCode, HttpRequest, HttpResponse};
use derive_more::{Display, Error};
use serde_json::json;

pub mod api;

pub type Response = Result<HttpResponse, ControllerError>;

#[derive(Debug, Display, Error)]
pub enum ControllerError {
    #[display("Not found")]
    NotFound,
    #[display("Forbidden")]
    Forbidden,
    #[display("Rate limit exceeded: {message}")]
    TooManyRequests { retry_after: u64, message: String },
    #[error(ignore)]
    #[display("{_0}")]
    InvalidInput(String),
    #[display("Failed to send message")]
    ContactFailed,
    #[error(ignore)]
    #[display("{_0}")]
    InternalServerError(anyhow::Error),
}

impl From<anyhow::Error> for ControllerError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalServerError(err)
    }
}

impl From<RateLimitError> for ControllerError {
    fn from(err: RateLimitError) -> Self {
        Self::TooManyRequests {
            retry_after: err.retry_after,
            message: err.message,
        }
    }
}

impl actix_web::error::ResponseError for ControllerError {
    fn status_code(&self) -> StatusCode {
        use ControllerError::*;
        match self {
            NotFound => StatusCode::NOT_FOUND,
            Forbidden => StatusCode::FORBIDDEN,
            TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            InvalidInput(_) => StatusCode::BAD_REQUEST,
            ContactFailed | InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        log::warn!("{self:?}");
        use ControllerError::*;
        let mut res = HttpResponse::build(self.status_code());
        match self {
            TooManyRequests {
                retry_after,
                message,
            } => res
                .insert_header(("Retry-After", retry_after.to_string()))
                .json(json!({
                    "error": "Rate limit exceeded",
                    "message": message,
                    "retry_after": retry_after
                })),
            InternalServerError(_) => res.json(json!({ "error": "Internal server error" })),
            _ => res.json(json!({ "error": self.to_string() })),
        }
    }
}

/// Compares the `x-api-key` header against the configured key. Without a
/// configured key every request is refused.
pub fn ensure_api_key(req: &HttpRequest, expected: Option<&str>) -> Result<(), ControllerError> {
    let expected = expected
        .filter(|k| !k.trim().is_empty())
        .ok_or(ControllerError::Forbidden)?;
    let provided = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());
    if provided != Some(expected) {
        return Err(ControllerError::Forbidden);
    }
    Ok(())
}
