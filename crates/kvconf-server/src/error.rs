// Error handling for the HTTP layer
// Maps the core error taxonomy onto status codes and the response envelope

use std::fmt::{Display, Formatter};

use actix_web::{HttpResponse, http::StatusCode};
use kvconf_common::KvconfError;

use crate::model::response as common;

// Local wrapper so actix's ResponseError can be implemented
// (Cannot impl foreign trait for foreign type due to orphan rules)
#[derive(Debug)]
pub struct AppError {
    inner: KvconfError,
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<KvconfError> for AppError {
    fn from(value: KvconfError) -> Self {
        AppError { inner: value }
    }
}

impl AppError {
    pub fn inner(&self) -> &KvconfError {
        &self.inner
    }

    /// Text reported to the caller
    fn message(&self) -> String {
        match &self.inner {
            KvconfError::UnsupportedMediaType(message)
            | KvconfError::NotFound(message)
            | KvconfError::Conflict(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl actix_web::error::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.inner {
            KvconfError::Validation(_) => StatusCode::BAD_REQUEST,
            KvconfError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            KvconfError::NotFound(_) => StatusCode::NOT_FOUND,
            KvconfError::Conflict(_) => StatusCode::CONFLICT,
            KvconfError::Backend(_) => StatusCode::BAD_GATEWAY,
            KvconfError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            KvconfError::Cancelled(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        common::Result::<()>::http_response(
            self.status_code(),
            self.inner.error_code().code,
            self.message(),
            (),
        )
    }
}
