//! HTTP adapter mapping for domain errors.
//!
//! The domain error stays transport agnostic; this module turns it into a
//! status code and a JSON body `{code, message, traceId}`.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::domain::{ElectionError, ErrorCode};
use crate::middleware::trace::{TRACE_ID_HEADER, TraceId};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ElectionError>;

/// JSON error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::QuotaExceeded => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Build the client-facing body, hiding infrastructure details.
pub(crate) fn error_body(error: &ElectionError) -> ErrorBody {
    let message = if error.is_infrastructure() {
        "service temporarily unavailable".to_owned()
    } else {
        error.to_string()
    };
    ErrorBody {
        code: error.code(),
        message,
        trace_id: TraceId::current().map(|id| id.to_string()),
    }
}

impl ResponseError for ElectionError {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_infrastructure() {
            error!(error = %self, "request failed on a backing store");
        } else {
            warn!(code = ?self.code(), error = %self, "request rejected");
        }

        let body = error_body(self);
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = &body.trace_id {
            builder.insert_header((TRACE_ID_HEADER, id.clone()));
        }
        builder.json(body)
    }
}
