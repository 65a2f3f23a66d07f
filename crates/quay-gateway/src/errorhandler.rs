use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use quay_hooks::{Code, Status};

use crate::agent::AgentError;

/*
INVALID_ARGUMENT - The client sent a value which could never be considered correct.
FAILED_PRECONDITION - Something is in a state making the request invalid, retrying _COULD_ help.
NOT_FOUND - More specific version of FAILED_PRECONDITION where the resource must exist, but does not.
ALREADY_EXISTS - More specific version of FAILED_PRECONDITION where the resource must not exist, but does.
RESOURCE_EXHAUSTED - A transient resource was exhausted (quotas, limits). Implies retriability.
CANCELLED - The client explicitly cancelled the operation.
INTERNAL - Any error the protocol cannot provide parseable details for.
UNAVAILABLE - The resource cannot be reached right now.
DEADLINE_EXCEEDED - Timeout occurred while processing.
*/

/// Translates cluster agent failures into wire statuses.
pub struct ErrorHandler {
    pub debug: bool,
}

impl ErrorHandler {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn agent_error_to_status(&self, err: &AgentError) -> Status {
        let status = match err {
            AgentError::BucketNotFound(name) => {
                Status::new(Code::NotFound, format!("Bucket '{name}' was not found."))
                    .with_detail(resource_detail("bucket", name))
            }
            AgentError::BucketExists(name) => {
                Status::new(Code::AlreadyExists, format!("Bucket '{name}' already exists."))
                    .with_detail(resource_detail("bucket", name))
            }
            AgentError::DocumentNotFound(key) => {
                Status::new(Code::NotFound, format!("Document '{key}' was not found."))
                    .with_detail(resource_detail("document", key))
            }
            AgentError::DocumentExists(key) => {
                Status::new(Code::AlreadyExists, format!("Document '{key}' already exists."))
                    .with_detail(resource_detail("document", key))
            }
            AgentError::Cancelled => Status::cancelled("request cancelled"),
            AgentError::Other(_) => Status::internal("An internal error occurred."),
        };

        self.try_attach_extra_context(status, err)
    }

    fn try_attach_extra_context(&self, status: Status, base_err: &AgentError) -> Status {
        if self.debug {
            status.with_detail(json!({"debug_info": {"detail": base_err.to_string()}}))
        } else {
            status
        }
    }
}

fn resource_detail(resource_type: &str, resource_name: &str) -> serde_json::Value {
    json!({
        "resource_info": {
            "resource_type": resource_type,
            "resource_name": resource_name,
        }
    })
}

/// The HTTP status the JSON surface uses for each RPC code.
pub fn http_status(code: Code) -> StatusCode {
    match code {
        Code::Ok => StatusCode::OK,
        Code::InvalidArgument | Code::FailedPrecondition | Code::OutOfRange => {
            StatusCode::BAD_REQUEST
        }
        Code::Unauthenticated => StatusCode::UNAUTHORIZED,
        Code::PermissionDenied => StatusCode::FORBIDDEN,
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::AlreadyExists | Code::Aborted => StatusCode::CONFLICT,
        Code::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
        // client-closed-request, per the usual transcoding convention
        Code::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Code::Unimplemented => StatusCode::NOT_IMPLEMENTED,
        Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        Code::Unknown | Code::Internal | Code::DataLoss => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A status flowing out of a handler, rendered as an HTTP response.
pub struct ApiError(pub Status);

impl From<Status> for ApiError {
    fn from(status: Status) -> Self {
        Self(status)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (http_status(self.0.code), Json(self.0)).into_response()
    }
}
