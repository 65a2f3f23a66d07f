use serde::{Deserialize, Serialize};

/// Canonical RPC status codes, named the way the wire protocol names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Code {
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    // some older tooling still emits NOT_IMPLEMENTED for this code
    #[serde(alias = "NOT_IMPLEMENTED")]
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl Code {
    pub fn name(&self) -> &'static str {
        match self {
            Code::Ok => "OK",
            Code::Cancelled => "CANCELLED",
            Code::Unknown => "UNKNOWN",
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Code::NotFound => "NOT_FOUND",
            Code::AlreadyExists => "ALREADY_EXISTS",
            Code::PermissionDenied => "PERMISSION_DENIED",
            Code::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Code::FailedPrecondition => "FAILED_PRECONDITION",
            Code::Aborted => "ABORTED",
            Code::OutOfRange => "OUT_OF_RANGE",
            Code::Unimplemented => "UNIMPLEMENTED",
            Code::Internal => "INTERNAL",
            Code::Unavailable => "UNAVAILABLE",
            Code::DataLoss => "DATA_LOSS",
            Code::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

/// A status as surfaced across the gateway's RPC surface.
///
/// Synthesized by `ReturnError` actions and by the gateway's error
/// translation; carried through dispatch verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub code: Code,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<serde_json::Value>,
}

impl Status {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(Code::Cancelled, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    /// Attach a structured detail. Null details are dropped rather than
    /// failing the status itself.
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        if !detail.is_null() {
            self.details.push(detail);
        }
        self
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.name(), self.message)
    }
}

impl std::error::Error for Status {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_code_wire_names() {
        assert_eq!(serde_json::to_string(&Code::NotFound).unwrap(), r#""NOT_FOUND""#);
        assert_eq!(
            serde_json::from_str::<Code>(r#""RESOURCE_EXHAUSTED""#).unwrap(),
            Code::ResourceExhausted
        );
    }

    #[test]
    fn test_not_implemented_aliases_unimplemented() {
        assert_eq!(
            serde_json::from_str::<Code>(r#""NOT_IMPLEMENTED""#).unwrap(),
            Code::Unimplemented
        );
        assert_eq!(
            serde_json::from_str::<Code>(r#""UNIMPLEMENTED""#).unwrap(),
            Code::Unimplemented
        );
    }

    #[test]
    fn test_detail_attachment_is_best_effort() {
        let st = Status::not_found("document not found")
            .with_detail(json!({"resource_type": "document"}))
            .with_detail(serde_json::Value::Null);
        assert_eq!(st.details.len(), 1);
    }
}
