use serde_json::json;

use crate::error::TrackError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    /// Same as `From<TrackError>` but storage failures are reported as failed writes.
    pub fn update(e: TrackError) -> Self {
        match e {
            TrackError::Storage(inner) => Self::new("db_update_failed", inner.to_string()),
            other => other.into(),
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<TrackError> for HandlerErr {
    fn from(e: TrackError) -> Self {
        match e {
            TrackError::Validation(m) => Self::new("validation_failed", m),
            TrackError::StudentNotFound { ref student_id } => Self {
                code: "not_found",
                message: e.to_string(),
                details: Some(json!({ "studentId": student_id })),
            },
            TrackError::InvalidDate { .. } => Self::new("bad_params", e.to_string()),
            TrackError::Storage(inner) => Self::new("db_query_failed", inner.to_string()),
        }
    }
}

impl From<rusqlite::Error> for HandlerErr {
    fn from(e: rusqlite::Error) -> Self {
        Self::new("db_query_failed", e.to_string())
    }
}
