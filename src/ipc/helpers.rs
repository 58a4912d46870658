use rusqlite::Connection;

use super::error::{err, ok, HandlerErr};
use super::types::{AppState, Request};
use crate::dates::{self, Clock};

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Missing, null, and blank strings all read as `None`.
pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn get_bool(params: &serde_json::Value, key: &str) -> bool {
    params.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

pub fn get_optional_u32(params: &serde_json::Value, key: &str) -> Result<Option<u32>, HandlerErr> {
    let Some(v) = params.get(key) else {
        return Ok(None);
    };
    if v.is_null() {
        return Ok(None);
    }
    v.as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a non-negative integer", key)))
}

/// `params.date` if given, otherwise the clock's today. Always returned normalized.
pub fn resolve_date(params: &serde_json::Value, clock: &dyn Clock) -> Result<String, HandlerErr> {
    match get_optional_str(params, "date") {
        Some(raw) => Ok(dates::normalize_storage_date(&raw)?),
        None => Ok(dates::today_string(clock)),
    }
}

/// Runs `f` against the open workspace and wraps the result in a response envelope.
pub fn with_db<F>(state: &AppState, req: &Request, f: F) -> serde_json::Value
where
    F: FnOnce(&Connection, &dyn Clock, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
{
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(conn, state.clock.as_ref(), &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => {
            tracing::debug!(
                method = %req.method,
                code = error.code,
                message = %error.message,
                "request failed"
            );
            error.response(&req.id)
        }
    }
}
