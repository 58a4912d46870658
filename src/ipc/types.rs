use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::dates::Clock;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub clock: Box<dyn Clock>,
    /// Overrides `<workspace>/outbox` for report delivery fallbacks.
    pub outbox: Option<PathBuf>,
}

impl AppState {
    pub fn new(clock: Box<dyn Clock>, outbox: Option<PathBuf>) -> Self {
        Self {
            workspace: None,
            db: None,
            clock,
            outbox,
        }
    }
}
