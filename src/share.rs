//! Hand-off of a formatted digest to whatever delivers it.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

/// The only thing callers learn about a delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ShareOutcome {
    Delivered { location: String },
    Fallback { location: String },
    Failed { reason: String },
}

pub trait ReportSink {
    fn deliver(&self, text: &str) -> ShareOutcome;
}

/// Writes to `target`; on failure writes into `outbox/<fallback_name>` instead.
#[derive(Debug, Clone)]
pub struct FileSink {
    pub target: PathBuf,
    pub outbox: PathBuf,
    pub fallback_name: String,
}

fn write_text(path: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, text)
}

impl ReportSink for FileSink {
    fn deliver(&self, text: &str) -> ShareOutcome {
        let primary_err = match write_text(&self.target, text) {
            Ok(()) => {
                info!(path = %self.target.display(), "report delivered");
                return ShareOutcome::Delivered {
                    location: self.target.to_string_lossy().to_string(),
                };
            }
            Err(e) => e,
        };
        warn!(path = %self.target.display(), error = %primary_err, "primary delivery failed");

        let fallback = self.outbox.join(&self.fallback_name);
        match write_text(&fallback, text) {
            Ok(()) => {
                info!(path = %fallback.display(), "report written to outbox");
                ShareOutcome::Fallback {
                    location: fallback.to_string_lossy().to_string(),
                }
            }
            Err(e) => ShareOutcome::Failed {
                reason: format!("{primary_err}; outbox: {e}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_to_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = FileSink {
            target: dir.path().join("out/report.txt"),
            outbox: dir.path().join("outbox"),
            fallback_name: "attendance-2024-01-10.txt".into(),
        };
        let outcome = sink.deliver("hello");
        assert!(matches!(outcome, ShareOutcome::Delivered { .. }));
        let written = std::fs::read_to_string(dir.path().join("out/report.txt")).expect("read");
        assert_eq!(written, "hello");
    }

    #[test]
    fn falls_back_to_outbox_when_target_is_unwritable() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory at the target path cannot be overwritten as a file.
        let blocked = dir.path().join("blocked");
        std::fs::create_dir_all(&blocked).expect("mkdir");
        let sink = FileSink {
            target: blocked,
            outbox: dir.path().join("outbox"),
            fallback_name: "attendance-2024-01-10.txt".into(),
        };
        let outcome = sink.deliver("hello");
        assert!(matches!(outcome, ShareOutcome::Fallback { .. }));
        assert!(dir.path().join("outbox/attendance-2024-01-10.txt").is_file());
    }

    #[test]
    fn reports_failure_when_both_paths_fail() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocked = dir.path().join("blocked");
        std::fs::create_dir_all(&blocked).expect("mkdir");
        let file_as_dir = dir.path().join("plain-file");
        std::fs::write(&file_as_dir, "x").expect("write");
        let sink = FileSink {
            target: blocked,
            outbox: file_as_dir,
            fallback_name: "attendance.txt".into(),
        };
        match sink.deliver("hello") {
            ShareOutcome::Failed { reason } => assert!(reason.contains("outbox")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
