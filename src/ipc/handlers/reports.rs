use std::path::PathBuf;

use serde_json::json;

use crate::engine;
use crate::ipc::error::err;
use crate::ipc::helpers::{get_required_str, resolve_date, with_db};
use crate::ipc::types::{AppState, Request};
use crate::report;
use crate::share::{FileSink, ReportSink};

fn handle_reports_daily(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_db(state, req, |conn, clock, params| {
        let date = resolve_date(params, clock)?;
        let report = engine::report_for_date(conn, &date)?;
        let text = report::format_daily_report(&report);
        Ok(json!({ "report": report, "text": text }))
    })
}

fn handle_reports_quick_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_db(state, req, |conn, clock, params| {
        let date = resolve_date(params, clock)?;
        let summary = engine::summary_for_date(conn, &date)?;
        Ok(json!({ "date": date, "text": report::format_quick_summary(&summary) }))
    })
}

fn handle_reports_absentees(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_db(state, req, |conn, clock, params| {
        let date = resolve_date(params, clock)?;
        let report = engine::report_for_date(conn, &date)?;
        Ok(json!({
            "date": date,
            "count": report.absentees.len(),
            "text": report::format_absentee_message(&date, &report.absentees)
        }))
    })
}

/// Formats the daily digest and hands it to a file sink. Delivery problems come back as
/// a `failed` outcome inside an ok response; only bad input is an error.
fn handle_reports_share(state: &mut AppState, req: &Request) -> serde_json::Value {
    let outbox = match (&state.outbox, &state.workspace) {
        (Some(dir), _) => dir.clone(),
        (None, Some(ws)) => ws.join("outbox"),
        (None, None) => {
            return err(&req.id, "no_workspace", "select a workspace first", None);
        }
    };
    with_db(state, req, |conn, clock, params| {
        let target = PathBuf::from(get_required_str(params, "target")?);
        let date = resolve_date(params, clock)?;
        let report = engine::report_for_date(conn, &date)?;
        let text = report::format_daily_report(&report);
        let sink = FileSink {
            target,
            outbox,
            fallback_name: format!("attendance-{}.txt", date),
        };
        let outcome = sink.deliver(&text);
        Ok(json!({ "date": date, "delivery": outcome }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.daily" => Some(handle_reports_daily(state, req)),
        "reports.quickSummary" => Some(handle_reports_quick_summary(state, req)),
        "reports.absentees" => Some(handle_reports_absentees(state, req)),
        "reports.share" => Some(handle_reports_share(state, req)),
        _ => None,
    }
}

