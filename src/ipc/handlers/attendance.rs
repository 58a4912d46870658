use chrono::Datelike;
use rusqlite::Connection;
use serde_json::json;

use crate::dates::{self, Clock};
use crate::engine::{self, MarkEntry};
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{get_bool, get_optional_u32, get_required_str, resolve_date, with_db};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceStatus, BatchOutcome};

const RECENT_DATES_DEFAULT: u32 = 30;
/// Longest rolling window `attendance.calendar` lays out, today included.
const CALENDAR_MAX_DAYS: u64 = 366;

fn parse_status(v: Option<&serde_json::Value>) -> Result<AttendanceStatus, HandlerErr> {
    let Some(s) = v.and_then(|v| v.as_str()) else {
        return Err(HandlerErr::bad_params("missing status"));
    };
    AttendanceStatus::parse(s).ok_or_else(|| HandlerErr {
        code: "bad_params",
        message: format!("unknown status '{}'", s),
        details: Some(json!({ "allowed": ["present", "absent", "on_duty"] })),
    })
}

fn batch_json(date: &str, outcome: BatchOutcome) -> serde_json::Value {
    json!({
        "date": date,
        "applied": outcome.applied,
        "complete": outcome.is_complete(),
        "failed": outcome.failed
    })
}

/// Today's view: every active student with their mark (or null) for the date.
fn attendance_day(
    conn: &Connection,
    clock: &dyn Clock,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = resolve_date(params, clock)?;
    let rows = engine::roster_for_date(conn, &date)?;
    Ok(json!({
        "date": date,
        "isToday": dates::is_today(clock, &date),
        "label": dates::relative_label(clock, &date),
        "display": dates::format_for_display(&date),
        "shortDisplay": dates::format_for_short_display(&date),
        "weekday": dates::weekday_name(&date),
        "rows": rows
    }))
}

/// Dates to lay out: a rolling window when `daysBack`/`daysAhead` is given, otherwise a
/// calendar month (`year`/`month`, defaulting to the clock's month).
fn calendar_dates(
    clock: &dyn Clock,
    params: &serde_json::Value,
) -> Result<Vec<String>, HandlerErr> {
    let back = get_optional_u32(params, "daysBack")?;
    let ahead = get_optional_u32(params, "daysAhead")?;
    if back.is_some() || ahead.is_some() {
        let back = u64::from(back.unwrap_or(0));
        let ahead = u64::from(ahead.unwrap_or(0));
        if back + ahead + 1 > CALENDAR_MAX_DAYS {
            return Err(HandlerErr {
                code: "bad_params",
                message: format!("calendar window exceeds {} days", CALENDAR_MAX_DAYS),
                details: Some(json!({ "maxDays": CALENDAR_MAX_DAYS })),
            });
        }
        let start = dates::days_ago(clock, back)
            .ok_or_else(|| HandlerErr::bad_params("daysBack out of range"))?;
        let end = dates::days_from_now(clock, ahead)
            .ok_or_else(|| HandlerErr::bad_params("daysAhead out of range"))?;
        return Ok(dates::dates_between(&start, &end));
    }
    let today = clock.today();
    let year = match get_optional_u32(params, "year")? {
        Some(y) => i32::try_from(y).map_err(|_| HandlerErr::bad_params("year out of range"))?,
        None => today.year(),
    };
    let month = get_optional_u32(params, "month")?.unwrap_or(today.month());
    let days = dates::dates_in_month(year, month);
    if days.is_empty() {
        return Err(HandlerErr::bad_params(format!("invalid month {}-{}", year, month)));
    }
    Ok(days)
}

fn attendance_calendar(
    conn: &Connection,
    clock: &dyn Clock,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let days = calendar_dates(clock, params)?;
    let today = dates::today_string(clock);
    let mut out = Vec::with_capacity(days.len());
    for date in &days {
        let summary = engine::summary_for_date(conn, date)?;
        out.push(json!({
            "date": date,
            "dayMonth": dates::format_day_month(date),
            "weekday": dates::weekday_name(date),
            "isWeekend": dates::is_weekend(date),
            "isToday": dates::is_today(clock, date),
            "daysFromToday": dates::days_between(&today, date),
            "summary": summary
        }));
    }
    let heading = days.first().map(|d| dates::month_year(d)).unwrap_or_default();
    Ok(json!({ "month": heading, "days": out }))
}

fn attendance_mark(
    conn: &Connection,
    clock: &dyn Clock,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let status = parse_status(params.get("status"))?;
    let date = resolve_date(params, clock)?;
    let leave = get_bool(params, "leaveFormSubmitted");
    let mark = engine::mark_attendance(conn, &student_id, &date, status, leave)
        .map_err(HandlerErr::update)?;
    Ok(json!({ "mark": mark }))
}

fn attendance_mark_bulk(
    conn: &Connection,
    clock: &dyn Clock,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = resolve_date(params, clock)?;
    let Some(rows) = params.get("entries").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params("missing entries"));
    };
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        entries.push(MarkEntry {
            student_id: get_required_str(row, "studentId")?,
            status: parse_status(row.get("status"))?,
            leave_form_submitted: get_bool(row, "leaveFormSubmitted"),
        });
    }
    let outcome = engine::mark_bulk(conn, &date, &entries).map_err(HandlerErr::update)?;
    Ok(batch_json(&date, outcome))
}

fn attendance_mark_all_present(
    conn: &Connection,
    clock: &dyn Clock,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = resolve_date(params, clock)?;
    let outcome = engine::mark_all_present(conn, &date).map_err(HandlerErr::update)?;
    Ok(batch_json(&date, outcome))
}

fn attendance_history(
    conn: &Connection,
    _clock: &dyn Clock,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let marks = engine::student_history(conn, &student_id)?;
    Ok(json!({ "studentId": student_id, "marks": marks }))
}

fn attendance_summary(
    conn: &Connection,
    clock: &dyn Clock,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = resolve_date(params, clock)?;
    let summary = engine::summary_for_date(conn, &date)?;
    Ok(json!({ "summary": summary }))
}

fn attendance_recent_dates(
    conn: &Connection,
    _clock: &dyn Clock,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let limit = get_optional_u32(params, "limit")?.unwrap_or(RECENT_DATES_DEFAULT);
    let dates = engine::recent_dates(conn, limit)?;
    Ok(json!({ "dates": dates }))
}

/// Administrative correction; the date is required so a missing param never purges today.
fn attendance_delete_date(
    conn: &Connection,
    _clock: &dyn Clock,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = get_required_str(params, "date")?;
    let deleted = engine::delete_marks_for_date(conn, &date).map_err(HandlerErr::update)?;
    Ok(json!({ "deleted": deleted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    type Handler =
        fn(&Connection, &dyn Clock, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>;
    let handler: Handler = match req.method.as_str() {
        "attendance.day" => attendance_day,
        "attendance.calendar" => attendance_calendar,
        "attendance.mark" => attendance_mark,
        "attendance.markBulk" => attendance_mark_bulk,
        "attendance.markAllPresent" => attendance_mark_all_present,
        "attendance.history" => attendance_history,
        "attendance.summary" => attendance_summary,
        "attendance.recentDates" => attendance_recent_dates,
        "attendance.deleteDate" => attendance_delete_date,
        _ => return None,
    };
    Some(with_db(state, req, handler))
}
