use rusqlite::Connection;
use serde_json::json;

use crate::analytics;
use crate::calc::AttendanceGrade;
use crate::engine;
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{get_optional_u32, get_required_str, with_db};
use crate::ipc::types::{AppState, Request};

const TOP_PERFORMERS_DEFAULT: u32 = 10;

fn analytics_student_stats(
    conn: &Connection,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let stats = engine::all_student_stats(conn)?;
    Ok(json!({ "students": stats }))
}

fn analytics_student(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let stats = engine::student_stats(conn, &student_id)?;
    Ok(json!({ "stats": stats }))
}

fn analytics_overview(
    conn: &Connection,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let stats = engine::all_student_stats(conn)?;
    Ok(json!({ "overview": analytics::overview(&stats) }))
}

fn analytics_by_grade(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let raw = get_required_str(params, "grade")?;
    let Some(grade) = AttendanceGrade::parse(&raw) else {
        return Err(HandlerErr::bad_params(format!("unknown grade '{}'", raw)));
    };
    let stats = engine::all_student_stats(conn)?;
    Ok(json!({
        "grade": grade,
        "displayName": grade.display_name(),
        "students": analytics::by_grade(&stats, grade)
    }))
}

fn analytics_needing_attention(
    conn: &Connection,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let stats = engine::all_student_stats(conn)?;
    Ok(json!({ "students": analytics::needing_attention(&stats) }))
}

fn analytics_top_performers(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let limit = get_optional_u32(params, "limit")?.unwrap_or(TOP_PERFORMERS_DEFAULT);
    let stats = engine::all_student_stats(conn)?;
    Ok(json!({ "students": analytics::top_performers(&stats, limit as usize) }))
}

fn analytics_at_risk(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let Some(upcoming) = get_optional_u32(params, "upcomingClasses")? else {
        return Err(HandlerErr::bad_params("missing upcomingClasses"));
    };
    let stats = engine::all_student_stats(conn)?;
    Ok(json!({
        "upcomingClasses": upcoming,
        "students": analytics::at_risk(&stats, upcoming)
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handler: fn(&Connection, &serde_json::Value) -> Result<serde_json::Value, HandlerErr> =
        match req.method.as_str() {
            "analytics.studentStats" => analytics_student_stats,
            "analytics.student" => analytics_student,
            "analytics.overview" => analytics_overview,
            "analytics.byGrade" => analytics_by_grade,
            "analytics.needingAttention" => analytics_needing_attention,
            "analytics.topPerformers" => analytics_top_performers,
            "analytics.atRisk" => analytics_at_risk,
            _ => return None,
        };
    Some(with_db(state, req, |conn, _clock, params| handler(conn, params)))
}
