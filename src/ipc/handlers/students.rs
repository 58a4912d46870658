use rusqlite::Connection;
use serde_json::json;

use crate::engine;
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{get_bool, get_optional_str, get_required_str, with_db};
use crate::ipc::types::{AppState, Request};
use crate::store;

fn students_list(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let students = match get_optional_str(params, "query") {
        Some(q) => store::search_active_students(conn, &q)?,
        None => store::list_active_students(conn)?,
    };
    let active_count = store::active_student_count(conn)?;
    Ok(json!({ "students": students, "activeCount": active_count }))
}

/// Lookup by `studentId` or `rollNo`; a miss is `{"student": null}`.
fn students_get(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student = if let Some(id) = get_optional_str(params, "studentId") {
        store::student_by_id(conn, &id)?
    } else if let Some(roll) = get_optional_str(params, "rollNo") {
        store::active_student_by_roll_no(conn, &roll)?
    } else {
        return Err(HandlerErr::bad_params("missing studentId or rollNo"));
    };
    Ok(json!({ "student": student }))
}

fn students_create(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let roll_no = get_required_str(params, "rollNo")?;
    let name = get_required_str(params, "name")?;
    let student = engine::add_student(conn, &roll_no, &name).map_err(HandlerErr::update)?;
    Ok(json!({ "student": student }))
}

fn students_update(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let roll_no = get_required_str(params, "rollNo")?;
    let name = get_required_str(params, "name")?;
    let student =
        engine::update_student(conn, &student_id, &roll_no, &name).map_err(HandlerErr::update)?;
    Ok(json!({ "student": student }))
}

fn students_delete(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    engine::deactivate_student(conn, &student_id).map_err(HandlerErr::update)?;
    Ok(json!({ "ok": true }))
}

fn students_roll_no_available(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let roll_no = get_required_str(params, "rollNo")?;
    let exclude = get_optional_str(params, "excludeStudentId");
    let available = engine::is_roll_no_available(conn, &roll_no, exclude.as_deref())?;
    Ok(json!({ "available": available }))
}

fn students_import_roster(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let Some(rows) = params.get("students").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params("missing students"));
    };
    let mut entries = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let roll_no = row.get("rollNo").and_then(|v| v.as_str());
        let name = row.get("name").and_then(|v| v.as_str());
        let (Some(roll_no), Some(name)) = (roll_no, name) else {
            return Err(HandlerErr {
                code: "bad_params",
                message: "each roster row needs rollNo and name".to_string(),
                details: Some(json!({ "index": i })),
            });
        };
        entries.push((roll_no.to_string(), name.to_string()));
    }
    let replace = get_bool(params, "replace");
    let outcome = engine::import_roster(conn, &entries, replace).map_err(HandlerErr::update)?;
    Ok(json!({
        "applied": outcome.applied,
        "failed": outcome.failed,
        "complete": outcome.is_complete()
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let run = |f: fn(&Connection, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>| {
        with_db(state, req, |conn, _clock, params| f(conn, params))
    };
    match req.method.as_str() {
        "students.list" => Some(run(students_list)),
        "students.get" => Some(run(students_get)),
        "students.create" => Some(run(students_create)),
        "students.update" => Some(run(students_update)),
        "students.delete" => Some(run(students_delete)),
        "students.rollNoAvailable" => Some(run(students_roll_no_available)),
        "students.importRoster" => Some(run(students_import_roster)),
        _ => None,
    }
}
