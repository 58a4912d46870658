//! Aggregation engine: roster joins, per-date summaries, lifetime statistics, daily report
//! assembly, and the write paths that keep one mark per (student, date).

use chrono::Utc;
use rusqlite::{Connection, ErrorCode};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calc;
use crate::dates::normalize_storage_date;
use crate::error::{TrackError, TrackResult};
use crate::model::{
    AttendanceMark, AttendanceReport, AttendanceStatus, AttendanceSummary, BatchFailure,
    BatchOutcome, Student, StudentDay, StudentStats, StudentStatus,
};
use crate::store::{self, MarkWrite};

pub const ROLL_NO_TAKEN: &str = "Roll number already exists";

/// One row of a bulk marking request.
#[derive(Debug, Clone)]
pub struct MarkEntry {
    pub student_id: String,
    pub status: AttendanceStatus,
    pub leave_form_submitted: bool,
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation
    )
}

fn validate_identity(roll_no: &str, name: &str) -> TrackResult<(String, String)> {
    let name = name.trim();
    let roll_no = roll_no.trim();
    if name.is_empty() {
        return Err(TrackError::Validation("Student name cannot be empty".into()));
    }
    if roll_no.is_empty() {
        return Err(TrackError::Validation("Roll number cannot be empty".into()));
    }
    Ok((roll_no.to_string(), name.to_string()))
}

pub fn add_student(conn: &Connection, roll_no: &str, name: &str) -> TrackResult<Student> {
    let (roll_no, name) = validate_identity(roll_no, name)?;
    if store::active_student_by_roll_no(conn, &roll_no)?.is_some() {
        return Err(TrackError::Validation(ROLL_NO_TAKEN.into()));
    }
    let student = Student {
        id: Uuid::new_v4().to_string(),
        roll_no,
        name,
        active: true,
        created_at: now_millis(),
    };
    store::insert_student(conn, &student).map_err(|e| {
        if is_unique_violation(&e) {
            TrackError::Validation(ROLL_NO_TAKEN.into())
        } else {
            TrackError::Storage(e)
        }
    })?;
    info!(student_id = %student.id, roll_no = %student.roll_no, "student added");
    Ok(student)
}

pub fn update_student(
    conn: &Connection,
    student_id: &str,
    roll_no: &str,
    name: &str,
) -> TrackResult<Student> {
    let (roll_no, name) = validate_identity(roll_no, name)?;
    let Some(existing) = store::student_by_id(conn, student_id)? else {
        return Err(TrackError::StudentNotFound {
            student_id: student_id.to_string(),
        });
    };
    if let Some(holder) = store::active_student_by_roll_no(conn, &roll_no)? {
        if holder.id != existing.id {
            return Err(TrackError::Validation(ROLL_NO_TAKEN.into()));
        }
    }
    store::update_student_identity(conn, student_id, &roll_no, &name).map_err(|e| {
        if is_unique_violation(&e) {
            TrackError::Validation(ROLL_NO_TAKEN.into())
        } else {
            TrackError::Storage(e)
        }
    })?;
    Ok(Student {
        roll_no,
        name,
        ..existing
    })
}

/// Soft delete. Marks stay in place and remain visible through history.
pub fn deactivate_student(conn: &Connection, student_id: &str) -> TrackResult<()> {
    if store::deactivate_student(conn, student_id)? == 0 {
        return Err(TrackError::StudentNotFound {
            student_id: student_id.to_string(),
        });
    }
    info!(student_id, "student deactivated");
    Ok(())
}

pub fn is_roll_no_available(
    conn: &Connection,
    roll_no: &str,
    exclude_student_id: Option<&str>,
) -> TrackResult<bool> {
    let holder = store::active_student_by_roll_no(conn, roll_no.trim())?;
    Ok(match holder {
        None => true,
        Some(s) => Some(s.id.as_str()) == exclude_student_id,
    })
}

/// Adds each `(roll_no, name)` pair. With `replace`, the current active roster is
/// deactivated first. Rejected rows are reported, not fatal.
pub fn import_roster(
    conn: &Connection,
    entries: &[(String, String)],
    replace: bool,
) -> TrackResult<BatchOutcome> {
    if replace {
        let n = store::deactivate_all_students(conn)?;
        info!(deactivated = n, "roster replaced");
    }
    let mut outcome = BatchOutcome::default();
    for (roll_no, name) in entries {
        match add_student(conn, roll_no, name) {
            Ok(_) => outcome.applied += 1,
            Err(e) => {
                warn!(roll_no = %roll_no, error = %e, "roster row rejected");
                outcome.failed.push(BatchFailure {
                    key: roll_no.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
    Ok(outcome)
}

/// Upsert one mark. The leave-form flag only survives on `Absent` marks.
pub fn mark_attendance(
    conn: &Connection,
    student_id: &str,
    date: &str,
    status: AttendanceStatus,
    leave_form_submitted: bool,
) -> TrackResult<AttendanceMark> {
    let date = normalize_storage_date(date)?;
    match store::student_by_id(conn, student_id)? {
        Some(s) if s.active => {}
        Some(_) => {
            return Err(TrackError::Validation(format!(
                "student {student_id} is not active"
            )))
        }
        None => {
            return Err(TrackError::StudentNotFound {
                student_id: student_id.to_string(),
            })
        }
    }
    let id = Uuid::new_v4().to_string();
    store::upsert_mark(
        conn,
        &MarkWrite {
            id: &id,
            student_id,
            date: &date,
            status,
            leave_form_submitted: leave_form_submitted && status == AttendanceStatus::Absent,
            now: now_millis(),
        },
    )?;
    debug!(student_id, date = %date, status = status.as_str(), "mark upserted");
    store::mark_for(conn, student_id, &date)?
        .ok_or(TrackError::Storage(rusqlite::Error::QueryReturnedNoRows))
}

/// Applies each entry as its own upsert. A failing row does not stop the batch; it is
/// listed in the outcome so the caller can retry.
pub fn mark_bulk(
    conn: &Connection,
    date: &str,
    entries: &[MarkEntry],
) -> TrackResult<BatchOutcome> {
    let date = normalize_storage_date(date)?;
    let mut outcome = BatchOutcome::default();
    for entry in entries {
        match mark_attendance(
            conn,
            &entry.student_id,
            &date,
            entry.status,
            entry.leave_form_submitted,
        ) {
            Ok(_) => outcome.applied += 1,
            Err(e) => {
                warn!(student_id = %entry.student_id, date = %date, error = %e, "bulk mark failed");
                outcome.failed.push(BatchFailure {
                    key: entry.student_id.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
    info!(
        date = %date,
        applied = outcome.applied,
        failed = outcome.failed.len(),
        "bulk marking finished"
    );
    Ok(outcome)
}

pub fn mark_all_present(conn: &Connection, date: &str) -> TrackResult<BatchOutcome> {
    let entries: Vec<MarkEntry> = store::list_active_students(conn)?
        .into_iter()
        .map(|s| MarkEntry {
            student_id: s.id,
            status: AttendanceStatus::Present,
            leave_form_submitted: false,
        })
        .collect();
    mark_bulk(conn, date, &entries)
}

pub fn roster_for_date(conn: &Connection, date: &str) -> TrackResult<Vec<StudentDay>> {
    let date = normalize_storage_date(date)?;
    Ok(store::roster_for_date(conn, &date)?)
}

/// All marks of one student, newest date first. Works for deactivated students too.
pub fn student_history(conn: &Connection, student_id: &str) -> TrackResult<Vec<AttendanceMark>> {
    Ok(store::marks_for_student(conn, student_id)?)
}

/// Counts over the active roster for one date. A date with no marks yields zero counts.
pub fn summary_for_date(conn: &Connection, date: &str) -> TrackResult<AttendanceSummary> {
    let date = normalize_storage_date(date)?;
    let c = store::day_counts(conn, &date)?;
    if c.total == 0 {
        return Ok(AttendanceSummary::empty(&date));
    }
    Ok(AttendanceSummary {
        class_average: calc::attendance_percentage(c.total, c.present),
        date,
        total_students: c.total,
        present_count: c.present,
        absent_count: c.absent,
        od_count: c.on_duty,
    })
}

fn stats_row(student: &Student, counts: calc::ClassCounts) -> StudentStats {
    let pct = counts.percentage();
    StudentStats {
        student_id: student.id.clone(),
        student_name: student.name.clone(),
        roll_no: student.roll_no.clone(),
        total_classes: counts.total,
        attended_classes: counts.attended,
        attendance_percentage: pct,
        classes_needed_for_75_percent: calc::classes_needed_for_75(counts.attended, counts.total),
        classes_can_miss_for_75_percent: calc::classes_can_miss_for_75(
            counts.attended,
            counts.total,
        ),
        grade: calc::attendance_grade(pct),
    }
}

/// One row per active student, by roll number.
pub fn all_student_stats(conn: &Connection) -> TrackResult<Vec<StudentStats>> {
    Ok(store::counts_for_active_students(conn)?
        .iter()
        .map(|(s, c)| stats_row(s, *c))
        .collect())
}

pub fn student_stats(conn: &Connection, student_id: &str) -> TrackResult<Option<StudentStats>> {
    let Some(student) = store::student_by_id(conn, student_id)? else {
        return Ok(None);
    };
    let counts = store::counts_for_student(conn, student_id)?;
    Ok(Some(stats_row(&student, counts)))
}

/// Summary plus absentees and on-duty students, each by roll number. Marks whose student
/// is missing or deactivated are dropped from the lists.
pub fn report_for_date(conn: &Connection, date: &str) -> TrackResult<AttendanceReport> {
    let date = normalize_storage_date(date)?;
    // Counts and lists are read inside one transaction so they come from the same snapshot.
    let tx = conn.unchecked_transaction()?;
    let summary = summary_for_date(&tx, &date)?;
    let mut absentees = Vec::new();
    let mut od_students = Vec::new();

    for mark in store::marks_for_date(&tx, &date)? {
        if mark.status == AttendanceStatus::Present {
            continue;
        }
        let student = match store::student_by_id(&tx, &mark.student_id)? {
            Some(s) if s.active => s,
            _ => {
                warn!(
                    student_id = %mark.student_id,
                    date = %date,
                    "skipping mark for unresolvable student"
                );
                continue;
            }
        };
        let line = StudentStatus {
            student_id: student.id,
            roll_no: student.roll_no,
            name: student.name,
            status: mark.status,
            leave_form_submitted: mark.leave_form_submitted,
        };
        match mark.status {
            AttendanceStatus::Absent => absentees.push(line),
            AttendanceStatus::OnDuty => od_students.push(line),
            AttendanceStatus::Present => {}
        }
    }
    tx.commit()?;
    absentees.sort_by(|a, b| a.roll_no.cmp(&b.roll_no));
    od_students.sort_by(|a, b| a.roll_no.cmp(&b.roll_no));

    Ok(AttendanceReport {
        date,
        summary,
        absentees,
        od_students,
    })
}

/// Administrative purge of every mark on one date.
pub fn delete_marks_for_date(conn: &Connection, date: &str) -> TrackResult<usize> {
    let date = normalize_storage_date(date)?;
    let n = store::delete_marks_for_date(conn, &date)?;
    warn!(date = %date, deleted = n, "marks purged for date");
    Ok(n)
}

pub fn recent_dates(conn: &Connection, limit: u32) -> TrackResult<Vec<String>> {
    Ok(store::recent_dates(conn, limit)?)
}
