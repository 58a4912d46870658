//! SQLite-backed persistence: students, marks, and the raw counts the engine aggregates.
//!
//! Every function is a single pull against the connection. Single-row writes are one
//! statement each, so they are atomic on their own.

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::calc::ClassCounts;
use crate::model::{AttendanceMark, AttendanceStatus, Student, StudentDay};

const STUDENT_COLS: &str = "s.id, s.roll_no, s.name, s.active, s.created_at";
const MARK_COLS: &str =
    "m.id, m.student_id, m.date, m.status, m.leave_form_submitted, m.created_at, m.updated_at";

#[derive(Debug, thiserror::Error)]
#[error("unknown attendance status '{0}'")]
struct UnknownStatus(String);

/// Raw per-date counts over the active roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayCounts {
    pub total: u32,
    pub present: u32,
    pub absent: u32,
    pub on_duty: u32,
}

/// Fields needed to write one mark.
#[derive(Debug, Clone)]
pub struct MarkWrite<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub date: &'a str,
    pub status: AttendanceStatus,
    pub leave_form_submitted: bool,
    pub now: i64,
}

fn student_at(r: &Row, offset: usize) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(offset)?,
        roll_no: r.get(offset + 1)?,
        name: r.get(offset + 2)?,
        active: r.get::<_, i64>(offset + 3)? != 0,
        created_at: r.get(offset + 4)?,
    })
}

fn mark_at(r: &Row, offset: usize) -> rusqlite::Result<AttendanceMark> {
    let status_raw: String = r.get(offset + 3)?;
    let status = AttendanceStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            offset + 3,
            Type::Text,
            Box::new(UnknownStatus(status_raw.clone())),
        )
    })?;
    Ok(AttendanceMark {
        id: r.get(offset)?,
        student_id: r.get(offset + 1)?,
        date: r.get(offset + 2)?,
        status,
        leave_form_submitted: r.get::<_, i64>(offset + 4)? != 0,
        created_at: r.get(offset + 5)?,
        updated_at: r.get(offset + 6)?,
    })
}

pub fn list_active_students(conn: &Connection) -> rusqlite::Result<Vec<Student>> {
    let sql = format!(
        "SELECT {STUDENT_COLS} FROM students s WHERE s.active = 1 ORDER BY s.roll_no ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |r| student_at(r, 0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Active students whose name contains `query` (SQLite `LIKE`, ASCII case-insensitive).
pub fn search_active_students(conn: &Connection, query: &str) -> rusqlite::Result<Vec<Student>> {
    let sql = format!(
        "SELECT {STUDENT_COLS} FROM students s
         WHERE s.active = 1 AND s.name LIKE '%' || ? || '%'
         ORDER BY s.roll_no ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([query], |r| student_at(r, 0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Any student, active or not.
pub fn student_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Student>> {
    let sql = format!("SELECT {STUDENT_COLS} FROM students s WHERE s.id = ?");
    conn.query_row(&sql, [id], |r| student_at(r, 0)).optional()
}

pub fn active_student_by_roll_no(
    conn: &Connection,
    roll_no: &str,
) -> rusqlite::Result<Option<Student>> {
    let sql = format!("SELECT {STUDENT_COLS} FROM students s WHERE s.roll_no = ? AND s.active = 1");
    conn.query_row(&sql, [roll_no], |r| student_at(r, 0)).optional()
}

pub fn active_student_count(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row("SELECT COUNT(*) FROM students WHERE active = 1", [], |r| {
        r.get(0)
    })
}

pub fn insert_student(conn: &Connection, student: &Student) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO students(id, roll_no, name, active, created_at) VALUES(?, ?, ?, ?, ?)",
        params![
            student.id,
            student.roll_no,
            student.name,
            student.active as i64,
            student.created_at
        ],
    )?;
    Ok(())
}

pub fn update_student_identity(
    conn: &Connection,
    id: &str,
    roll_no: &str,
    name: &str,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE students SET roll_no = ?, name = ? WHERE id = ?",
        (roll_no, name, id),
    )
}

pub fn deactivate_student(conn: &Connection, id: &str) -> rusqlite::Result<usize> {
    conn.execute("UPDATE students SET active = 0 WHERE id = ?", [id])
}

pub fn deactivate_all_students(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute("UPDATE students SET active = 0 WHERE active = 1", [])
}

pub fn mark_for(
    conn: &Connection,
    student_id: &str,
    date: &str,
) -> rusqlite::Result<Option<AttendanceMark>> {
    let sql = format!(
        "SELECT {MARK_COLS} FROM attendance_marks m WHERE m.student_id = ? AND m.date = ?"
    );
    conn.query_row(&sql, (student_id, date), |r| mark_at(r, 0)).optional()
}

pub fn marks_for_date(conn: &Connection, date: &str) -> rusqlite::Result<Vec<AttendanceMark>> {
    let sql = format!("SELECT {MARK_COLS} FROM attendance_marks m WHERE m.date = ?");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([date], |r| mark_at(r, 0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn marks_for_student(
    conn: &Connection,
    student_id: &str,
) -> rusqlite::Result<Vec<AttendanceMark>> {
    let sql = format!(
        "SELECT {MARK_COLS} FROM attendance_marks m WHERE m.student_id = ? ORDER BY m.date DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([student_id], |r| mark_at(r, 0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Insert, or update the existing row for (student, date) in place. The row keeps its id
/// and `created_at`; status, leave flag and `updated_at` are replaced.
pub fn upsert_mark(conn: &Connection, w: &MarkWrite<'_>) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO attendance_marks(
           id, student_id, date, status, leave_form_submitted, created_at, updated_at
         )
         VALUES(?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(student_id, date) DO UPDATE SET
           status = excluded.status,
           leave_form_submitted = excluded.leave_form_submitted,
           updated_at = excluded.updated_at",
        params![
            w.id,
            w.student_id,
            w.date,
            w.status.as_str(),
            w.leave_form_submitted as i64,
            w.now,
            w.now
        ],
    )?;
    Ok(())
}

pub fn delete_marks_for_date(conn: &Connection, date: &str) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM attendance_marks WHERE date = ?", [date])
}

/// Active roster left-joined with each student's mark on `date`, by roll number.
pub fn roster_for_date(conn: &Connection, date: &str) -> rusqlite::Result<Vec<StudentDay>> {
    let sql = format!(
        "SELECT {STUDENT_COLS}, {MARK_COLS}
         FROM students s
         LEFT JOIN attendance_marks m ON m.student_id = s.id AND m.date = ?
         WHERE s.active = 1
         ORDER BY s.roll_no ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([date], |r| {
            let student = student_at(r, 0)?;
            let mark_id: Option<String> = r.get(5)?;
            let mark = match mark_id {
                Some(_) => Some(mark_at(r, 5)?),
                None => None,
            };
            Ok(StudentDay { student, mark })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn counts_for_student(conn: &Connection, student_id: &str) -> rusqlite::Result<ClassCounts> {
    conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'present' THEN 1 ELSE 0 END), 0)
         FROM attendance_marks
         WHERE student_id = ?",
        [student_id],
        |r| Ok(ClassCounts::new(r.get(0)?, r.get(1)?)),
    )
}

/// Lifetime counts for every active student, including those with no marks (0/0).
pub fn counts_for_active_students(
    conn: &Connection,
) -> rusqlite::Result<Vec<(Student, ClassCounts)>> {
    let sql = format!(
        "SELECT {STUDENT_COLS},
                COUNT(m.id),
                COALESCE(SUM(CASE WHEN m.status = 'present' THEN 1 ELSE 0 END), 0)
         FROM students s
         LEFT JOIN attendance_marks m ON m.student_id = s.id
         WHERE s.active = 1
         GROUP BY s.id
         ORDER BY s.roll_no ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |r| {
            Ok((student_at(r, 0)?, ClassCounts::new(r.get(5)?, r.get(6)?)))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn day_counts(conn: &Connection, date: &str) -> rusqlite::Result<DayCounts> {
    conn.query_row(
        "SELECT COUNT(s.id),
                COALESCE(SUM(CASE WHEN m.status = 'present' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN m.status = 'absent' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN m.status = 'on_duty' THEN 1 ELSE 0 END), 0)
         FROM students s
         LEFT JOIN attendance_marks m ON m.student_id = s.id AND m.date = ?
         WHERE s.active = 1",
        [date],
        |r| {
            Ok(DayCounts {
                total: r.get(0)?,
                present: r.get(1)?,
                absent: r.get(2)?,
                on_duty: r.get(3)?,
            })
        },
    )
}

/// Distinct dates that carry at least one mark, newest first.
pub fn recent_dates(conn: &Connection, limit: u32) -> rusqlite::Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT date FROM attendance_marks ORDER BY date DESC LIMIT ?")?;
    let rows = stmt
        .query_map([limit], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
