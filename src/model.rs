use serde::Serialize;

use crate::calc::AttendanceGrade;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub roll_no: String,
    pub name: String,
    pub active: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    OnDuty,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::OnDuty => "on_duty",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            "on_duty" | "od" => Some(AttendanceStatus::OnDuty),
            _ => None,
        }
    }
}

/// One mark per (student, date).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMark {
    pub id: String,
    pub student_id: String,
    pub date: String,
    pub status: AttendanceStatus,
    pub leave_form_submitted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Active student paired with their mark for one date, if any.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDay {
    pub student: Student,
    pub mark: Option<AttendanceMark>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub date: String,
    pub total_students: u32,
    pub present_count: u32,
    pub absent_count: u32,
    pub od_count: u32,
    pub class_average: f64,
}

impl AttendanceSummary {
    pub fn empty(date: &str) -> Self {
        Self {
            date: date.to_string(),
            total_students: 0,
            present_count: 0,
            absent_count: 0,
            od_count: 0,
            class_average: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    pub student_id: String,
    pub student_name: String,
    pub roll_no: String,
    pub total_classes: u32,
    pub attended_classes: u32,
    pub attendance_percentage: f64,
    pub classes_needed_for_75_percent: u32,
    pub classes_can_miss_for_75_percent: u32,
    pub grade: AttendanceGrade,
}

/// Report line for an absentee or on-duty student.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStatus {
    pub student_id: String,
    pub roll_no: String,
    pub name: String,
    pub status: AttendanceStatus,
    pub leave_form_submitted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReport {
    pub date: String,
    pub summary: AttendanceSummary,
    pub absentees: Vec<StudentStatus>,
    pub od_students: Vec<StudentStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub key: String,
    pub message: String,
}

/// Result of a per-row batch: rows that went through plus the ones that did not.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub applied: usize,
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
