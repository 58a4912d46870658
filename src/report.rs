//! Plain-text digests of a day's attendance, ready to hand to a messaging channel.

use std::fmt::Write as _;

use crate::calc;
use crate::dates;
use crate::model::{AttendanceReport, AttendanceSummary, StudentStatus};

pub const FOOTER: &str = "Generated by DailyTrack";

/// One-line verdict on the share of students present. Four bands, separate from the
/// per-student grade.
pub fn day_remark(present_percent: f64) -> &'static str {
    if present_percent >= 90.0 {
        "🎉 Excellent attendance today!"
    } else if present_percent >= 80.0 {
        "👍 Good attendance today!"
    } else if present_percent >= 70.0 {
        "⚠️ Average attendance today"
    } else {
        "🚨 Low attendance today - needs attention"
    }
}

fn present_percent(summary: &AttendanceSummary) -> f64 {
    calc::attendance_percentage(summary.total_students, summary.present_count)
}

fn student_line(out: &mut String, s: &StudentStatus) {
    let _ = writeln!(out, "• {} - {}", s.roll_no, s.name);
}

pub fn format_daily_report(report: &AttendanceReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📋 Daily Attendance Report");
    let _ = writeln!(out, "📅 Date: {}", dates::format_for_display(&report.date));
    let _ = writeln!(out, "📅 Day: {}", dates::weekday_name(&report.date));
    out.push('\n');

    if !report.absentees.is_empty() {
        let _ = writeln!(out, "❌ Absentees ({}):", report.absentees.len());
        let rolls: Vec<&str> = report.absentees.iter().map(|s| s.roll_no.as_str()).collect();
        out.push('\n');
        let _ = writeln!(out, "Roll numbers: {}", rolls.join(", "));
        out.push('\n');
    }

    if !report.od_students.is_empty() {
        let _ = writeln!(out, "📝 On Duty - OD ({}):", report.od_students.len());
        for s in &report.od_students {
            student_line(&mut out, s);
        }
        out.push('\n');
    }

    let s = &report.summary;
    let _ = writeln!(out, "📊 Summary:");
    let _ = writeln!(out, "👥 Total Students: {}", s.total_students);
    let _ = writeln!(out, "✅ Present: {}", s.present_count);
    let _ = writeln!(out, "❌ Absent: {}", s.absent_count);
    let _ = writeln!(out, "📝 On Duty: {}", s.od_count);
    let _ = writeln!(out, "📈 Class Average: {:.2}%", s.class_average);

    // No roster, no verdict.
    if s.total_students > 0 {
        let pct = present_percent(s);
        let _ = writeln!(out, "📊 Present Today: {:.1}%", pct);
        let _ = writeln!(out, "{}", day_remark(pct));
    }

    out.push('\n');
    let _ = writeln!(out, "{FOOTER}");
    out
}

pub fn format_quick_summary(summary: &AttendanceSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📊 Quick Attendance Summary");
    let _ = writeln!(out, "📅 {}", dates::format_for_display(&summary.date));
    let _ = writeln!(
        out,
        "✅ Present: {}/{}",
        summary.present_count, summary.total_students
    );
    let _ = writeln!(out, "📈 Percentage: {:.1}%", present_percent(summary));
    out
}

pub fn format_absentee_message(date: &str, absentees: &[StudentStatus]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "❌ Absentees Report");
    let _ = writeln!(out, "📅 Date: {}", dates::format_for_display(date));
    out.push('\n');
    if absentees.is_empty() {
        let _ = writeln!(out, "🎉 No absentees today! Perfect attendance!");
    } else {
        let _ = writeln!(out, "Total Absentees: {}", absentees.len());
        out.push('\n');
        for s in absentees {
            student_line(&mut out, s);
        }
    }
    out
}
