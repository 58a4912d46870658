use std::collections::BTreeMap;

use serde::Serialize;

use crate::calc::{self, AttendanceGrade, ClassCounts, THRESHOLD_PERCENT};
use crate::model::StudentStats;

/// Exclusive upper bound of the borderline band that starts at the threshold.
const BORDERLINE_CEILING: f64 = 80.0;
const TOP_PERFORMER_FLOOR: f64 = 90.0;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBucket {
    pub grade: AttendanceGrade,
    pub display_name: &'static str,
    pub color_hex: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_students: usize,
    pub class_average: f64,
    pub students_above_75_percent: usize,
    pub students_below_75_percent: usize,
    pub students_borderline: usize,
    pub grade_distribution: Vec<GradeBucket>,
}

pub fn overview(stats: &[StudentStats]) -> Overview {
    let counts: Vec<ClassCounts> = stats
        .iter()
        .map(|s| ClassCounts::new(s.total_classes, s.attended_classes))
        .collect();

    let mut by_grade: BTreeMap<AttendanceGrade, usize> = BTreeMap::new();
    for s in stats {
        *by_grade.entry(s.grade).or_default() += 1;
    }
    let grade_distribution = AttendanceGrade::ALL
        .into_iter()
        .map(|g| GradeBucket {
            grade: g,
            display_name: g.display_name(),
            color_hex: g.color_hex(),
            count: by_grade.get(&g).copied().unwrap_or(0),
        })
        .collect();

    let pct = |s: &&StudentStats| s.attendance_percentage;
    Overview {
        total_students: stats.len(),
        class_average: calc::class_average(&counts),
        students_above_75_percent: stats.iter().filter(|s| pct(s) >= THRESHOLD_PERCENT).count(),
        students_below_75_percent: stats.iter().filter(|s| pct(s) < THRESHOLD_PERCENT).count(),
        students_borderline: stats
            .iter()
            .filter(|s| (THRESHOLD_PERCENT..BORDERLINE_CEILING).contains(&pct(s)))
            .count(),
        grade_distribution,
    }
}

pub fn by_grade(stats: &[StudentStats], grade: AttendanceGrade) -> Vec<StudentStats> {
    stats.iter().filter(|s| s.grade == grade).cloned().collect()
}

/// Below the threshold, lowest percentage first.
pub fn needing_attention(stats: &[StudentStats]) -> Vec<StudentStats> {
    let mut out: Vec<StudentStats> = stats
        .iter()
        .filter(|s| s.attendance_percentage < THRESHOLD_PERCENT)
        .cloned()
        .collect();
    out.sort_by(|a, b| a.attendance_percentage.total_cmp(&b.attendance_percentage));
    out
}

pub fn top_performers(stats: &[StudentStats], limit: usize) -> Vec<StudentStats> {
    let mut out: Vec<StudentStats> = stats
        .iter()
        .filter(|s| s.attendance_percentage >= TOP_PERFORMER_FLOOR)
        .cloned()
        .collect();
    out.sort_by(|a, b| b.attendance_percentage.total_cmp(&a.attendance_percentage));
    out.truncate(limit);
    out
}

/// Students who would drop under the threshold if `upcoming` classes pass unattended.
pub fn at_risk(stats: &[StudentStats], upcoming: u32) -> Vec<StudentStats> {
    stats
        .iter()
        .filter(|s| {
            calc::is_at_risk_of_falling_below_75(s.attended_classes, s.total_classes, upcoming)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(roll: &str, total: u32, attended: u32) -> StudentStats {
        let pct = calc::attendance_percentage(total, attended);
        StudentStats {
            student_id: format!("id-{roll}"),
            student_name: format!("Student {roll}"),
            roll_no: roll.to_string(),
            total_classes: total,
            attended_classes: attended,
            attendance_percentage: pct,
            classes_needed_for_75_percent: calc::classes_needed_for_75(attended, total),
            classes_can_miss_for_75_percent: calc::classes_can_miss_for_75(attended, total),
            grade: calc::attendance_grade(pct),
        }
    }

    fn sample() -> Vec<StudentStats> {
        vec![
            row("A1", 20, 20), // 100
            row("A2", 10, 0),  // 0
            row("A3", 20, 15), // 75
            row("A4", 20, 13), // 65
            row("A5", 10, 9),  // 90
        ]
    }

    #[test]
    fn overview_uses_average_of_percentages() {
        let o = overview(&sample());
        assert_eq!(o.total_students, 5);
        assert!((o.class_average - 66.0).abs() < 1e-9);
        assert_eq!(o.students_above_75_percent, 3);
        assert_eq!(o.students_below_75_percent, 2);
        assert_eq!(o.students_borderline, 1);
        let counts: Vec<usize> = o.grade_distribution.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 0, 1, 1, 1]);
    }

    #[test]
    fn overview_of_empty_class() {
        let o = overview(&[]);
        assert_eq!(o.class_average, 0.0);
        assert_eq!(o.grade_distribution.len(), 5);
    }

    #[test]
    fn filters_and_orderings() {
        let s = sample();
        let low: Vec<String> = needing_attention(&s).into_iter().map(|r| r.roll_no).collect();
        assert_eq!(low, vec!["A2", "A4"]);

        let top = top_performers(&s, 10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].roll_no, "A1");
        assert_eq!(top_performers(&s, 1).len(), 1);

        let excellent = by_grade(&s, AttendanceGrade::Excellent);
        assert_eq!(excellent.len(), 2);
    }

    #[test]
    fn at_risk_projection() {
        let s = sample();
        let risky: Vec<String> = at_risk(&s, 2).into_iter().map(|r| r.roll_no).collect();
        // A3 15/22, A4 13/22, A2 0/12 fall under; A5 9/12 = 75 holds; A1 20/22 holds.
        assert_eq!(risky, vec!["A2", "A3", "A4"]);
    }
}
