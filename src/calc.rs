use serde::Serialize;

/// Eligibility cutoff, in percent.
pub const THRESHOLD_PERCENT: f64 = 75.0;

/// Lifetime class counts for one student. `attended` counts `Present` marks only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassCounts {
    pub total: u32,
    pub attended: u32,
}

impl ClassCounts {
    pub fn new(total: u32, attended: u32) -> Self {
        Self { total, attended }
    }

    pub fn percentage(&self) -> f64 {
        attendance_percentage(self.total, self.attended)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceGrade {
    Excellent,
    Good,
    Satisfactory,
    NeedsImprovement,
    Poor,
}

impl AttendanceGrade {
    pub const ALL: [AttendanceGrade; 5] = [
        AttendanceGrade::Excellent,
        AttendanceGrade::Good,
        AttendanceGrade::Satisfactory,
        AttendanceGrade::NeedsImprovement,
        AttendanceGrade::Poor,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            AttendanceGrade::Excellent => "Excellent",
            AttendanceGrade::Good => "Good",
            AttendanceGrade::Satisfactory => "Satisfactory",
            AttendanceGrade::NeedsImprovement => "Needs Improvement",
            AttendanceGrade::Poor => "Poor",
        }
    }

    pub fn color_hex(self) -> &'static str {
        match self {
            AttendanceGrade::Excellent => "#4CAF50",
            AttendanceGrade::Good => "#8BC34A",
            AttendanceGrade::Satisfactory => "#FFC107",
            AttendanceGrade::NeedsImprovement => "#FF9800",
            AttendanceGrade::Poor => "#F44336",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            AttendanceGrade::Excellent => "excellent",
            AttendanceGrade::Good => "good",
            AttendanceGrade::Satisfactory => "satisfactory",
            AttendanceGrade::NeedsImprovement => "needs_improvement",
            AttendanceGrade::Poor => "poor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let t = s.trim().to_ascii_lowercase();
        AttendanceGrade::ALL.into_iter().find(|g| g.key() == t)
    }
}

/// `attended / total * 100`, or 0 when no classes were held. Not rounded.
pub fn attendance_percentage(total: u32, attended: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (attended as f64 / total as f64) * 100.0
}

/// Mean of the individual percentages, not aggregate attended / aggregate total.
/// `[(20,20),(10,0)]` is 50, whereas 20/30 would be 66.7.
pub fn class_average(members: &[ClassCounts]) -> f64 {
    if members.is_empty() {
        return 0.0;
    }
    let sum: f64 = members.iter().map(ClassCounts::percentage).sum();
    sum / members.len() as f64
}

/// Minimal `x` with `(attended + x) / (total + x) >= 0.75`.
///
/// `ceil((0.75*total - attended) / 0.25)` reduces to `3*total - 4*attended`, which is exact
/// in integers.
pub fn classes_needed_for_75(attended: u32, total: u32) -> u32 {
    if total == 0 || attendance_percentage(total, attended) >= THRESHOLD_PERCENT {
        return 0;
    }
    let need = 3 * i64::from(total) - 4 * i64::from(attended);
    need.max(0) as u32
}

/// Maximal `x` with `attended / (total + x) >= 0.75`, i.e. `floor(attended/0.75 - total)`.
pub fn classes_can_miss_for_75(attended: u32, total: u32) -> u32 {
    if total == 0 || attended == 0 {
        return 0;
    }
    let max_total = (4 * i64::from(attended)) / 3;
    (max_total - i64::from(total)).max(0) as u32
}

/// Bands are closed on the lower bound and evaluated highest first.
pub fn attendance_grade(percent: f64) -> AttendanceGrade {
    if percent >= 90.0 {
        AttendanceGrade::Excellent
    } else if percent >= 80.0 {
        AttendanceGrade::Good
    } else if percent >= THRESHOLD_PERCENT {
        AttendanceGrade::Satisfactory
    } else if percent >= 60.0 {
        AttendanceGrade::NeedsImprovement
    } else {
        AttendanceGrade::Poor
    }
}

/// Projects `upcoming` more classes with no further attendance and checks whether the
/// percentage falls under the threshold.
pub fn is_at_risk_of_falling_below_75(attended: u32, total: u32, upcoming: u32) -> bool {
    if total == 0 {
        return false;
    }
    attendance_percentage(total.saturating_add(upcoming), attended) < THRESHOLD_PERCENT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_needed(attended: u32, total: u32) -> u32 {
        (0..10_000)
            .find(|x| 4 * (attended + x) >= 3 * (total + x))
            .expect("solution")
    }

    fn brute_force_can_miss(attended: u32, total: u32) -> u32 {
        (0..10_000)
            .take_while(|x| 4 * attended >= 3 * (total + x))
            .last()
            .unwrap_or(0)
    }

    #[test]
    fn percentage_bounds() {
        assert_eq!(attendance_percentage(0, 0), 0.0);
        assert_eq!(attendance_percentage(12, 12), 100.0);
        assert_eq!(attendance_percentage(20, 10), 50.0);
        for total in 1..40 {
            for attended in 0..=total {
                let p = attendance_percentage(total, attended);
                assert!((0.0..=100.0).contains(&p));
            }
        }
    }

    #[test]
    fn class_average_is_mean_of_percentages() {
        assert_eq!(class_average(&[]), 0.0);
        let even = [ClassCounts::new(10, 10), ClassCounts::new(10, 0)];
        assert_eq!(class_average(&even), 50.0);

        let skewed = [ClassCounts::new(20, 20), ClassCounts::new(10, 0)];
        assert_eq!(class_average(&skewed), 50.0);
        let aggregate = attendance_percentage(30, 20);
        assert!((aggregate - 66.666).abs() < 0.01);
        assert!((class_average(&skewed) - aggregate).abs() > 10.0);
    }

    #[test]
    fn needed_matches_examples() {
        assert_eq!(classes_needed_for_75(10, 20), 20);
        assert_eq!(classes_needed_for_75(0, 0), 0);
        assert_eq!(classes_needed_for_75(15, 20), 0);
        assert_eq!(classes_needed_for_75(0, 1), 3);
    }

    #[test]
    fn needed_is_minimal() {
        for total in 1..60 {
            for attended in 0..=total {
                let x = classes_needed_for_75(attended, total);
                assert_eq!(x, brute_force_needed(attended, total), "{attended}/{total}");
            }
        }
    }

    #[test]
    fn can_miss_matches_examples() {
        assert_eq!(classes_can_miss_for_75(15, 16), 4);
        assert_eq!(classes_can_miss_for_75(0, 10), 0);
        assert_eq!(classes_can_miss_for_75(5, 0), 0);
        assert_eq!(classes_can_miss_for_75(10, 20), 0);
    }

    #[test]
    fn can_miss_is_maximal() {
        for total in 1..60 {
            for attended in 1..=total {
                let x = classes_can_miss_for_75(attended, total);
                assert_eq!(x, brute_force_can_miss(attended, total), "{attended}/{total}");
            }
        }
    }

    #[test]
    fn grade_boundaries_are_exact() {
        assert_eq!(attendance_grade(100.0), AttendanceGrade::Excellent);
        assert_eq!(attendance_grade(90.0), AttendanceGrade::Excellent);
        assert_eq!(attendance_grade(89.999), AttendanceGrade::Good);
        assert_eq!(attendance_grade(80.0), AttendanceGrade::Good);
        assert_eq!(attendance_grade(75.0), AttendanceGrade::Satisfactory);
        assert_eq!(attendance_grade(74.999), AttendanceGrade::NeedsImprovement);
        assert_eq!(attendance_grade(60.0), AttendanceGrade::NeedsImprovement);
        assert_eq!(attendance_grade(59.9), AttendanceGrade::Poor);
        assert_eq!(attendance_grade(0.0), AttendanceGrade::Poor);
    }

    #[test]
    fn grade_keys_round_trip() {
        for g in AttendanceGrade::ALL {
            assert_eq!(AttendanceGrade::parse(g.key()), Some(g));
        }
        assert_eq!(
            AttendanceGrade::parse(" Needs_Improvement "),
            Some(AttendanceGrade::NeedsImprovement)
        );
        assert_eq!(AttendanceGrade::parse("great"), None);
    }

    #[test]
    fn risk_projection_keeps_attended_flat() {
        assert!(!is_at_risk_of_falling_below_75(0, 0, 10));
        // 16/20 = 80%; two more classes -> 16/22 = 72.7%
        assert!(is_at_risk_of_falling_below_75(16, 20, 2));
        // 16/21 = 76.2%
        assert!(!is_at_risk_of_falling_below_75(16, 20, 1));
        assert!(!is_at_risk_of_falling_below_75(15, 20, 0));
        assert!(is_at_risk_of_falling_below_75(14, 20, 0));
    }
}
