/// Error type for fallible tracking operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    /// Input rejected before touching storage (blank name, taken roll number, ...).
    #[error("{0}")]
    Validation(String),

    /// A mutation referenced a student id that does not exist.
    #[error("student not found: {student_id}")]
    StudentNotFound { student_id: String },

    /// A date string that is not a valid `YYYY-MM-DD` calendar date.
    #[error("invalid date '{input}', expected YYYY-MM-DD")]
    InvalidDate { input: String },

    /// Failure reported by the SQLite layer.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type TrackResult<T> = Result<T, TrackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_passed_through() {
        let e = TrackError::Validation("Roll number already exists".into());
        assert_eq!(e.to_string(), "Roll number already exists");
    }

    #[test]
    fn invalid_date_names_the_input() {
        let e = TrackError::InvalidDate {
            input: "2024-13-01".into(),
        };
        assert_eq!(
            e.to_string(),
            "invalid date '2024-13-01', expected YYYY-MM-DD"
        );
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<TrackError>();
    }
}
