use thiserror::Error;

/// Failure reported by a statistics persistence backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("statistics file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("statistics database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("statistics could not be encoded: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Stored statistics could not be read or moved aside, so they are never overwritten.
    #[error("stored statistics are unreadable; not saving over them")]
    Unreadable,
}

#[derive(Debug, Error)]
pub enum LessonError {
    /// No catalog entry for the requested lesson; callers redirect to the course list.
    #[error("lesson {id} not found")]
    NotFound { id: u32 },

    /// A practice step whose correct answer is not one of its options.
    #[error("lesson {lesson_id} step {} cannot be answered: correct answer missing from options", step_index + 1)]
    MalformedLessonData { lesson_id: u32, step_index: usize },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("lesson file {file} is invalid: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("lesson id {0} is defined more than once")]
    DuplicateId(u32),

    #[error("lesson {0} has no steps")]
    NoSteps(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_lesson_message_is_one_based() {
        let err = LessonError::MalformedLessonData {
            lesson_id: 7,
            step_index: 2,
        };
        assert_eq!(
            err.to_string(),
            "lesson 7 step 3 cannot be answered: correct answer missing from options"
        );
    }

    #[test]
    fn storage_error_wraps_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: LessonError = StorageError::from(io).into();
        assert!(matches!(err, LessonError::Storage(StorageError::Io(_))));
        assert!(err.to_string().contains("read-only"));
    }
}
