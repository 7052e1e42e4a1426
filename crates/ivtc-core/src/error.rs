//! Error types shared by the project model and the script emitter.

use thiserror::Error;

/// Main error type for project operations.
///
/// Every edit operation fails fast and atomically: when one of these is
/// returned, the project state is unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectError {
    #[error("{0} is out of range")]
    OutOfRange(String),

    #[error("no section starts at frame {0}")]
    NoSuchSection(i32),

    #[error("no preset named '{0}'")]
    NoSuchPreset(String),

    #[error("no range starts at frame {0}")]
    NoSuchRange(i32),

    #[error("no custom list named '{0}'")]
    NoSuchCustomList(String),

    #[error("no bookmark at frame {0}")]
    NoSuchBookmark(i32),

    #[error("the name '{0}' is already in use")]
    NameInUse(String),

    #[error("invalid name '{0}': use only letters, numbers, and the underscore character; the first character cannot be a number")]
    InvalidName(String),

    #[error("'{0}' is not a valid match character")]
    InvalidMatchChar(char),

    #[error("range ({first},{last}) overlaps range ({other_first},{other_last})")]
    Overlap {
        first: i32,
        last: i32,
        other_first: i32,
        other_last: i32,
    },

    #[error("custom list '{0}' has no preset assigned")]
    MissingPreset(String),

    #[error("project document error: {0}")]
    Parse(String),

    #[error("the project has no {0}")]
    MissingMetrics(&'static str),
}

/// Result type alias for project operations.
pub type Result<T> = std::result::Result<T, ProjectError>;
