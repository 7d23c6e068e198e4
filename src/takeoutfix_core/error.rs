use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TakeoutError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to {op} {path}: {source}")]
    FileOperation {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Filesystem errors
    #[error("Directory walker error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    // Metadata errors
    #[error("Exiftool error: {0}")]
    Exiftool(String),

    #[error("Date parsing error: {0}")]
    InvalidDateFormat(String),

    #[error("Metadata error for {path}: {reason}")]
    Metadata { path: PathBuf, reason: String },

    // Classification gate
    #[error("{} file(s) with unhandled types:\n{}", .0.len(), UnhandledList(.0))]
    Unhandled(Vec<PathBuf>),
}

impl TakeoutError {
    /// Attach the failing operation and path to an I/O error.
    pub fn file_op(
        op: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| TakeoutError::FileOperation { op, path, source }
    }
}

/// Newline-joined rendering of a path list.
pub struct UnhandledList<'a>(pub &'a [PathBuf]);

impl std::fmt::Display for UnhandledList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {}", path.display())?;
        }
        Ok(())
    }
}

/// Result type for takeoutfix operations.
pub type Result<T> = std::result::Result<T, TakeoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unhandled_message_lists_every_path() {
        let err = TakeoutError::Unhandled(vec![
            PathBuf::from("data/notes.txt"),
            PathBuf::from("data/a/b.psd"),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("2 file(s) with unhandled types:"));
        assert!(msg.contains("  data/notes.txt\n  data/a/b.psd"));
    }

    #[test]
    fn test_file_operation_names_op_and_path() {
        let make = TakeoutError::file_op("rename", "data/x.jpg");
        let err = make(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.to_string(), "Failed to rename data/x.jpg: gone");
    }
}
