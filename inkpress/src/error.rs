use std::fmt;

/// Fatal save-time failures. None of these are retryable; a caller fixes the
/// misuse and runs a whole new save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// A mutation method was called on a full-save snapshot. Full saves write
    /// everything unconditionally, so there is nothing to mark.
    FullSnapshotMutation,
    /// The context has no root object recorded, so no trailer can be built.
    MissingRoot,
    /// The materialize pass produced a different byte count than the sizing
    /// pass predicted.
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::FullSnapshotMutation => {
                write!(f, "cannot mark objects on a full-save snapshot")
            }
            WriteError::MissingRoot => write!(f, "no root object set on the context"),
            WriteError::SizeMismatch { expected, actual } => {
                write!(f, "sizing pass predicted {expected} bytes, wrote {actual}")
            }
        }
    }
}

impl std::error::Error for WriteError {}
