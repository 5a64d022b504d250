use crate::error::EditorError;

/// Common Result type alias
pub type EditorResult<T> = Result<T, EditorError>;
