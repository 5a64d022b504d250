//! # Media Selection and Chunking
//!
//! Validation and batching for files selected by the operator.
//!
//! ## Rules
//!
//! - Validation is all-or-nothing: one bad file rejects the whole selection,
//!   and the error names the first offender
//! - Chunks are packed in selection order; a new chunk starts when the next
//!   file would push the current one past `chunk_count_max` files or
//!   `chunk_byte_max` bytes
//! - Flattening the chunks gives back the input sequence unchanged

use crate::config::EditorConfig;
use crate::preview::PreviewHandle;
use atelier_common::EditorError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A file picked by the operator
#[derive(Debug, Clone, PartialEq)]
pub struct FileHandle {
    pub name: String,
    pub media_type: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub data: Bytes,
}

impl FileHandle {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        modified: DateTime<Utc>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: data.len() as u64,
            modified,
            data,
        }
    }

    /// Describe a file without loading its contents (planning only)
    pub fn from_metadata(
        name: impl Into<String>,
        media_type: impl Into<String>,
        size: u64,
        modified: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size,
            modified,
            data: Bytes::new(),
        }
    }

    /// Identity used by dirty tracking; never includes contents
    pub fn fingerprint(&self) -> FileFingerprint {
        FileFingerprint {
            name: self.name.clone(),
            size: self.size,
            modified: self.modified.timestamp_millis(),
        }
    }
}

/// Name, size and modification time of a selected file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FileFingerprint {
    pub name: String,
    pub size: u64,
    pub modified: i64,
}

/// Session-local id of a pending upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub u64);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local-{}", self.0)
    }
}

/// A selected file that has not been merged into the draft yet
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpload {
    pub local_id: LocalId,
    pub collection: String,
    pub file: FileHandle,
    pub preview: PreviewHandle,
}

/// Anything the chunk planner can weigh
pub trait ChunkEntry {
    fn byte_len(&self) -> u64;
}

impl ChunkEntry for FileHandle {
    fn byte_len(&self) -> u64 {
        self.size
    }
}

impl ChunkEntry for PendingUpload {
    fn byte_len(&self) -> u64 {
        self.file.size
    }
}

/// Bounds applied to every chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLimits {
    pub count_max: usize,
    pub byte_max: u64,
}

impl From<&EditorConfig> for ChunkLimits {
    fn from(config: &EditorConfig) -> Self {
        Self {
            count_max: config.chunk_count_max,
            byte_max: config.chunk_byte_max,
        }
    }
}

/// One upload request worth of entries
#[derive(Debug, Clone, PartialEq)]
pub struct UploadChunk<T> {
    pub index: usize,
    pub entries: Vec<T>,
}

impl<T: ChunkEntry> UploadChunk<T> {
    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(ChunkEntry::byte_len).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Check every file before anything is sent.
pub fn validate_selection(files: &[FileHandle], config: &EditorConfig) -> Result<(), EditorError> {
    for file in files {
        if !config.allows_media_type(&file.media_type) {
            return Err(EditorError::validation(format!(
                "{}: unsupported file type '{}'",
                file.name, file.media_type
            )));
        }
        if file.size == 0 {
            return Err(EditorError::validation(format!("{}: file is empty", file.name)));
        }
        if file.size > config.max_file_bytes {
            return Err(EditorError::validation(format!(
                "{}: {} bytes exceeds the {} byte limit",
                file.name, file.size, config.max_file_bytes
            )));
        }
    }
    Ok(())
}

/// Pack entries into chunks, preserving order.
pub fn plan_chunks<T: ChunkEntry>(entries: Vec<T>, limits: ChunkLimits) -> Vec<UploadChunk<T>> {
    let mut chunks: Vec<UploadChunk<T>> = Vec::new();
    let mut current: Vec<T> = Vec::new();
    let mut current_bytes = 0u64;

    for entry in entries {
        let size = entry.byte_len();
        let over_count = current.len() + 1 > limits.count_max;
        let over_bytes = current_bytes.saturating_add(size) > limits.byte_max;

        if !current.is_empty() && (over_count || over_bytes) {
            chunks.push(UploadChunk {
                index: chunks.len(),
                entries: std::mem::take(&mut current),
            });
            current_bytes = 0;
        }

        current_bytes += size;
        current.push(entry);
    }

    if !current.is_empty() {
        chunks.push(UploadChunk {
            index: chunks.len(),
            entries: current,
        });
    }

    chunks
}
