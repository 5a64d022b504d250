use atelier_common::EditorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Editing session tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Media types accepted by the upload pipeline
    #[serde(default = "default_allowed_media_types")]
    pub allowed_media_types: Vec<String>,

    /// Largest single file accepted, in bytes
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Files per upload request
    #[serde(default = "default_chunk_count_max")]
    pub chunk_count_max: usize,

    /// Cumulative bytes per upload request
    #[serde(default = "default_chunk_byte_max")]
    pub chunk_byte_max: u64,

    /// Media items after the cover that carry the portfolio role
    #[serde(default = "default_portfolio_slots")]
    pub portfolio_slots: usize,

    /// How long the "completed" indicator stays visible
    #[serde(default = "default_completed_hold_ms")]
    pub completed_hold_ms: u64,

    /// Quiet period before a location facet lookup fires
    #[serde(default = "default_facet_debounce_ms")]
    pub facet_debounce_ms: u64,

    /// Locale the record is authored in
    #[serde(default = "default_origin_locale")]
    pub origin_locale: String,
}

fn default_allowed_media_types() -> Vec<String> {
    ["image/jpeg", "image/png", "image/webp", "image/avif"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_file_bytes() -> u64 {
    15 * 1024 * 1024
}

fn default_chunk_count_max() -> usize {
    4
}

fn default_chunk_byte_max() -> u64 {
    30 * 1024 * 1024
}

fn default_portfolio_slots() -> usize {
    3
}

fn default_completed_hold_ms() -> u64 {
    1200
}

fn default_facet_debounce_ms() -> u64 {
    300
}

fn default_origin_locale() -> String {
    "en".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            allowed_media_types: default_allowed_media_types(),
            max_file_bytes: default_max_file_bytes(),
            chunk_count_max: default_chunk_count_max(),
            chunk_byte_max: default_chunk_byte_max(),
            portfolio_slots: default_portfolio_slots(),
            completed_hold_ms: default_completed_hold_ms(),
            facet_debounce_ms: default_facet_debounce_ms(),
            origin_locale: default_origin_locale(),
        }
    }
}

impl EditorConfig {
    /// Reject limits the chunk planner cannot honor
    pub fn validate(&self) -> Result<(), EditorError> {
        if self.allowed_media_types.is_empty() {
            return Err(EditorError::validation("allowedMediaTypes must not be empty"));
        }
        if self.max_file_bytes == 0 || self.chunk_byte_max == 0 || self.chunk_count_max == 0 {
            return Err(EditorError::validation("upload limits must be greater than zero"));
        }
        if self.max_file_bytes > self.chunk_byte_max {
            return Err(EditorError::validation(format!(
                "maxFileBytes ({}) exceeds chunkByteMax ({})",
                self.max_file_bytes, self.chunk_byte_max
            )));
        }
        Ok(())
    }

    pub fn completed_hold(&self) -> Duration {
        Duration::from_millis(self.completed_hold_ms)
    }

    pub fn facet_debounce(&self) -> Duration {
        Duration::from_millis(self.facet_debounce_ms)
    }

    pub fn allows_media_type(&self, media_type: &str) -> bool {
        self.allowed_media_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(media_type))
    }
}
