//! # Preview Handles
//!
//! Local previews for selected files are scarce resources (object URLs in a
//! browser host). Every handle is created through the registry and released
//! exactly once: on successful merge, on user removal, or at session teardown.

use std::collections::BTreeSet;
use std::fmt;

/// Opaque handle to a local preview of a not-yet-uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreviewHandle(u64);

impl PreviewHandle {
    /// URL the host renders the preview from
    pub fn url(&self) -> String {
        format!("blob:atelier/preview-{}", self.0)
    }
}

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview-{}", self.0)
    }
}

/// Tracks outstanding preview handles for one session
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    next_id: u64,
    outstanding: BTreeSet<PreviewHandle>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> PreviewHandle {
        self.next_id += 1;
        let handle = PreviewHandle(self.next_id);
        self.outstanding.insert(handle);
        handle
    }

    /// Release a handle. Returns `false` if it was already released.
    pub fn release(&mut self, handle: PreviewHandle) -> bool {
        let released = self.outstanding.remove(&handle);
        if !released {
            tracing::debug!(%handle, "preview already released");
        }
        released
    }

    /// Release everything still outstanding (session teardown)
    pub fn release_all(&mut self) -> usize {
        let count = self.outstanding.len();
        self.outstanding.clear();
        if count > 0 {
            tracing::debug!(count, "released outstanding previews");
        }
        count
    }

    pub fn is_live(&self, handle: PreviewHandle) -> bool {
        self.outstanding.contains(&handle)
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }
}
