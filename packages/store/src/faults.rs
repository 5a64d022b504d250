use atelier_common::EditorError;
use std::collections::BTreeMap;

/// A failure the store should produce instead of answering normally
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// The request never completed
    Network(String),
    /// The store answered with a non-success status and this body
    Api { status: u16, body: String },
    /// Upload succeeded at the transport level but returned no media
    EmptyMedia,
}

impl Fault {
    pub fn api(status: u16, message: &str) -> Self {
        Fault::Api {
            status,
            body: serde_json::json!({ "message": message }).to_string(),
        }
    }

    pub fn into_error(self) -> EditorError {
        match self {
            Fault::Network(detail) => EditorError::network(detail),
            Fault::Api { status, body } => EditorError::from_api_response(status, &body),
            Fault::EmptyMedia => EditorError::integrity("empty media response"),
        }
    }
}

/// Faults keyed by operation and 1-based call number
#[derive(Debug, Default)]
pub struct FaultPlan {
    uploads: BTreeMap<usize, Fault>,
    creates: BTreeMap<usize, Fault>,
    updates: BTreeMap<usize, Fault>,
}

impl FaultPlan {
    pub fn fail_upload(&mut self, call: usize, fault: Fault) {
        self.uploads.insert(call, fault);
    }

    pub fn fail_create(&mut self, call: usize, fault: Fault) {
        self.creates.insert(call, fault);
    }

    pub fn fail_update(&mut self, call: usize, fault: Fault) {
        self.updates.insert(call, fault);
    }

    pub(crate) fn take_upload(&mut self, call: usize) -> Option<Fault> {
        self.uploads.remove(&call)
    }

    pub(crate) fn take_create(&mut self, call: usize) -> Option<Fault> {
        self.creates.remove(&call)
    }

    pub(crate) fn take_update(&mut self, call: usize) -> Option<Fault> {
        self.updates.remove(&call)
    }
}
