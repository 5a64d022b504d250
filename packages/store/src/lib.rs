//! # Atelier Store
//!
//! In-process content store, upload endpoint and translation service.
//!
//! [`MemoryStore`] implements the editor's collaborator traits with the same
//! business rules a remote store enforces: required fields per status,
//! exclusive homepage slots, the translation lock and slug assignment. It is
//! what the CLI and the scenario tests run against, and it can inject faults
//! on any call to exercise partial-failure paths.

mod error;
mod faults;
mod memory;
mod slug;
mod translate;

pub use error::StoreError;
pub use faults::{Fault, FaultPlan};
pub use memory::{CallCounts, MemoryStore};
pub use slug::slugify;
pub use translate::PrefixTranslator;
