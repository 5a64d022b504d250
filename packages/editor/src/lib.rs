//! # Atelier Editor
//!
//! Draft editing session for property listings, articles and marketing
//! projects.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ session: one operator, one record           │
//! │  - owns the draft and pending uploads       │
//! │  - routes inputs, uploads and commits       │
//! └─────────────────────────────────────────────┘
//!        ↓              ↓               ↓
//! ┌────────────┐ ┌──────────────┐ ┌──────────────┐
//! │ snapshot   │ │ pipeline     │ │ commit       │
//! │ dirty diff │ │ chunked      │ │ policy +     │
//! │            │ │ media upload │ │ bootstrap    │
//! └────────────┘ └──────────────┘ └──────────────┘
//!        ↓                               ↓
//! ┌────────────┐                 ┌──────────────┐
//! │ navigation │                 │ collaborators│
//! │ guard      │                 │ store, AI,   │
//! └────────────┘                 │ translation  │
//!                                └──────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Position is the only truth for roles**: the cover is whatever sits at
//!    order 0; nothing else is stored
//! 2. **Store authority**: after a successful commit the draft is replaced by
//!    what the store returned, plus any edit made while the commit was in
//!    flight
//! 3. **Partial media, atomic fields**: merged upload chunks survive a later
//!    failure; field data is committed all-or-nothing
//! 4. **Exactly one bootstrap**: a new record is created at most once no matter
//!    how many uploads race for an id
//! 5. **Never blocked**: an upload or commit in flight does not hold the
//!    session, so edits and navigation keep flowing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use atelier_editor::{Collaborators, EditSession, EditorConfig, FieldValue, RecordKind};
//!
//! let session = EditSession::new_record(
//!     RecordKind::Property,
//!     Collaborators::new(store, uploader),
//!     Box::new(host),
//!     EditorConfig::default(),
//! )?;
//!
//! session.set_field("title", FieldValue::text("Garden flat"));
//! session.add_files("photos", files).await?;
//! session.publish().await?;
//! ```

pub mod collaborators;
pub mod commit;
pub mod config;
pub mod draft;
pub mod facets;
pub mod media;
pub mod navigation;
pub mod pipeline;
pub mod preview;
pub mod reorder;
pub mod schema;
pub mod session;
pub mod snapshot;
pub mod suggestions;

pub use collaborators::{
    Collaborators, ContentParser, ContentStore, Facet, FacetLookup, MediaUploader, ParsedField,
    RemoteMedia, StoreEntity, StoredRecord, TranslationRequest, Translator,
};
pub use commit::{BootstrapOutcome, Bootstrapper, CommitController, CommitOutcome, CommitReceipt};
pub use config::EditorConfig;
pub use draft::{
    Collection, DraftRecord, FeatureRow, FieldValue, HomepageSlot, MediaItem, MediaRole, RecordId,
    RecordKind, RecordStatus, RemoteRef, Translation,
};
pub use facets::FacetResolver;
pub use media::{
    plan_chunks, validate_selection, ChunkLimits, FileFingerprint, FileHandle, LocalId,
    PendingUpload, UploadChunk,
};
pub use navigation::{
    Destination, GuardAction, GuardState, Interception, NavigationGuard, NavigationHost,
    NavigationIntent, PromptChoice,
};
pub use pipeline::{
    merge_chunk, MediaPipeline, MergeTarget, ProgressSignal, UploadProgress, UploadReport,
    UploadTarget,
};
pub use preview::{PreviewHandle, PreviewRegistry};
pub use reorder::CompositeId;
pub use schema::RecordSchema;
pub use session::{EditSession, NavigationOutcome};
pub use snapshot::{compute_snapshot, Snapshot, SnapshotDiffer};
pub use suggestions::FieldSuggestion;

// Re-export common types for convenience
pub use atelier_common::{EditorError, EditorResult};
