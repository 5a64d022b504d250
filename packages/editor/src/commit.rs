//! # Commit Controller
//!
//! Turns the draft into store requests and enforces pre-commit policy.
//!
//! ## Policy
//!
//! - Publishing needs the schema's publish fields and a cover image
//! - Taking a homepage slot needs the publish fields, the slot fields, a
//!   cover image, and a published record
//! - Both checks run before any network call
//! - A record holding a slot is never unpublished or removed directly; the
//!   caller gets [`CommitOutcome::EvictionRequired`] and must evict first
//! - Once a non-origin translation exists the record is translation-locked;
//!   a 409 from the store or translator forces the same lock
//!
//! ## Atomicity
//!
//! Field data is committed all-or-nothing: the draft is only touched after the
//! store answered successfully.
//!
//! ## Bootstrap
//!
//! A brand-new record gets its id from exactly one implicit create. Concurrent
//! callers share the same in-flight request through a memoized future.

use crate::collaborators::{ContentStore, StoreEntity, StoredRecord, TranslationRequest, Translator};
use crate::draft::{DraftRecord, FieldValue, HomepageSlot, RecordId, RecordStatus};
use crate::schema::RecordSchema;
use atelier_common::{EditorError, EditorResult};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard};

type CreateFuture = Shared<BoxFuture<'static, EditorResult<StoredRecord>>>;

enum BootstrapState {
    Idle,
    InFlight(CreateFuture),
    Done(RecordId),
}

/// Result of asking for a persisted id
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    /// The record already had an id; nothing was sent
    Existing(RecordId),
    /// The implicit create ran (possibly on behalf of another caller)
    Created(StoredRecord),
}

impl BootstrapOutcome {
    pub fn id(&self) -> &RecordId {
        match self {
            BootstrapOutcome::Existing(id) => id,
            BootstrapOutcome::Created(record) => &record.id,
        }
    }
}

/// Memoizes the one implicit create of a new record
#[derive(Clone)]
pub struct Bootstrapper {
    state: Arc<Mutex<BootstrapState>>,
}

impl Default for Bootstrapper {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(BootstrapState::Idle)),
        }
    }
}

impl Bootstrapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bootstrapper for a record that already exists in the store
    pub fn persisted(id: RecordId) -> Self {
        Self {
            state: Arc::new(Mutex::new(BootstrapState::Done(id))),
        }
    }

    fn state(&self) -> MutexGuard<'_, BootstrapState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the persisted id, issuing the create if none is known or in
    /// flight. `entity` is only evaluated when a create is actually sent.
    pub async fn ensure<F>(
        &self,
        store: &Arc<dyn ContentStore>,
        entity: F,
    ) -> EditorResult<BootstrapOutcome>
    where
        F: FnOnce() -> StoreEntity,
    {
        let create = {
            let mut state = self.state();
            let joined = match &*state {
                BootstrapState::Done(id) => return Ok(BootstrapOutcome::Existing(id.clone())),
                BootstrapState::InFlight(create) => Some(create.clone()),
                BootstrapState::Idle => None,
            };
            match joined {
                Some(create) => {
                    tracing::debug!("joining in-flight bootstrap create");
                    create
                }
                None => {
                    let store = Arc::clone(store);
                    let entity = entity();
                    tracing::info!(kind = ?entity.kind, "bootstrapping record");
                    let create = async move { store.create(entity).await }.boxed().shared();
                    *state = BootstrapState::InFlight(create.clone());
                    create
                }
            }
        };

        let result = create.await;
        self.settle(&result);
        result.map(BootstrapOutcome::Created)
    }

    /// Wait for an in-flight create, if any, and report the known id
    pub async fn settled(&self) -> EditorResult<Option<RecordId>> {
        let create = match &*self.state() {
            BootstrapState::Idle => return Ok(None),
            BootstrapState::Done(id) => return Ok(Some(id.clone())),
            BootstrapState::InFlight(create) => create.clone(),
        };
        let result = create.await;
        self.settle(&result);
        result.map(|record| Some(record.id))
    }

    /// Record an id obtained outside the bootstrap path (explicit save)
    pub fn mark_persisted(&self, id: RecordId) {
        *self.state() = BootstrapState::Done(id);
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(&*self.state(), BootstrapState::InFlight(_))
    }

    fn settle(&self, result: &EditorResult<StoredRecord>) {
        let mut state = self.state();
        match result {
            Ok(record) => *state = BootstrapState::Done(record.id.clone()),
            // A failed create may be retried by the next trigger
            Err(e) => {
                if matches!(&*state, BootstrapState::InFlight(_)) {
                    tracing::warn!("bootstrap create failed: {}", e);
                    *state = BootstrapState::Idle;
                }
            }
        }
    }
}

/// Outcome of an operation that a homepage slot may block
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome<T> {
    Done(T),
    /// The record holds `slot`; it must be evicted before this can proceed
    EvictionRequired { slot: HomepageSlot },
}

impl<T> CommitOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, CommitOutcome::Done(_))
    }
}

/// What a successful persist returned
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReceipt {
    pub id: RecordId,
    pub slug: Option<String>,
    pub status: RecordStatus,
    pub created: bool,
}

pub struct CommitController {
    store: Arc<dyn ContentStore>,
    translator: Option<Arc<dyn Translator>>,
    schema: RecordSchema,
    origin_locale: String,
    bootstrap: Bootstrapper,
}

impl CommitController {
    pub fn new(
        store: Arc<dyn ContentStore>,
        translator: Option<Arc<dyn Translator>>,
        schema: RecordSchema,
        origin_locale: impl Into<String>,
    ) -> Self {
        Self {
            store,
            translator,
            schema,
            origin_locale: origin_locale.into(),
            bootstrap: Bootstrapper::new(),
        }
    }

    /// Share an existing bootstrapper (e.g. primed with a hydrated id)
    pub fn with_bootstrapper(mut self, bootstrap: Bootstrapper) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn bootstrapper(&self) -> &Bootstrapper {
        &self.bootstrap
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Publishing requires the schema's publish fields and a cover
    pub fn check_publish(&self, draft: &DraftRecord) -> EditorResult<()> {
        self.check_required(draft, self.schema.required_for_publish, "publishing")
    }

    /// Homepage slots require the publish and slot fields, a cover, and a
    /// published record
    pub fn check_slot(&self, draft: &DraftRecord) -> EditorResult<()> {
        if !self.schema.supports_homepage_slots() {
            return Err(EditorError::validation(format!(
                "{:?} records cannot be placed on the homepage",
                self.schema.kind
            )));
        }
        let required = self.schema.slot_requirements();
        self.check_required(draft, &required, "featuring on the homepage")?;
        if draft.status != RecordStatus::Published {
            return Err(EditorError::validation(
                "Publish the record before featuring it on the homepage",
            ));
        }
        Ok(())
    }

    fn check_required(
        &self,
        draft: &DraftRecord,
        required: &[&'static str],
        action: &str,
    ) -> EditorResult<()> {
        let missing = self.schema.unmet_with_cover(draft, required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EditorError::validation(format!(
                "Missing {} before {}",
                missing.join(", "),
                action
            )))
        }
    }

    /// Obtain a persisted id, creating the record with placeholders if needed
    pub async fn ensure_persisted(&self, draft: &DraftRecord) -> EditorResult<BootstrapOutcome> {
        if let Some(id) = &draft.persisted_id {
            return Ok(BootstrapOutcome::Existing(id.clone()));
        }
        let schema = &self.schema;
        self.bootstrap
            .ensure(&self.store, || {
                StoreEntity::from_draft(&schema.with_placeholders(draft), RecordStatus::Draft)
            })
            .await
    }

    /// Validate, serialize, create-or-update, and merge the store's answer.
    pub async fn persist(
        &self,
        draft: &mut DraftRecord,
        status_override: Option<RecordStatus>,
    ) -> EditorResult<CommitOutcome<CommitReceipt>> {
        let target = status_override.unwrap_or(draft.status);

        match target {
            RecordStatus::Published => self.check_publish(draft)?,
            RecordStatus::Draft => {
                let missing = self.schema.missing(draft, self.schema.required_for_draft);
                if !missing.is_empty() {
                    return Err(EditorError::validation(format!(
                        "Missing {} before saving",
                        missing.join(", ").replace('_', " ")
                    )));
                }
                if draft.status == RecordStatus::Published {
                    if let Some(slot) = draft.homepage_slot {
                        return Ok(CommitOutcome::EvictionRequired { slot });
                    }
                }
            }
        }

        let entity = StoreEntity::from_draft(draft, target);
        let known_id = match &draft.persisted_id {
            Some(id) => Some(id.clone()),
            None => self.bootstrap.settled().await?,
        };

        let created = known_id.is_none();
        let response = match &known_id {
            Some(id) => self.store.update(id, entity).await,
            None => self.store.create(entity).await,
        };

        let record = match response {
            Ok(record) => record,
            Err(e) => {
                if e.is_conflict() {
                    draft.translations_locked = true;
                }
                tracing::warn!(status = ?target, "commit failed: {}", e);
                return Err(e);
            }
        };

        if created {
            self.bootstrap.mark_persisted(record.id.clone());
        }

        let receipt = CommitReceipt {
            id: record.id.clone(),
            slug: record.slug.clone(),
            status: record.status,
            created,
        };
        record.merge_into(draft);

        tracing::info!(id = %receipt.id, status = ?receipt.status, created, "record committed");
        Ok(CommitOutcome::Done(receipt))
    }

    /// Narrow status change; unpublishing a slot holder requires eviction
    pub async fn set_status(
        &self,
        draft: &mut DraftRecord,
        status: RecordStatus,
    ) -> EditorResult<CommitOutcome<RecordStatus>> {
        let id = self.require_id(draft)?;
        match status {
            RecordStatus::Published => self.check_publish(draft)?,
            RecordStatus::Draft => {
                if let Some(slot) = draft.homepage_slot {
                    return Ok(CommitOutcome::EvictionRequired { slot });
                }
            }
        }

        let record = self.store.update_status(&id, status).await?;
        draft.status = record.status;
        tracing::info!(id = %id, status = ?record.status, "status updated");
        Ok(CommitOutcome::Done(record.status))
    }

    /// Assign the record to a homepage slot (evicting the previous holder at
    /// the store) or clear it with `None`
    pub async fn assign_slot(
        &self,
        draft: &mut DraftRecord,
        slot: Option<HomepageSlot>,
    ) -> EditorResult<Option<HomepageSlot>> {
        if slot.is_some() {
            self.check_slot(draft)?;
        }
        let id = self.require_id(draft)?;

        let record = self.store.update_homepage_slot(&id, slot).await?;
        draft.homepage_slot = record.homepage_slot;
        tracing::info!(id = %id, slot = ?record.homepage_slot, "homepage slot updated");
        Ok(record.homepage_slot)
    }

    pub async fn evict_from_slot(&self, draft: &mut DraftRecord) -> EditorResult<()> {
        self.assign_slot(draft, None).await.map(|_| ())
    }

    /// Delete the record; a slot holder must be evicted first
    pub async fn delete(&self, draft: &DraftRecord) -> EditorResult<CommitOutcome<()>> {
        if let Some(slot) = draft.homepage_slot {
            return Ok(CommitOutcome::EvictionRequired { slot });
        }
        let id = self.require_id(draft)?;
        self.store.delete(&id).await?;
        tracing::info!(id = %id, "record deleted");
        Ok(CommitOutcome::Done(()))
    }

    /// Ask the translation collaborator for non-origin copies.
    ///
    /// Returns the locales merged into the draft.
    pub async fn request_translation(&self, draft: &mut DraftRecord) -> EditorResult<Vec<String>> {
        if draft.translations_locked {
            return Err(EditorError::Conflict(
                "Translations are locked for this record".to_string(),
            ));
        }
        let translator = self
            .translator
            .as_ref()
            .ok_or_else(|| EditorError::validation("No translation service is configured"))?;

        let title = draft.text("title").unwrap_or_default().trim().to_string();
        if title.is_empty() {
            return Err(EditorError::validation("Missing title before translating"));
        }
        let request = TranslationRequest {
            source_locale: self.origin_locale.clone(),
            title,
            description: draft.text("description").unwrap_or_default().to_string(),
            tags: match draft.field("tags") {
                Some(FieldValue::Tags(tags)) => tags.clone(),
                _ => Vec::new(),
            },
        };

        let translations = match translator.translate(request).await {
            Ok(translations) => translations,
            Err(e) if e.is_conflict() => {
                draft.translations_locked = true;
                tracing::info!("translator reported record already translated; locking");
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let mut merged = Vec::new();
        for (locale, translation) in translations {
            if locale.eq_ignore_ascii_case(&self.origin_locale) {
                continue;
            }
            draft.translations.insert(locale.clone(), translation);
            merged.push(locale);
        }
        if !merged.is_empty() {
            draft.translations_locked = true;
            tracing::info!(locales = ?merged, "translations merged; record locked");
        }
        Ok(merged)
    }

    fn require_id(&self, draft: &DraftRecord) -> EditorResult<RecordId> {
        draft
            .persisted_id
            .clone()
            .ok_or_else(|| EditorError::validation("Save the record first"))
    }
}
