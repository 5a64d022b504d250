/// End-to-end editing scenarios
/// Tests session → pipeline/commit → in-memory store flow
use atelier_editor::{
    CommitController, CommitOutcome, CompositeId, Destination, EditSession, EditorConfig,
    EditorError, FieldValue, FileHandle, HomepageSlot, Interception, MediaRole, NavigationHost,
    NavigationIntent, NavigationOutcome, PromptChoice, RecordId, RecordKind, RecordSchema,
    RecordStatus, StoredRecord,
};
use atelier_editor::Collaborators;
use atelier_store::{Fault, MemoryStore, PrefixTranslator};
use chrono::Utc;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct Browser {
    location: String,
    navigations: Vec<Destination>,
    pushes: Vec<String>,
    unload_prompt: bool,
}

#[derive(Clone, Default)]
struct TestHost(Rc<RefCell<Browser>>);

impl TestHost {
    fn at(location: &str) -> Self {
        let host = Self::default();
        host.0.borrow_mut().location = location.to_string();
        host
    }

    fn location(&self) -> String {
        self.0.borrow().location.clone()
    }

    fn navigations(&self) -> Vec<Destination> {
        self.0.borrow().navigations.clone()
    }
}

impl NavigationHost for TestHost {
    fn current_location(&self) -> String {
        self.0.borrow().location.clone()
    }

    fn push_location(&mut self, href: &str) {
        self.0.borrow_mut().pushes.push(href.to_string());
    }

    fn navigate(&mut self, destination: &Destination) {
        let mut browser = self.0.borrow_mut();
        if let Destination::Href(href) = destination {
            browser.location = href.clone();
        }
        browser.navigations.push(destination.clone());
    }

    fn set_unload_prompt(&mut self, enabled: bool) {
        self.0.borrow_mut().unload_prompt = enabled;
    }
}

fn config() -> EditorConfig {
    EditorConfig {
        completed_hold_ms: 0,
        facet_debounce_ms: 0,
        ..EditorConfig::default()
    }
}

fn collaborators(store: &Arc<MemoryStore>) -> Collaborators {
    Collaborators::new(store.clone(), store.clone())
}

fn new_session(store: &Arc<MemoryStore>, kind: RecordKind) -> (EditSession, TestHost) {
    let host = TestHost::at("/edit");
    let session =
        EditSession::new_record(kind, collaborators(store), Box::new(host.clone()), config())
            .expect("Failed to start session");
    (session, host)
}

fn photos(prefix: &str, count: usize) -> Vec<FileHandle> {
    (0..count)
        .map(|i| {
            FileHandle::new(
                format!("{}-{}.jpg", prefix, i),
                "image/jpeg",
                Utc::now(),
                vec![0xFFu8; 1024],
            )
        })
        .collect()
}

fn fill_listing(session: &EditSession) {
    session.set_field("title", FieldValue::text("Two bedroom flat near the harbor"));
    session.set_field("price", FieldValue::Integer(320_000));
    session.set_field("property_type", FieldValue::text("apartment"));
    session.set_field("sale_type", FieldValue::text("sale"));
}

#[tokio::test]
async fn test_second_chunk_failure_reports_partial_upload() {
    let store = Arc::new(MemoryStore::new());
    store
        .faults()
        .fail_upload(2, Fault::Network("connection reset".to_string()));
    let (session, _host) = new_session(&store, RecordKind::Property);

    let err = session
        .add_files("photos", photos("p", 10))
        .await
        .expect_err("second chunk should fail");

    assert_eq!(err.succeeded_count(), Some(4));
    assert!(err.to_string().starts_with("4 file(s) uploaded, 6 still pending"));
    assert!(err.banner().contains("fewer or smaller files"));
    assert_eq!(session.draft().media("photos").unwrap().len(), 4);
    assert_eq!(session.pending().len(), 6);
    assert_eq!(session.previews().outstanding(), 6);
    assert!(session.is_dirty());

    // Retry only sends what is still pending: [4, 2]
    let report = session.retry_pending("photos").await.expect("Retry failed");
    assert_eq!(report.chunks, 2);
    assert_eq!(report.merged.len(), 6);
    assert_eq!(store.calls().uploads, 4);

    let draft = session.draft();
    let merged = draft.media("photos").unwrap();
    assert_eq!(merged.len(), 10);
    let orders: Vec<usize> = merged.iter().map(|m| m.order).collect();
    assert_eq!(orders, (0..10).collect::<Vec<_>>());
    assert!(session.pending().is_empty());
    assert_eq!(session.previews().outstanding(), 0);
}

#[tokio::test]
async fn test_uploads_before_first_save_bootstrap_once() {
    let store = Arc::new(MemoryStore::new());
    let (session, _host) = new_session(&store, RecordKind::Property);

    session.add_files("photos", photos("a", 5)).await.expect("First batch failed");
    assert_eq!(store.calls().creates, 1);
    let id = session.draft().persisted_id.clone().expect("No id after bootstrap");

    session.add_files("photos", photos("b", 2)).await.expect("Second batch failed");
    assert_eq!(store.calls().creates, 1);
    assert_eq!(session.draft().persisted_id.as_ref(), Some(&id));
    assert_eq!(session.draft().media("photos").unwrap().len(), 7);

    // The bootstrap create carried placeholders; the draft did not
    let stored = store.record(&id).unwrap();
    assert_eq!(stored.fields["title"], FieldValue::text("Untitled draft"));
    assert!(session.draft().field("title").is_none());

    // Saving for real updates the bootstrapped record
    fill_listing(&session);
    session.save_draft().await.expect("Save failed");
    assert_eq!(store.calls().creates, 1);
    assert_eq!(store.calls().updates, 1);
    assert_eq!(store.record(&id).unwrap().media["photos"].len(), 7);
    assert_eq!(
        store.record(&id).unwrap().slug.as_deref(),
        Some("two-bedroom-flat-near-the-harbor")
    );
}

#[tokio::test(start_paused = true)]
async fn test_racing_bootstraps_share_one_create() {
    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(80)));
    let schema = RecordSchema::for_kind(RecordKind::Article);
    let controller = CommitController::new(store.clone(), None, schema.clone(), "en");
    let draft = schema.new_draft();

    let (a, b) = tokio::join!(
        controller.ensure_persisted(&draft),
        controller.ensure_persisted(&draft)
    );

    assert_eq!(a.unwrap().id(), b.unwrap().id());
    assert_eq!(store.calls().creates, 1);
}

#[tokio::test(start_paused = true)]
async fn test_operator_keeps_working_while_photos_upload() {
    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(500)));
    let (session, host) = new_session(&store, RecordKind::Property);

    let operator = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.set_field("title", FieldValue::text("Loft with a terrace"));
        let link = session.on_link_activation(NavigationIntent::link("/listings"));
        // Bootstrap ends at 500ms, the first chunk at 1000ms
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let merged = session.draft().media("photos").map_or(0, |m| m.len());
        (link, merged)
    };
    let (report, (link, merged)) =
        tokio::join!(session.add_files("photos", photos("t", 6)), operator);

    assert_eq!(link, Interception::Prompted);
    assert_eq!(merged, 4);
    assert_eq!(report.expect("Upload failed").merged.len(), 6);
    assert_eq!(store.calls().creates, 1);
    assert_eq!(session.draft().text("title"), Some("Loft with a terrace"));
    assert_eq!(host.location(), "/edit");

    let outcome = session.resolve_prompt(PromptChoice::Discard).await.unwrap();
    assert_eq!(
        outcome,
        NavigationOutcome::Navigated(Destination::Href("/listings".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_save_during_bootstrap_updates_the_created_record() {
    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(200)));
    let (session, _host) = new_session(&store, RecordKind::Property);
    fill_listing(&session);

    let (upload, saved) = tokio::join!(session.add_files("photos", photos("s", 2)), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.save_draft().await
    });

    upload.expect("Upload failed");
    assert!(saved.expect("Save failed").is_done());
    assert_eq!(store.calls().creates, 1);
    assert_eq!(store.records().len(), 1);
    assert_eq!(session.draft().media("photos").unwrap().len(), 2);
}

#[tokio::test]
async fn test_slot_without_cover_is_rejected_before_any_call() {
    let store = Arc::new(MemoryStore::new());
    let (session, _host) = new_session(&store, RecordKind::Property);
    fill_listing(&session);
    session.save_draft().await.expect("Save failed");

    let err = session
        .assign_slot(HomepageSlot::Hero)
        .await
        .expect_err("slot without cover must fail");
    match err {
        EditorError::Validation(message) => assert!(message.contains("cover image")),
        other => panic!("Expected validation error, got {:?}", other),
    }
    assert_eq!(store.calls().slot_updates, 0);
}

#[tokio::test]
async fn test_slot_assignment_evicts_other_record() {
    let store = Arc::new(MemoryStore::new());
    let mut ids = Vec::new();
    let mut sessions = Vec::new();
    for name in ["first", "second"] {
        let (session, _host) = new_session(&store, RecordKind::Property);
        fill_listing(&session);
        session.add_files("photos", photos(name, 1)).await.unwrap();
        session.publish().await.expect("Publish failed");
        session.assign_slot(HomepageSlot::Spotlight).await.expect("Slot failed");
        assert!(!session.is_dirty());
        ids.push(session.draft().persisted_id.clone().unwrap());
        sessions.push(session);
    }

    assert_eq!(store.slot_holder(HomepageSlot::Spotlight), Some(ids[1].clone()));
    assert_eq!(store.record(&ids[0]).unwrap().homepage_slot, None);
    assert_eq!(store.calls().slot_updates, 2);
}

#[tokio::test]
async fn test_slot_holder_must_be_evicted_before_unpublish_or_delete() {
    let store = Arc::new(MemoryStore::new());
    let (session, _host) = new_session(&store, RecordKind::Property);
    fill_listing(&session);
    session.add_files("photos", photos("c", 2)).await.unwrap();
    session.publish().await.unwrap();
    session.assign_slot(HomepageSlot::FeaturedLeft).await.unwrap();

    let outcome = session.save_draft().await.unwrap();
    assert_eq!(
        outcome,
        CommitOutcome::EvictionRequired {
            slot: HomepageSlot::FeaturedLeft
        }
    );
    let outcome = session.delete().await.unwrap();
    assert!(!outcome.is_done());
    assert_eq!(store.calls().deletes, 0);

    session.evict_from_slot().await.unwrap();
    assert_eq!(
        session.set_status(RecordStatus::Draft).await.unwrap(),
        CommitOutcome::Done(RecordStatus::Draft)
    );
    assert!(session.delete().await.unwrap().is_done());
    assert!(store.records().is_empty());
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn test_deleted_record_is_not_written_again() {
    let store = Arc::new(MemoryStore::new());
    let (session, _host) = new_session(&store, RecordKind::Property);
    fill_listing(&session);
    session.save_draft().await.expect("Save failed");

    assert!(session.delete().await.unwrap().is_done());
    assert!(session.is_closed());
    assert!(session.draft().persisted_id.is_none());

    let err = session.save_draft().await.expect_err("closed session must not save");
    assert!(matches!(err, EditorError::Validation(_)));
    assert!(session.add_files("photos", photos("late", 1)).await.is_err());
    assert_eq!(store.calls().creates, 1);
    assert_eq!(store.calls().updates, 0);
    assert_eq!(store.calls().uploads, 0);
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn test_dirty_tracking_across_hydrate_edit_commit() {
    let store = Arc::new(MemoryStore::new());
    let mut fields = BTreeMap::new();
    fields.insert("title".to_string(), FieldValue::text("Harbor lofts"));
    store.seed(StoredRecord {
        id: RecordId::new("rec-77"),
        kind: RecordKind::Project,
        slug: Some("harbor-lofts".to_string()),
        status: RecordStatus::Draft,
        fields,
        media: BTreeMap::new(),
        rows: BTreeMap::new(),
        homepage_slot: None,
        translations: BTreeMap::new(),
        translations_locked: false,
    });

    let host = TestHost::at("/projects/77/edit");
    let session = EditSession::open(
        RecordKind::Project,
        &RecordId::new("rec-77"),
        collaborators(&store),
        Box::new(host.clone()),
        config(),
    )
    .await
    .expect("Failed to open record");
    assert!(!session.is_dirty());

    session.add_row("features", BTreeMap::new()).unwrap();
    session.add_row("features", BTreeMap::new()).unwrap();
    assert!(session.is_dirty());
    assert!(session.on_before_unload());

    session.save().await.expect("Save failed");
    assert!(!session.is_dirty());
    assert!(!host.0.borrow().unload_prompt);

    // Reordering rows is an edit; reordering back is not
    let first = CompositeId::new("features", "row-1");
    let second = CompositeId::new("features", "row-2");
    assert!(session.drag(&second, &first).unwrap());
    assert!(session.is_dirty());
    assert!(session.drag(&first, &second).unwrap());
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn test_reorder_keeps_single_cover() {
    let store = Arc::new(MemoryStore::new());
    let (session, _host) = new_session(&store, RecordKind::Project);
    session.add_files("gallery", photos("g", 6)).await.unwrap();
    let ids: Vec<String> = session
        .draft()
        .media("gallery")
        .unwrap()
        .iter()
        .map(|m| m.id.clone())
        .collect();

    for (dragged, target) in [(5, 0), (2, 4), (0, 3), (1, 1)] {
        session
            .drag(
                &CompositeId::new("gallery", &ids[dragged]),
                &CompositeId::new("gallery", &ids[target]),
            )
            .unwrap();
        let roles = session.media_roles("gallery").unwrap();
        assert_eq!(roles.iter().filter(|r| **r == MediaRole::Cover).count(), 1);
        assert_eq!(roles[0], MediaRole::Cover);
    }
}

#[tokio::test]
async fn test_link_click_discard_navigates_to_href() {
    let store = Arc::new(MemoryStore::new());
    let (session, host) = new_session(&store, RecordKind::Article);
    session.set_field("title", FieldValue::text("Unsaved thoughts"));

    assert_eq!(
        session.on_link_activation(NavigationIntent::link("/articles")),
        Interception::Prompted
    );
    assert_eq!(host.location(), "/edit");

    let outcome = session.resolve_prompt(PromptChoice::Discard).await.unwrap();
    assert_eq!(
        outcome,
        NavigationOutcome::Navigated(Destination::Href("/articles".to_string()))
    );
    assert_eq!(host.navigations(), vec![Destination::Href("/articles".to_string())]);
    assert_eq!(store.calls().creates, 0);
}

#[tokio::test]
async fn test_link_click_save_draft_persists_then_navigates() {
    let store = Arc::new(MemoryStore::new());
    let (session, host) = new_session(&store, RecordKind::Article);
    session.set_field("title", FieldValue::text("Saved on the way out"));

    session.on_link_activation(NavigationIntent::link("/articles"));
    let outcome = session.resolve_prompt(PromptChoice::SaveDraft).await.unwrap();

    assert_eq!(
        outcome,
        NavigationOutcome::Navigated(Destination::Href("/articles".to_string()))
    );
    assert_eq!(store.calls().creates, 1);
    let saved = &store.records()[0];
    assert_eq!(saved.fields["title"], FieldValue::text("Saved on the way out"));
    assert_eq!(host.location(), "/articles");
}

#[tokio::test]
async fn test_link_click_cancel_stays() {
    let store = Arc::new(MemoryStore::new());
    let (session, host) = new_session(&store, RecordKind::Article);
    session.set_field("title", FieldValue::text("Still editing"));

    session.on_link_activation(NavigationIntent::link("/articles"));
    let outcome = session.resolve_prompt(PromptChoice::Cancel).await.unwrap();

    assert_eq!(outcome, NavigationOutcome::Stayed);
    assert_eq!(host.location(), "/edit");
    assert!(host.navigations().is_empty());
    assert!(session.is_dirty());
}

#[tokio::test]
async fn test_failed_save_from_prompt_keeps_destination() {
    let store = Arc::new(MemoryStore::new());
    store
        .faults()
        .fail_create(1, Fault::api(500, "Database unavailable"));
    let (session, host) = new_session(&store, RecordKind::Article);
    session.set_field("title", FieldValue::text("Retry me"));

    session.on_history_navigation(Destination::Back);
    session.tick();
    let err = session.resolve_prompt(PromptChoice::SaveDraft).await.unwrap_err();
    assert_eq!(err.to_string(), "Database unavailable");
    assert!(host.navigations().is_empty());

    // Same prompt, same destination
    let outcome = session.resolve_prompt(PromptChoice::SaveDraft).await.unwrap();
    assert_eq!(outcome, NavigationOutcome::Navigated(Destination::Back));
    assert_eq!(host.navigations(), vec![Destination::Back]);
    assert_eq!(store.calls().creates, 2);
}

#[tokio::test]
async fn test_translation_locks_record_everywhere() {
    let store = Arc::new(MemoryStore::new());
    let collaborators =
        collaborators(&store).with_translator(Arc::new(PrefixTranslator::new(["de", "tr"])));
    let session = EditSession::new_record(
        RecordKind::Article,
        collaborators,
        Box::new(TestHost::at("/edit")),
        config(),
    )
    .unwrap();
    session.set_field("title", FieldValue::text("Market report"));
    session.set_field("description", FieldValue::text("Quarterly numbers"));

    let locales = session.request_translation().await.unwrap();
    assert_eq!(locales, vec!["de".to_string(), "tr".to_string()]);
    assert_eq!(session.draft().translations["de"].title, "[de] Market report");
    assert!(session.draft().translations_locked);

    session.save().await.unwrap();
    let id = session.draft().persisted_id.clone().unwrap();
    assert!(store.record(&id).unwrap().translations_locked);

    let err = session.request_translation().await.unwrap_err();
    assert!(err.is_conflict());
}
