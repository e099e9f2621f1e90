//! Editor session: the single-session cooperative loop that owns the form
//! state and the autosave machine and executes their effects.
//!
//! Split into a spawned loop and a cloneable `EditorHandle`, the handle being
//! the surface the UI talks to: field edits, list mutations, import-merge,
//! explicit save, and watch receivers for the live draft and sync status.
//! The loop selects over the command channel, the debounce deadline, and the
//! single in-flight save; the `Saving` state is the only mutex, so a second
//! save request is queued behind the first's completion, never concurrent.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep_until, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::editor::autosave::{Autosave, Effect, SaveKind, SyncState, DEBOUNCE_WINDOW};
use crate::editor::form::{DocumentDraft, FormError, FormState, ListItem, ListSection};
use crate::editor::preview::{self, RenderedResume};
use crate::editor::store::{DocumentPatch, DocumentStore, StoreError};
use crate::editor::thumbnail::ThumbnailRenderer;
use crate::import;
use crate::models::resume::ResumeDocument;
use crate::schema::{self, CreationMode};

/// Sync state plus the last surfaced error, published on a watch channel for
/// the status indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    pub state: SyncState,
    pub last_error: Option<String>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("editor session closed")]
    Closed,
    #[error(transparent)]
    Form(#[from] FormError),
}

enum Command {
    Edit {
        path: String,
        value: String,
        reply: oneshot::Sender<Result<(), FormError>>,
    },
    Push(ListItem),
    Remove {
        section: ListSection,
        index: usize,
    },
    Move {
        section: ListSection,
        from: usize,
        to: usize,
    },
    MarkCreationMode(CreationMode),
    Import(String),
    Save,
    Shutdown(oneshot::Sender<()>),
}

/// Handle to a running editor session. Cloneable; all clones drive the same
/// document.
#[derive(Clone, Debug)]
pub struct EditorHandle {
    cmd_tx: mpsc::Sender<Command>,
    draft_rx: watch::Receiver<DocumentDraft>,
    status_rx: watch::Receiver<SyncStatus>,
}

impl EditorHandle {
    /// Writes a scalar field by path. An unknown path is reported back as an
    /// error, not a panic.
    pub async fn edit(&self, path: &str, value: &str) -> Result<(), SessionError> {
        let (reply, result) = oneshot::channel();
        self.cmd_tx
            .send(Command::Edit {
                path: path.to_string(),
                value: value.to_string(),
                reply,
            })
            .await
            .map_err(|_| SessionError::Closed)?;
        result
            .await
            .map_err(|_| SessionError::Closed)?
            .map_err(SessionError::from)
    }

    pub async fn push(&self, item: ListItem) -> Result<(), SessionError> {
        self.send(Command::Push(item)).await
    }

    pub async fn remove(&self, section: ListSection, index: usize) -> Result<(), SessionError> {
        self.send(Command::Remove { section, index }).await
    }

    pub async fn move_item(
        &self,
        section: ListSection,
        from: usize,
        to: usize,
    ) -> Result<(), SessionError> {
        self.send(Command::Move { section, from, to }).await
    }

    pub async fn mark_creation_mode(&self, mode: CreationMode) -> Result<(), SessionError> {
        self.send(Command::MarkCreationMode(mode)).await
    }

    /// Runs the pasted text through Magic Import and merges the result into
    /// the live draft.
    pub async fn import(&self, text: &str) -> Result<(), SessionError> {
        self.send(Command::Import(text.to_string())).await
    }

    /// Explicit save: short-circuits the debounce, coalescing with any
    /// pending attempt.
    pub async fn save(&self) -> Result<(), SessionError> {
        self.send(Command::Save).await
    }

    /// Live draft snapshots, updated on every mutation.
    pub fn draft(&self) -> watch::Receiver<DocumentDraft> {
        self.draft_rx.clone()
    }

    /// Dirty/saving/error status for the indicator.
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status_rx.clone()
    }

    /// Projects the current draft for display.
    pub fn preview(&self) -> RenderedResume {
        preview::project(&self.draft_rx.borrow())
    }

    /// Stops the loop. The debounce timer is cancelled and an in-flight save
    /// is awaited before the session exits.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        let (ack, done) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown(ack))
            .await
            .map_err(|_| SessionError::Closed)?;
        done.await.map_err(|_| SessionError::Closed)
    }

    async fn send(&self, cmd: Command) -> Result<(), SessionError> {
        self.cmd_tx.send(cmd).await.map_err(|_| SessionError::Closed)
    }
}

struct InFlight {
    task: JoinHandle<Result<ResumeDocument, StoreError>>,
    kind: SaveKind,
}

type SaveOutcome = Result<Result<ResumeDocument, StoreError>, JoinError>;

/// Awaits the in-flight save and clears the slot. Guarded by
/// `in_flight.is_some()` in the select, so the pending branch never runs.
async fn next_save_outcome(slot: &mut Option<InFlight>) -> (SaveKind, SaveOutcome) {
    match slot {
        Some(in_flight) => {
            let outcome = (&mut in_flight.task).await;
            let kind = in_flight.kind;
            *slot = None;
            (kind, outcome)
        }
        None => std::future::pending().await,
    }
}

pub struct EditorSession<S: DocumentStore> {
    store: Arc<S>,
    user_id: Uuid,
    document_id: Uuid,
    form: FormState,
    machine: Autosave,
    thumbnailer: Option<Arc<dyn ThumbnailRenderer>>,
    /// Captured on explicit save success, sent with the next patch.
    pending_thumbnail: Option<String>,
    last_error: Option<String>,
    draft_tx: watch::Sender<DocumentDraft>,
    status_tx: watch::Sender<SyncStatus>,
}

impl<S: DocumentStore + 'static> EditorSession<S> {
    /// Fetches the document and starts a session over it. A missing document
    /// or an ownership mismatch surfaces here, before any loop exists.
    pub async fn open(
        store: Arc<S>,
        user_id: Uuid,
        document_id: Uuid,
    ) -> Result<EditorHandle, StoreError> {
        let document = store.get(user_id, document_id).await?;
        Ok(Self::start(store, user_id, document))
    }

    pub fn start(store: Arc<S>, user_id: Uuid, document: ResumeDocument) -> EditorHandle {
        Self::start_with_thumbnailer(store, user_id, document, None)
    }

    pub fn start_with_thumbnailer(
        store: Arc<S>,
        user_id: Uuid,
        document: ResumeDocument,
        thumbnailer: Option<Arc<dyn ThumbnailRenderer>>,
    ) -> EditorHandle {
        let draft = DocumentDraft {
            title: document.title,
            template_id: document.template_id,
            content: document.content,
        };
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (draft_tx, draft_rx) = watch::channel(draft.clone());
        let (status_tx, status_rx) = watch::channel(SyncStatus {
            state: SyncState::Clean,
            last_error: None,
        });
        let session = EditorSession {
            store,
            user_id,
            document_id: document.id,
            machine: Autosave::new(&draft),
            form: FormState::new(draft),
            thumbnailer,
            pending_thumbnail: None,
            last_error: None,
            draft_tx,
            status_tx,
        };
        tokio::spawn(session.run(cmd_rx));
        EditorHandle {
            cmd_tx,
            draft_rx,
            status_rx,
        }
    }

    async fn run(mut self, mut cmd_rx: mpsc::Receiver<Command>) {
        info!(document_id = %self.document_id, "editor session started");
        let mut deadline: Option<Instant> = None;
        let mut in_flight: Option<InFlight> = None;

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Shutdown(ack)) => {
                        deadline = None;
                        self.drain_in_flight(&mut deadline, &mut in_flight).await;
                        let _ = ack.send(());
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd, &mut deadline, &mut in_flight),
                    None => {
                        // Every handle dropped: same teardown as Shutdown.
                        deadline = None;
                        self.drain_in_flight(&mut deadline, &mut in_flight).await;
                        break;
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    let snapshot = self.form.snapshot();
                    let effects = self.machine.on_debounce_fire(&snapshot);
                    self.apply_effects(effects, &mut deadline, &mut in_flight);
                    self.publish_status();
                }
                (kind, outcome) = next_save_outcome(&mut in_flight), if in_flight.is_some() => {
                    self.complete_save(kind, outcome, &mut deadline, &mut in_flight).await;
                }
            }
        }
        info!(document_id = %self.document_id, "editor session stopped");
    }

    /// Awaits the in-flight save, plus any queued save it launches, so no
    /// accepted request is abandoned at teardown.
    async fn drain_in_flight(
        &mut self,
        deadline: &mut Option<Instant>,
        in_flight: &mut Option<InFlight>,
    ) {
        while in_flight.is_some() {
            let (kind, outcome) = next_save_outcome(in_flight).await;
            self.complete_save(kind, outcome, deadline, in_flight).await;
        }
        *deadline = None;
    }

    fn handle_command(
        &mut self,
        cmd: Command,
        deadline: &mut Option<Instant>,
        in_flight: &mut Option<InFlight>,
    ) {
        match cmd {
            Command::Edit { path, value, reply } => {
                let result = self.form.set_field(&path, &value);
                let changed = result.is_ok();
                let _ = reply.send(result);
                if changed {
                    self.after_mutation(deadline, in_flight);
                }
            }
            Command::Push(item) => {
                self.form.push_item(item);
                self.after_mutation(deadline, in_flight);
            }
            Command::Remove { section, index } => {
                self.form.remove_item(section, index);
                self.after_mutation(deadline, in_flight);
            }
            Command::Move { section, from, to } => {
                self.form.move_item(section, from, to);
                self.after_mutation(deadline, in_flight);
            }
            Command::MarkCreationMode(mode) => {
                self.form.mark_creation_mode(mode);
                self.after_mutation(deadline, in_flight);
            }
            Command::Import(text) => {
                let parsed = import::parse_resume_text(&text);
                self.form.apply_import(parsed);
                self.after_mutation(deadline, in_flight);
            }
            Command::Save => {
                let snapshot = self.form.snapshot();
                let effects = self.machine.on_explicit_save(&snapshot);
                self.apply_effects(effects, deadline, in_flight);
                self.publish_status();
            }
            // Handled by the run loop before dispatch.
            Command::Shutdown(_) => {}
        }
    }

    fn after_mutation(&mut self, deadline: &mut Option<Instant>, in_flight: &mut Option<InFlight>) {
        let snapshot = self.form.snapshot();
        let _ = self.draft_tx.send(snapshot.clone());
        let effects = self.machine.on_edit(&snapshot);
        self.apply_effects(effects, deadline, in_flight);
        self.publish_status();
    }

    fn apply_effects(
        &mut self,
        effects: Vec<Effect>,
        deadline: &mut Option<Instant>,
        in_flight: &mut Option<InFlight>,
    ) {
        for effect in effects {
            match effect {
                Effect::ArmTimer => *deadline = Some(Instant::now() + DEBOUNCE_WINDOW),
                Effect::CancelTimer => *deadline = None,
                Effect::BeginSave { snapshot, kind } => {
                    self.begin_save(snapshot, kind, deadline, in_flight)
                }
            }
        }
    }

    fn begin_save(
        &mut self,
        snapshot: DocumentDraft,
        kind: SaveKind,
        deadline: &mut Option<Instant>,
        in_flight: &mut Option<InFlight>,
    ) {
        // Client-side gate: content that fails the schema never reaches the
        // store; the prior persisted state stays authoritative.
        if let Err(e) = schema::ensure_valid(&snapshot.content) {
            warn!(document_id = %self.document_id, error = %e, "rejected save of invalid content");
            self.last_error = Some(e.to_string());
            let current = self.form.snapshot();
            let effects = self.machine.on_save_failure(&current);
            self.apply_effects(effects, deadline, in_flight);
            return;
        }

        let patch = DocumentPatch {
            title: Some(snapshot.title),
            template_id: Some(snapshot.template_id),
            content: Some(snapshot.content),
            thumbnail: self.pending_thumbnail.take(),
        };
        let store = self.store.clone();
        let user_id = self.user_id;
        let document_id = self.document_id;
        let task = tokio::spawn(async move { store.update(user_id, document_id, patch).await });
        *in_flight = Some(InFlight { task, kind });
    }

    async fn complete_save(
        &mut self,
        kind: SaveKind,
        outcome: SaveOutcome,
        deadline: &mut Option<Instant>,
        in_flight: &mut Option<InFlight>,
    ) {
        let current = self.form.snapshot();
        match outcome {
            Ok(Ok(saved)) => {
                info!(document_id = %saved.id, "document persisted");
                self.last_error = None;
                if kind == SaveKind::Explicit {
                    self.capture_thumbnail(&current).await;
                }
                let effects = self.machine.on_save_success(&current);
                self.apply_effects(effects, deadline, in_flight);
            }
            Ok(Err(e)) => {
                warn!(document_id = %self.document_id, error = %e, "save failed");
                self.last_error = Some(e.to_string());
                let effects = self.machine.on_save_failure(&current);
                self.apply_effects(effects, deadline, in_flight);
            }
            Err(join_error) => {
                warn!(document_id = %self.document_id, error = %join_error, "save task aborted");
                self.last_error = Some(join_error.to_string());
                let effects = self.machine.on_save_failure(&current);
                self.apply_effects(effects, deadline, in_flight);
            }
        }
        self.publish_status();
    }

    /// Explicit-save side effect. Failure is logged and swallowed; it never
    /// fails the save that triggered it.
    async fn capture_thumbnail(&mut self, draft: &DocumentDraft) {
        let Some(renderer) = self.thumbnailer.clone() else {
            return;
        };
        let rendered = preview::project(draft);
        match renderer.capture(&rendered).await {
            Ok(data_uri) => self.pending_thumbnail = Some(data_uri),
            Err(e) => {
                warn!(document_id = %self.document_id, error = %e, "thumbnail capture failed")
            }
        }
    }

    fn publish_status(&self) {
        let next = SyncStatus {
            state: self.machine.state(),
            last_error: self.last_error.clone(),
        };
        self.status_tx.send_if_modified(|status| {
            if *status != next {
                *status = next;
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::store::{MemoryStore, NewDocument};
    use crate::editor::thumbnail::ThumbnailError;
    use crate::schema::{ExperienceEntry, ResumeContent};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Delegates to a MemoryStore, sleeping before every update to keep a
    /// save in flight while edits land.
    struct SlowStore {
        inner: MemoryStore,
        delay: Duration,
    }

    #[async_trait]
    impl DocumentStore for SlowStore {
        async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeDocument>, StoreError> {
            self.inner.list(user_id).await
        }
        async fn get(&self, user_id: Uuid, id: Uuid) -> Result<ResumeDocument, StoreError> {
            self.inner.get(user_id, id).await
        }
        async fn create(
            &self,
            user_id: Uuid,
            doc: NewDocument,
        ) -> Result<ResumeDocument, StoreError> {
            self.inner.create(user_id, doc).await
        }
        async fn update(
            &self,
            user_id: Uuid,
            id: Uuid,
            patch: DocumentPatch,
        ) -> Result<ResumeDocument, StoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.update(user_id, id, patch).await
        }
        async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
            self.inner.delete(user_id, id).await
        }
    }

    /// Fails the first `failures` updates, then delegates.
    struct FlakyStore {
        inner: MemoryStore,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeDocument>, StoreError> {
            self.inner.list(user_id).await
        }
        async fn get(&self, user_id: Uuid, id: Uuid) -> Result<ResumeDocument, StoreError> {
            self.inner.get(user_id, id).await
        }
        async fn create(
            &self,
            user_id: Uuid,
            doc: NewDocument,
        ) -> Result<ResumeDocument, StoreError> {
            self.inner.create(user_id, doc).await
        }
        async fn update(
            &self,
            user_id: Uuid,
            id: Uuid,
            patch: DocumentPatch,
        ) -> Result<ResumeDocument, StoreError> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::Transient("injected network failure".to_string()));
            }
            self.inner.update(user_id, id, patch).await
        }
        async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
            self.inner.delete(user_id, id).await
        }
    }

    struct FakeThumbnailer;

    #[async_trait]
    impl ThumbnailRenderer for FakeThumbnailer {
        async fn capture(&self, _resume: &RenderedResume) -> Result<String, ThumbnailError> {
            Ok("data:image/png;base64,dGh1bWI=".to_string())
        }
    }

    struct BrokenThumbnailer;

    #[async_trait]
    impl ThumbnailRenderer for BrokenThumbnailer {
        async fn capture(&self, _resume: &RenderedResume) -> Result<String, ThumbnailError> {
            Err(ThumbnailError("rasterizer unavailable".to_string()))
        }
    }

    async fn seed<S: DocumentStore>(store: &S) -> (Uuid, ResumeDocument) {
        let user = Uuid::new_v4();
        let doc = store
            .create(
                user,
                NewDocument {
                    title: "My Resume".to_string(),
                    template_id: "modern".to_string(),
                    content: ResumeContent::default(),
                },
            )
            .await
            .unwrap();
        (user, doc)
    }

    /// Polls until the condition holds; the paused clock auto-advances, so
    /// the timeout doubles as the failure bound.
    async fn eventually<F, Fut>(mut condition: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        tokio::time::timeout(Duration::from_secs(120), async {
            loop {
                if condition().await {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_autosaves_after_quiet_period() {
        let store = Arc::new(MemoryStore::new());
        let (user, doc) = seed(store.as_ref()).await;
        let handle = EditorSession::start(store.clone(), user, doc.clone());

        handle.edit("personal_info.full_name", "Jane Doe").await.unwrap();

        let (probe, id) = (store.clone(), doc.id);
        eventually(move || {
            let store = probe.clone();
            async move {
                let saved = store.get(user, id).await.unwrap();
                saved.content.personal_info.full_name == "Jane Doe"
            }
        })
        .await;

        let mut status = handle.status();
        let status = status.wait_for(|s| s.state == SyncState::Clean).await.unwrap();
        assert!(status.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_lost_update_under_slow_save() {
        let store = Arc::new(SlowStore {
            inner: MemoryStore::new(),
            delay: Duration::from_secs(5),
        });
        let (user, doc) = seed(store.as_ref()).await;
        let handle = EditorSession::start(store.clone(), user, doc.clone());

        handle.edit("title", "v1").await.unwrap();
        let mut status = handle.status();
        status.wait_for(|s| s.state == SyncState::Saving).await.unwrap();

        // The first request is still out; keep editing.
        handle.edit("title", "v2").await.unwrap();
        handle.edit("title", "v3").await.unwrap();

        let (probe, id) = (store.clone(), doc.id);
        eventually(move || {
            let store = probe.clone();
            async move { store.get(user, id).await.unwrap().title == "v3" }
        })
        .await;
        let mut status = handle.status();
        status.wait_for(|s| s.state == SyncState::Clean).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_keeps_local_edits_and_retries_on_next_edit() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            failures: AtomicUsize::new(1),
        });
        let (user, doc) = seed(store.as_ref()).await;
        let handle = EditorSession::start(store.clone(), user, doc.clone());

        handle.edit("title", "unsaved edit").await.unwrap();
        let mut status = handle.status();
        {
            let failed = status
                .wait_for(|s| s.state == SyncState::SaveFailed)
                .await
                .unwrap();
            assert!(failed
                .last_error
                .as_deref()
                .unwrap()
                .contains("injected network failure"));
        }

        // Local state is never rolled back by a remote failure.
        assert_eq!(handle.draft().borrow().title, "unsaved edit");
        assert_eq!(store.get(user, doc.id).await.unwrap().title, "My Resume");

        // The next mutation-triggered cycle re-attempts and succeeds.
        handle.edit("title", "second try").await.unwrap();
        let (probe, id) = (store.clone(), doc.id);
        eventually(move || {
            let store = probe.clone();
            async move { store.get(user, id).await.unwrap().title == "second try" }
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_content_never_reaches_store() {
        let store = Arc::new(MemoryStore::new());
        let (user, doc) = seed(store.as_ref()).await;
        let handle = EditorSession::start(store.clone(), user, doc.clone());

        for _ in 0..2 {
            handle
                .push(ListItem::Experience(ExperienceEntry {
                    id: "dup".to_string(),
                    position: "Dev".to_string(),
                    ..Default::default()
                }))
                .await
                .unwrap();
        }

        let mut status = handle.status();
        {
            let failed = status
                .wait_for(|s| s.state == SyncState::SaveFailed)
                .await
                .unwrap();
            assert!(failed.last_error.as_deref().unwrap().contains("experience[1].id"));
        }
        assert!(store.get(user, doc.id).await.unwrap().content.experience.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_save_captures_thumbnail_for_next_patch() {
        let store = Arc::new(MemoryStore::new());
        let (user, doc) = seed(store.as_ref()).await;
        let handle = EditorSession::start_with_thumbnailer(
            store.clone(),
            user,
            doc.clone(),
            Some(Arc::new(FakeThumbnailer)),
        );

        handle.edit("title", "v1").await.unwrap();
        handle.save().await.unwrap();
        let (probe, id) = (store.clone(), doc.id);
        eventually(move || {
            let store = probe.clone();
            async move { store.get(user, id).await.unwrap().title == "v1" }
        })
        .await;

        // The capture rides along with the following save.
        handle.edit("title", "v2").await.unwrap();
        handle.save().await.unwrap();
        let (probe, id) = (store.clone(), doc.id);
        eventually(move || {
            let store = probe.clone();
            async move {
                let saved = store.get(user, id).await.unwrap();
                saved.title == "v2" && saved.thumbnail.is_some()
            }
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_thumbnail_failure_never_fails_the_save() {
        let store = Arc::new(MemoryStore::new());
        let (user, doc) = seed(store.as_ref()).await;
        let handle = EditorSession::start_with_thumbnailer(
            store.clone(),
            user,
            doc.clone(),
            Some(Arc::new(BrokenThumbnailer)),
        );

        handle.edit("title", "still saves").await.unwrap();
        handle.save().await.unwrap();

        let (probe, id) = (store.clone(), doc.id);
        eventually(move || {
            let store = probe.clone();
            async move { store.get(user, id).await.unwrap().title == "still saves" }
        })
        .await;
        let mut status = handle.status();
        let status = status.wait_for(|s| s.state == SyncState::Clean).await.unwrap();
        assert!(status.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_awaits_in_flight_save() {
        let store = Arc::new(SlowStore {
            inner: MemoryStore::new(),
            delay: Duration::from_secs(5),
        });
        let (user, doc) = seed(store.as_ref()).await;
        let handle = EditorSession::start(store.clone(), user, doc.clone());

        handle.edit("title", "persisted at teardown").await.unwrap();
        let mut status = handle.status();
        status.wait_for(|s| s.state == SyncState::Saving).await.unwrap();

        handle.shutdown().await.unwrap();
        assert_eq!(
            store.get(user, doc.id).await.unwrap().title,
            "persisted at teardown"
        );
        assert!(matches!(
            handle.edit("title", "after shutdown").await,
            Err(SessionError::Closed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_field_path_surfaces_to_caller() {
        let store = Arc::new(MemoryStore::new());
        let (user, doc) = seed(store.as_ref()).await;
        let handle = EditorSession::start(store.clone(), user, doc);

        let err = handle.edit("personal_info.bogus", "x").await.unwrap_err();
        assert!(matches!(err, SessionError::Form(FormError::UnknownField(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_import_merges_and_autosaves() {
        let store = Arc::new(MemoryStore::new());
        let (user, doc) = seed(store.as_ref()).await;
        let handle = EditorSession::start(store.clone(), user, doc.clone());

        handle
            .import("Jane Doe\njane@x.com\nSKILLS\nRust, Go")
            .await
            .unwrap();

        assert_eq!(
            handle.draft().borrow().content.personal_info.full_name,
            "Jane Doe"
        );
        assert_eq!(handle.preview().name, "Jane Doe");

        let (probe, id) = (store.clone(), doc.id);
        eventually(move || {
            let store = probe.clone();
            async move {
                let saved = store.get(user, id).await.unwrap();
                saved.content.skills == vec!["Rust".to_string(), "Go".to_string()]
                    && saved.content.creation_mode == CreationMode::Magic
            }
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_surfaces_not_found() {
        let store = Arc::new(MemoryStore::new());
        let err = EditorSession::open(store, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_is_not_blocked_by_in_flight_save() {
        let store = Arc::new(SlowStore {
            inner: MemoryStore::new(),
            delay: Duration::from_secs(60),
        });
        let (user, doc) = seed(store.as_ref()).await;
        let handle = EditorSession::start(store.clone(), user, doc.clone());

        handle.edit("title", "slow save").await.unwrap();
        let mut status = handle.status();
        status.wait_for(|s| s.state == SyncState::Saving).await.unwrap();

        // Cross-document reads go straight through the store.
        let docs = store.list(user).await.unwrap();
        assert_eq!(docs.len(), 1);
    }
}
