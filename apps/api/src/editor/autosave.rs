//! Autosave state machine.
//!
//! Pure: no timers, no I/O. The session loop feeds it edit notifications,
//! debounce expiries, explicit save requests, and save completions; it
//! answers with effects (arm/cancel the debounce timer, begin a save with a
//! given snapshot) that the loop executes. Dirtiness is decided by comparing
//! the draft's serialized form against the last successfully persisted
//! snapshot.
//!
//! The `Saving` state doubles as the mutex required by the resource model:
//! at most one persistence request is in flight per document, and a request
//! that becomes due mid-flight is queued behind the current one, never
//! launched concurrently and never silently dropped.

use std::time::Duration;

use crate::editor::form::DocumentDraft;

/// Quiet period after the last edit before a save is attempted.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Draft matches the last persisted snapshot.
    Clean,
    /// Draft differs; the debounce timer is running.
    Dirty,
    /// A persistence request is in flight.
    Saving,
    /// The last request failed. Local edits are untouched; the next edit
    /// cycle retries.
    SaveFailed,
}

/// Whether a save was triggered by the debounce timer or by the user.
/// Explicit saves short-circuit the debounce and carry the thumbnail
/// side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Silent,
    Explicit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// (Re)start the debounce timer. Trailing edge: every qualifying
    /// mutation restarts the quiet period.
    ArmTimer,
    CancelTimer,
    BeginSave {
        snapshot: DocumentDraft,
        kind: SaveKind,
    },
}

pub struct Autosave {
    state: SyncState,
    /// Serialized form of the last snapshot the store accepted.
    last_persisted: String,
    /// Serialized form of the snapshot currently in flight, promoted to
    /// `last_persisted` on success.
    in_flight: Option<String>,
    /// A save that became due while one was in flight, launched on
    /// completion against the then-latest snapshot.
    queued: Option<SaveKind>,
}

fn serialize(draft: &DocumentDraft) -> String {
    serde_json::to_string(draft).unwrap_or_default()
}

impl Autosave {
    pub fn new(initial: &DocumentDraft) -> Self {
        Self {
            state: SyncState::Clean,
            last_persisted: serialize(initial),
            in_flight: None,
            queued: None,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// A mutation landed on the draft.
    pub fn on_edit(&mut self, draft: &DocumentDraft) -> Vec<Effect> {
        if self.state == SyncState::Saving {
            // Keep the trailing-edge debounce running against the live
            // draft; if it fires mid-flight the attempt is queued.
            return vec![Effect::ArmTimer];
        }
        if serialize(draft) == self.last_persisted {
            // Edited back to the persisted value: nothing left to save.
            let effects = if self.state == SyncState::Clean {
                vec![]
            } else {
                vec![Effect::CancelTimer]
            };
            self.state = SyncState::Clean;
            effects
        } else {
            self.state = SyncState::Dirty;
            vec![Effect::ArmTimer]
        }
    }

    /// The debounce timer expired; `draft` is the live value at fire time.
    pub fn on_debounce_fire(&mut self, draft: &DocumentDraft) -> Vec<Effect> {
        match self.state {
            SyncState::Saving => {
                if self.queued.is_none() {
                    self.queued = Some(SaveKind::Silent);
                }
                vec![]
            }
            SyncState::Dirty | SyncState::SaveFailed => {
                let serialized = serialize(draft);
                if serialized == self.last_persisted {
                    self.state = SyncState::Clean;
                    vec![]
                } else {
                    self.begin(serialized, draft.clone(), SaveKind::Silent)
                }
            }
            // Stale fire after the state already resolved.
            SyncState::Clean => vec![],
        }
    }

    /// The user pressed Save. Short-circuits the debounce and attempts a
    /// save from any state; while one is in flight it coalesces into the
    /// queued slot, where explicit wins over silent.
    pub fn on_explicit_save(&mut self, draft: &DocumentDraft) -> Vec<Effect> {
        if self.state == SyncState::Saving {
            self.queued = Some(SaveKind::Explicit);
            return vec![];
        }
        let mut effects = vec![Effect::CancelTimer];
        effects.extend(self.begin(serialize(draft), draft.clone(), SaveKind::Explicit));
        effects
    }

    /// The in-flight request succeeded. `current` is the live draft, which
    /// may have moved on while the request was out; in that case the
    /// machine reconciles forward rather than going Clean against stale
    /// data.
    pub fn on_save_success(&mut self, current: &DocumentDraft) -> Vec<Effect> {
        if let Some(sent) = self.in_flight.take() {
            self.last_persisted = sent;
        }
        let serialized = serialize(current);
        let dirty = serialized != self.last_persisted;
        match self.queued.take() {
            Some(SaveKind::Explicit) => {
                let mut effects = vec![Effect::CancelTimer];
                effects.extend(self.begin(serialized, current.clone(), SaveKind::Explicit));
                effects
            }
            Some(SaveKind::Silent) if dirty => {
                self.begin(serialized, current.clone(), SaveKind::Silent)
            }
            _ => {
                if dirty {
                    self.state = SyncState::Dirty;
                    vec![Effect::ArmTimer]
                } else {
                    self.state = SyncState::Clean;
                    vec![Effect::CancelTimer]
                }
            }
        }
    }

    /// The in-flight request failed. `last_persisted` is unchanged and the
    /// local draft is never rolled back. A queued explicit save still
    /// launches (the user asked for it); a queued silent save is dropped and
    /// left to the next edit cycle.
    pub fn on_save_failure(&mut self, current: &DocumentDraft) -> Vec<Effect> {
        self.in_flight = None;
        match self.queued.take() {
            Some(SaveKind::Explicit) => {
                let mut effects = vec![Effect::CancelTimer];
                effects.extend(self.begin(
                    serialize(current),
                    current.clone(),
                    SaveKind::Explicit,
                ));
                effects
            }
            _ => {
                self.state = SyncState::SaveFailed;
                vec![]
            }
        }
    }

    fn begin(&mut self, serialized: String, snapshot: DocumentDraft, kind: SaveKind) -> Vec<Effect> {
        self.state = SyncState::Saving;
        self.in_flight = Some(serialized);
        vec![Effect::BeginSave { snapshot, kind }]
    }
}
