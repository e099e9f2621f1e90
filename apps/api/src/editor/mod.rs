// The client-side editing core: form state, debounced autosave, preview
// projection, and the persistence seam. One logical editing session per
// document, single-threaded cooperative scheduling: the session loop reacts
// to user-input commands and timer callbacks, with the Saving state acting as
// the mutex that keeps persistence requests serial.

pub mod autosave;
pub mod form;
pub mod preview;
pub mod session;
pub mod store;
pub mod thumbnail;

// Re-export the surface embedders actually touch.
pub use autosave::{SaveKind, SyncState, DEBOUNCE_WINDOW};
pub use form::{DocumentDraft, FormError, FormState, ListItem, ListSection};
pub use preview::{project, RenderedResume};
pub use session::{EditorHandle, EditorSession, SessionError, SyncStatus};
pub use store::{
    DocumentPatch, DocumentStore, MemoryStore, NewDocument, RemoteStore, StoreError,
};
pub use thumbnail::{ThumbnailError, ThumbnailRenderer};
