//! Folio: structured resume documents, an embeddable client-side editing
//! core, and the HTTP persistence backend it saves to.
//!
//! The `editor` module carries the synchronization pipeline (form state,
//! debounced autosave, preview projection, document store seam); `schema`
//! and `import` are the pure leaves it is built on; `resumes` and `routes`
//! are the server side.

pub mod config;
pub mod db;
pub mod editor;
pub mod errors;
pub mod import;
pub mod models;
pub mod resumes;
pub mod routes;
pub mod schema;
pub mod state;
