// Persistence backend for resume documents: axum handlers over sqlx free
// functions. Content is re-validated and ownership enforced here regardless
// of what the client already checked.

pub mod handlers;
pub mod storage;
