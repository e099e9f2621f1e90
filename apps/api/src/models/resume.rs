use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::schema::ResumeContent;

/// The top-level persisted unit: document metadata plus the structured
/// content body, stored as jsonb. Owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// Stored as free text; parsed to `TemplateId` with a Modern fallback at
    /// render time, so an unknown id never fails a write.
    pub template_id: String,
    #[sqlx(json)]
    pub content: ResumeContent,
    /// Data URI of the last captured preview thumbnail, if any.
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
