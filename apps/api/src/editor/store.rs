//! DocumentStore: the persistence seam the editor core saves through.
//!
//! `RemoteStore` talks to the HTTP backend; `MemoryStore` is an in-process
//! stand-in that assigns ids and timestamps and enforces ownership exactly
//! like the backend, used by editor tests and local embedding. Cross-document
//! operations (list, delete) go straight through the store and are never
//! blocked by a session's in-flight save.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::resume::ResumeDocument;
use crate::schema::{self, ResumeContent, ValidationError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,
    #[error("access denied")]
    Forbidden,
    /// Content failed schema validation; the write was rejected and the
    /// prior persisted state remains authoritative.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },
    /// Network or backend failure. Non-blocking: local state is untouched
    /// and the engine retries on the next edit cycle.
    #[error("sync failed: {0}")]
    Transient(String),
}

impl From<ValidationError> for StoreError {
    fn from(e: ValidationError) -> Self {
        StoreError::Validation {
            field: e.field,
            message: e.message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub template_id: String,
    pub content: ResumeContent,
}

/// Partial update; `None` fields are left as stored.
#[derive(Debug, Clone, Default)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub template_id: Option<String>,
    pub content: Option<ResumeContent>,
    pub thumbnail: Option<String>,
}

/// Per-user document CRUD, all operations scoped to the calling owner. The
/// backend is the authoritative enforcer of ownership even when the client
/// checks too.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeDocument>, StoreError>;
    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<ResumeDocument, StoreError>;
    async fn create(&self, user_id: Uuid, doc: NewDocument) -> Result<ResumeDocument, StoreError>;
    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: DocumentPatch,
    ) -> Result<ResumeDocument, StoreError>;
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError>;
}

// ────────────────────────────────────────────────────────────────────────────
// RemoteStore — reqwest client against the HTTP backend
// ────────────────────────────────────────────────────────────────────────────

pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody<'a> {
    user_id: Uuid,
    title: &'a str,
    template_id: &'a str,
    content: &'a ResumeContent,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody<'a> {
    user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a ResumeContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<&'a str>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[allow(dead_code)]
    code: String,
    message: String,
    #[serde(default)]
    field: Option<String>,
}

impl RemoteStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    async fn error_from(response: reqwest::Response) -> StoreError {
        let status = response.status();
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .map(|body| body.error);
        match status {
            StatusCode::NOT_FOUND => StoreError::NotFound,
            StatusCode::FORBIDDEN => StoreError::Forbidden,
            StatusCode::BAD_REQUEST => StoreError::Validation {
                field: detail
                    .as_ref()
                    .and_then(|d| d.field.clone())
                    .unwrap_or_default(),
                message: detail
                    .map(|d| d.message)
                    .unwrap_or_else(|| "invalid document".to_string()),
            },
            _ => StoreError::Transient(match detail {
                Some(d) => format!("status {status}: {}", d.message),
                None => format!("status {status}"),
            }),
        }
    }
}

#[async_trait]
impl DocumentStore for RemoteStore {
    async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeDocument>, StoreError> {
        let response = self
            .client
            .get(self.url("/api/v1/resumes"))
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<ResumeDocument, StoreError> {
        let response = self
            .client
            .get(self.url(&format!("/api/v1/resumes/{id}")))
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))
    }

    async fn create(&self, user_id: Uuid, doc: NewDocument) -> Result<ResumeDocument, StoreError> {
        let response = self
            .client
            .post(self.url("/api/v1/resumes"))
            .json(&CreateBody {
                user_id,
                title: &doc.title,
                template_id: &doc.template_id,
                content: &doc.content,
            })
            .send()
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: DocumentPatch,
    ) -> Result<ResumeDocument, StoreError> {
        let response = self
            .client
            .put(self.url(&format!("/api/v1/resumes/{id}")))
            .json(&UpdateBody {
                user_id,
                title: patch.title.as_deref(),
                template_id: patch.template_id.as_deref(),
                content: patch.content.as_ref(),
                thumbnail: patch.thumbnail.as_deref(),
            })
            .send()
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/v1/resumes/{id}")))
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryStore — in-process store with backend-equivalent semantics
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<Uuid, ResumeDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeDocument>, StoreError> {
        let docs = self.docs.read().await;
        let mut owned: Vec<ResumeDocument> = docs
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<ResumeDocument, StoreError> {
        let docs = self.docs.read().await;
        let doc = docs.get(&id).ok_or(StoreError::NotFound)?;
        if doc.user_id != user_id {
            return Err(StoreError::Forbidden);
        }
        Ok(doc.clone())
    }

    async fn create(&self, user_id: Uuid, doc: NewDocument) -> Result<ResumeDocument, StoreError> {
        schema::ensure_valid(&doc.content)?;
        let now = Utc::now();
        let document = ResumeDocument {
            id: Uuid::new_v4(),
            user_id,
            title: doc.title,
            template_id: doc.template_id,
            content: doc.content,
            thumbnail: None,
            created_at: now,
            updated_at: now,
        };
        self.docs
            .write()
            .await
            .insert(document.id, document.clone());
        Ok(document)
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: DocumentPatch,
    ) -> Result<ResumeDocument, StoreError> {
        if let Some(content) = &patch.content {
            schema::ensure_valid(content)?;
        }
        let mut docs = self.docs.write().await;
        let doc = docs.get_mut(&id).ok_or(StoreError::NotFound)?;
        if doc.user_id != user_id {
            return Err(StoreError::Forbidden);
        }
        if let Some(title) = patch.title {
            doc.title = title;
        }
        if let Some(template_id) = patch.template_id {
            doc.template_id = template_id;
        }
        if let Some(content) = patch.content {
            doc.content = content;
        }
        if let Some(thumbnail) = patch.thumbnail {
            doc.thumbnail = Some(thumbnail);
        }
        doc.updated_at = Utc::now();
        Ok(doc.clone())
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let doc = docs.get(&id).ok_or(StoreError::NotFound)?;
        if doc.user_id != user_id {
            return Err(StoreError::Forbidden);
        }
        docs.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ExperienceEntry;

    fn new_doc(title: &str) -> NewDocument {
        NewDocument {
            title: title.to_string(),
            template_id: "modern".to_string(),
            content: ResumeContent::default(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let doc = store.create(user, new_doc("My Resume")).await.unwrap();
        assert_eq!(doc.user_id, user);
        assert_eq!(doc.title, "My Resume");
        assert_eq!(doc.created_at, doc.updated_at);
        assert!(doc.thumbnail.is_none());
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }

    #[tokio::test]
    async fn test_get_other_users_document_is_forbidden() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let doc = store.create(owner, new_doc("Private")).await.unwrap();
        let err = store.get(Uuid::new_v4(), doc.id).await.unwrap_err();
        assert_eq!(err, StoreError::Forbidden);
    }

    #[tokio::test]
    async fn test_delete_not_owned_is_forbidden_and_store_unchanged() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let doc = store.create(owner, new_doc("Private")).await.unwrap();

        let err = store.delete(Uuid::new_v4(), doc.id).await.unwrap_err();
        assert_eq!(err, StoreError::Forbidden);
        assert_eq!(store.get(owner, doc.id).await.unwrap(), doc);
    }

    #[tokio::test]
    async fn test_delete_is_hard() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let doc = store.create(user, new_doc("Gone")).await.unwrap();
        store.delete(user, doc.id).await.unwrap();
        assert_eq!(store.get(user, doc.id).await.unwrap_err(), StoreError::NotFound);
        assert!(store.list(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.create(alice, new_doc("A")).await.unwrap();
        store.create(bob, new_doc("B")).await.unwrap();

        let docs = store.list(alice).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "A");
    }

    #[tokio::test]
    async fn test_update_applies_only_present_fields() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let doc = store.create(user, new_doc("Original")).await.unwrap();

        let updated = store
            .update(
                user,
                doc.id,
                DocumentPatch {
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.template_id, "modern");
        assert_eq!(updated.content, doc.content);
        assert!(updated.updated_at >= doc.updated_at);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_content_and_keeps_stored_value() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let doc = store.create(user, new_doc("Valid")).await.unwrap();

        let mut bad = ResumeContent::default();
        bad.experience.push(ExperienceEntry::default()); // empty id
        let err = store
            .update(
                user,
                doc.id,
                DocumentPatch {
                    content: Some(bad),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { ref field, .. } if field == "experience[0].id"));
        assert_eq!(store.get(user, doc.id).await.unwrap().content, doc.content);
    }

    #[tokio::test]
    async fn test_update_not_owned_is_forbidden() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let doc = store.create(owner, new_doc("Private")).await.unwrap();
        let err = store
            .update(Uuid::new_v4(), doc.id, DocumentPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Forbidden);
    }
}
