use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::resumes::storage;
use crate::schema;
use crate::state::AppState;

/// Authenticated user identity, supplied by the fronting identity provider.
/// Reads and deletes carry it as a query parameter, writes in the body.
#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResumeRequest {
    pub user_id: Uuid,
    pub title: String,
    #[serde(default = "default_template")]
    pub template_id: String,
    pub content: serde_json::Value,
}

fn default_template() -> String {
    "modern".to_string()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResumeRequest {
    pub user_id: Uuid,
    pub title: Option<String>,
    pub template_id: Option<String>,
    pub content: Option<serde_json::Value>,
    pub thumbnail: Option<String>,
}

/// Resolves the row first, then compares the owner: an unknown id is 404
/// before any ownership question, a known id owned by someone else is 403.
async fn fetch_owned(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<ResumeDocument, AppError> {
    let doc = storage::get_resume(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    if doc.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(doc)
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ResumeDocument>>, AppError> {
    let docs = storage::list_resumes(&state.db, params.user_id).await?;
    Ok(Json(docs))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeDocument>, AppError> {
    let doc = fetch_owned(&state.db, id, params.user_id).await?;
    Ok(Json(doc))
}

/// POST /api/v1/resumes
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<CreateResumeRequest>,
) -> Result<(StatusCode, Json<ResumeDocument>), AppError> {
    // Re-run the schema here: the client validates too, but the backend is
    // the authoritative gate.
    let content = schema::normalize(&req.content)?;
    let content = serde_json::to_value(&content).map_err(anyhow::Error::from)?;

    let doc = storage::insert_resume(
        &state.db,
        req.user_id,
        &req.title,
        &req.template_id,
        &content,
    )
    .await?;
    info!(resume_id = %doc.id, user_id = %doc.user_id, "created resume");
    Ok((StatusCode::CREATED, Json(doc)))
}

/// PUT /api/v1/resumes/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateResumeRequest>,
) -> Result<Json<ResumeDocument>, AppError> {
    fetch_owned(&state.db, id, req.user_id).await?;

    let content = match &req.content {
        Some(raw) => {
            let normalized = schema::normalize(raw)?;
            Some(serde_json::to_value(&normalized).map_err(anyhow::Error::from)?)
        }
        None => None,
    };

    let doc = storage::update_resume(
        &state.db,
        id,
        storage::ResumePatch {
            title: req.title.as_deref(),
            template_id: req.template_id.as_deref(),
            content: content.as_ref(),
            thumbnail: req.thumbnail.as_deref(),
        },
    )
    .await?;
    Ok(Json(doc))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    fetch_owned(&state.db, id, params.user_id).await?;
    storage::delete_resume(&state.db, id).await?;
    info!(resume_id = %id, "deleted resume");
    Ok(StatusCode::NO_CONTENT)
}
