use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::resume::ResumeDocument;

pub async fn list_resumes(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ResumeDocument>, sqlx::Error> {
    sqlx::query_as::<_, ResumeDocument>(
        "SELECT * FROM resumes WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn get_resume(pool: &PgPool, id: Uuid) -> Result<Option<ResumeDocument>, sqlx::Error> {
    sqlx::query_as::<_, ResumeDocument>("SELECT * FROM resumes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Inserts a new document. The server assigns id and timestamps; `content`
/// must already be normalized by the schema validator.
pub async fn insert_resume(
    pool: &PgPool,
    user_id: Uuid,
    title: &str,
    template_id: &str,
    content: &Value,
) -> Result<ResumeDocument, sqlx::Error> {
    sqlx::query_as::<_, ResumeDocument>(
        r#"
        INSERT INTO resumes (id, user_id, title, template_id, content, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(title)
    .bind(template_id)
    .bind(content)
    .fetch_one(pool)
    .await
}

/// Fields of a partial update; `None` leaves the stored value in place.
pub struct ResumePatch<'a> {
    pub title: Option<&'a str>,
    pub template_id: Option<&'a str>,
    pub content: Option<&'a Value>,
    pub thumbnail: Option<&'a str>,
}

pub async fn update_resume(
    pool: &PgPool,
    id: Uuid,
    patch: ResumePatch<'_>,
) -> Result<ResumeDocument, sqlx::Error> {
    sqlx::query_as::<_, ResumeDocument>(
        r#"
        UPDATE resumes
        SET title = COALESCE($2, title),
            template_id = COALESCE($3, template_id),
            content = COALESCE($4, content),
            thumbnail = COALESCE($5, thumbnail),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(patch.title)
    .bind(patch.template_id)
    .bind(patch.content)
    .bind(patch.thumbnail)
    .fetch_one(pool)
    .await
}

/// Hard delete, no soft-delete or versioning.
pub async fn delete_resume(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM resumes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
