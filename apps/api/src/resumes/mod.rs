//! Saved resumes: metadata in Postgres, the HTML body in S3.

pub mod handlers;

use std::future::Future;

use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::resume::ResumeRow;
use crate::templates::TemplateId;

pub fn body_key(user_id: Uuid, resume_id: Uuid) -> String {
    format!("resumes/{user_id}/{resume_id}.html")
}

pub struct NewResume<'a> {
    pub user_id: Uuid,
    pub candidate_name: &'a str,
    pub template: TemplateId,
    pub html: &'a str,
}

pub async fn save_resume(
    pool: &PgPool,
    s3: &S3Client,
    s3_bucket: &str,
    resume: NewResume<'_>,
) -> Result<ResumeRow> {
    let id = Uuid::new_v4();
    let s3_key = body_key(resume.user_id, id);

    s3.put_object()
        .bucket(s3_bucket)
        .key(&s3_key)
        .body(ByteStream::from(resume.html.as_bytes().to_vec()))
        .content_type("text/html; charset=utf-8")
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

    info!("Uploaded resume body to s3://{}/{}", s3_bucket, s3_key);

    let inserted = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (id, user_id, candidate_name, template, s3_key)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(resume.user_id)
    .bind(resume.candidate_name)
    .bind(resume.template.slug())
    .bind(&s3_key)
    .fetch_one(pool)
    .await
    .context("Failed to record saved resume");

    // The body is orphaned without its row.
    cleanup_on_error(inserted, || delete_body(s3, s3_bucket, &s3_key)).await
}

/// Runs `cleanup` when `result` failed, then hands `result` back unchanged.
/// A failing cleanup is logged, never reported over the original error.
async fn cleanup_on_error<T, F, Fut>(result: Result<T>, cleanup: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    if let Err(e) = &result {
        warn!("Save failed, removing uploaded body: {e:#}");
        if let Err(cleanup_err) = cleanup().await {
            warn!("Cleanup after failed save also failed: {cleanup_err:#}");
        }
    }
    result
}

async fn delete_body(s3: &S3Client, s3_bucket: &str, s3_key: &str) -> Result<()> {
    s3.delete_object()
        .bucket(s3_bucket)
        .key(s3_key)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("S3 delete failed: {e}"))?;
    info!("Deleted s3://{}/{}", s3_bucket, s3_key);
    Ok(())
}

pub async fn list_resumes(pool: &PgPool, user_id: Uuid) -> Result<Vec<ResumeRow>> {
    Ok(sqlx::query_as::<_, ResumeRow>(
        "SELECT * FROM resumes WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

pub async fn get_resume(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<ResumeRow>> {
    Ok(
        sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn load_body(s3: &S3Client, s3_bucket: &str, s3_key: &str) -> Result<String> {
    let object = s3
        .get_object()
        .bucket(s3_bucket)
        .key(s3_key)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("S3 download failed: {e}"))?;
    let bytes = object
        .body
        .collect()
        .await
        .context("Failed to read resume body")?
        .into_bytes();
    String::from_utf8(bytes.to_vec()).context("Resume body is not UTF-8")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_failed_insert_removes_uploaded_body() {
        let cleanups = AtomicUsize::new(0);
        let failed: Result<i32> = Err(anyhow::anyhow!("unique violation"));
        let result = cleanup_on_error(failed, || async {
            cleanups.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;
        assert_eq!(result.unwrap_err().to_string(), "unique violation");
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_successful_insert_keeps_body() {
        let cleanups = AtomicUsize::new(0);
        let result = cleanup_on_error(Ok(7), || async {
            cleanups.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(cleanups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cleanup_failure_keeps_original_error() {
        let failed: Result<()> = Err(anyhow::anyhow!("db down"));
        let result = cleanup_on_error(failed, || async { Err(anyhow::anyhow!("s3 down")) }).await;
        assert_eq!(result.unwrap_err().to_string(), "db down");
    }

    #[test]
    fn test_body_key_is_scoped_by_user() {
        let user = Uuid::nil();
        let resume = Uuid::from_u128(1);
        assert_eq!(
            body_key(user, resume),
            "resumes/00000000-0000-0000-0000-000000000000/00000000-0000-0000-0000-000000000001.html"
        );
    }
}
