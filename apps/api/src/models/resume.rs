use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A saved resume. The HTML body lives in S3 under `s3_key`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub candidate_name: String,
    pub template: String,
    pub s3_key: String,
    pub created_at: DateTime<Utc>,
}
