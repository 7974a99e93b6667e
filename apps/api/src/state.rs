use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::ai::ResumeAi;
use crate::config::Config;
use crate::workspace::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Login sessions (`session:<token>` keys).
    pub redis: RedisClient,
    /// Saved resume bodies.
    pub s3: S3Client,
    /// Pluggable AI backend. Default: ClaudeResumeAi.
    pub ai: Arc<dyn ResumeAi>,
    pub config: Config,
    /// Open editing sessions, in memory only.
    pub sessions: SessionRegistry,
}
