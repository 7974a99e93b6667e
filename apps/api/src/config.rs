use anyhow::{Context, Result};

const DEFAULT_ADMIN_EMAIL: &str = "admin@resumearchitect.app";
const DEFAULT_FREE_DOWNLOAD_LIMIT: i32 = 3;
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 30;
const DEFAULT_WORKSPACE_IDLE_SECS: u64 = 60 * 60 * 2;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// The single operator account allowed to approve payments.
    pub admin_email: String,
    pub free_download_limit: i32,
    pub session_ttl_secs: u64,
    /// Editing sessions idle this long are dropped from memory.
    pub workspace_idle_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string())
                .to_lowercase(),
            free_download_limit: parse_env("FREE_DOWNLOAD_LIMIT", DEFAULT_FREE_DOWNLOAD_LIMIT)?,
            session_ttl_secs: parse_env("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
            workspace_idle_secs: parse_env("WORKSPACE_IDLE_SECS", DEFAULT_WORKSPACE_IDLE_SECS)?,
        })
    }

    pub fn is_admin(&self, email: &str) -> bool {
        email.eq_ignore_ascii_case(&self.admin_email)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/resume_test".into(),
        redis_url: "redis://127.0.0.1/".into(),
        s3_bucket: "resumes-test".into(),
        s3_endpoint: "http://127.0.0.1:9000".into(),
        aws_access_key_id: "test".into(),
        aws_secret_access_key: "test".into(),
        anthropic_api_key: "test".into(),
        port: 8080,
        rust_log: "info".into(),
        admin_email: DEFAULT_ADMIN_EMAIL.into(),
        free_download_limit: DEFAULT_FREE_DOWNLOAD_LIMIT,
        session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        workspace_idle_secs: DEFAULT_WORKSPACE_IDLE_SECS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_match_ignores_case() {
        let config = test_config();
        assert!(config.is_admin("Admin@ResumeArchitect.app"));
        assert!(!config.is_admin("jane@example.com"));
    }

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let value: i32 = parse_env("RESUME_API_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
