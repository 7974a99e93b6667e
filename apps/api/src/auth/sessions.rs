//! Login sessions: opaque random tokens in Redis pointing at a user id.

use rand::{distr::Alphanumeric, Rng};
use redis::Client as RedisClient;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;

const TOKEN_LEN: usize = 48;

fn session_key(token: &str) -> String {
    format!("session:{token}")
}

pub fn new_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub async fn create_session(
    redis: &RedisClient,
    user_id: Uuid,
    ttl_secs: u64,
) -> Result<String, AppError> {
    let token = new_token();
    let mut conn = redis.get_multiplexed_async_connection().await?;
    redis::cmd("SET")
        .arg(session_key(&token))
        .arg(user_id.to_string())
        .arg("EX")
        .arg(ttl_secs)
        .query_async::<_, ()>(&mut conn)
        .await?;
    debug!("Created session for user {user_id}");
    Ok(token)
}

/// `None` for unknown, expired or corrupted sessions.
pub async fn lookup_session(redis: &RedisClient, token: &str) -> Result<Option<Uuid>, AppError> {
    if token.len() != TOKEN_LEN || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Ok(None);
    }
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let value: Option<String> = redis::cmd("GET")
        .arg(session_key(token))
        .query_async(&mut conn)
        .await?;
    Ok(value.and_then(|v| Uuid::parse_str(&v).ok()))
}

pub async fn destroy_session(redis: &RedisClient, token: &str) -> Result<(), AppError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    redis::cmd("DEL")
        .arg(session_key(token))
        .query_async::<_, ()>(&mut conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_long_and_unique() {
        let a = new_token();
        let b = new_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_malformed_token_short_circuits_without_redis() {
        // Nothing listens on this port; a lookup that reached Redis would error.
        let client = RedisClient::open("redis://127.0.0.1:1/").unwrap();
        assert_eq!(lookup_session(&client, "short").await.unwrap(), None);
        assert_eq!(lookup_session(&client, &format!("{}!", "x".repeat(47))).await.unwrap(), None);
    }
}
