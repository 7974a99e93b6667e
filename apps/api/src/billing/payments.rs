//! Manual payment verification. Submitting a transaction id grants premium
//! provisionally; the operator later approves or rejects it.

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::user::{PaymentStatus, User};

const MAX_TRANSACTION_ID_LEN: usize = 128;

pub fn validate_transaction_id(raw: &str) -> Option<&str> {
    let id = raw.trim();
    let valid = !id.is_empty()
        && id.len() <= MAX_TRANSACTION_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(id)
}

pub async fn submit_upgrade(pool: &PgPool, user_id: Uuid, transaction_id: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET transaction_id = $2, payment_status = $3, is_premium = TRUE
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(transaction_id)
    .bind(PaymentStatus::Pending.as_str())
    .fetch_optional(pool)
    .await?;
    info!("User {user_id} submitted payment {transaction_id}");
    Ok(user)
}

/// Approve keeps premium; reject revokes it.
pub async fn review_payment(pool: &PgPool, user_id: Uuid, approve: bool) -> Result<Option<User>> {
    let status = if approve {
        PaymentStatus::Approved
    } else {
        PaymentStatus::Rejected
    };
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET payment_status = $2, is_premium = $3 WHERE id = $1 RETURNING *",
    )
    .bind(user_id)
    .bind(status.as_str())
    .bind(approve)
    .fetch_optional(pool)
    .await?;
    info!("Payment for user {user_id} marked {}", status.as_str());
    Ok(user)
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>> {
    Ok(sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        ORDER BY (payment_status = 'pending') DESC, created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_validation() {
        assert_eq!(validate_transaction_id("  TXN-123_abc "), Some("TXN-123_abc"));
        assert_eq!(validate_transaction_id(""), None);
        assert_eq!(validate_transaction_id("drop table; --"), None);
        assert_eq!(validate_transaction_id(&"a".repeat(200)), None);
    }
}
