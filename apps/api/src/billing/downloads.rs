//! Download quota: free accounts get a fixed number of exports, premium is
//! unlimited, and premium templates are premium-only.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::export::{DownloadReceipt, GateError, UsageGate};
use crate::templates::TemplateId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadDenied {
    UpgradeRequired(TemplateId),
    LimitReached { downloads: i32, limit: i32 },
}

impl From<DownloadDenied> for GateError {
    fn from(denied: DownloadDenied) -> Self {
        match denied {
            DownloadDenied::UpgradeRequired(t) => GateError::UpgradeRequired(t),
            DownloadDenied::LimitReached { downloads, limit } => {
                GateError::LimitReached { downloads, limit }
            }
        }
    }
}

/// Pure quota decision over the user's current counters.
pub fn check_download(
    is_premium: bool,
    downloads: i32,
    limit: i32,
    template: TemplateId,
) -> Result<(), DownloadDenied> {
    if is_premium {
        return Ok(());
    }
    if template.is_premium() {
        return Err(DownloadDenied::UpgradeRequired(template));
    }
    if downloads >= limit {
        return Err(DownloadDenied::LimitReached { downloads, limit });
    }
    Ok(())
}

/// Atomically records one download if the quota allows it.
/// Returns the new download count.
pub async fn record_download(
    pool: &PgPool,
    user_id: Uuid,
    template: TemplateId,
    limit: i32,
) -> anyhow::Result<Result<i32, DownloadDenied>> {
    // The WHERE clause re-checks the quota so concurrent exports cannot
    // overshoot the limit.
    let updated: Option<i32> = sqlx::query_scalar(
        r#"
        UPDATE users
        SET downloads = downloads + 1
        WHERE id = $1
          AND (is_premium OR ($2 = FALSE AND downloads < $3))
        RETURNING downloads
        "#,
    )
    .bind(user_id)
    .bind(template.is_premium())
    .bind(limit)
    .fetch_optional(pool)
    .await?;

    if let Some(downloads) = updated {
        info!("User {user_id} download #{downloads} ({})", template.slug());
        return Ok(Ok(downloads));
    }

    let row: Option<(bool, i32)> =
        sqlx::query_as("SELECT is_premium, downloads FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    let Some((is_premium, downloads)) = row else {
        anyhow::bail!("user {user_id} not found");
    };

    let denied = match check_download(is_premium, downloads, limit, template) {
        Err(denied) => denied,
        // Counters moved between the two statements; report the limit.
        Ok(()) => DownloadDenied::LimitReached { downloads, limit },
    };
    warn!("Download refused for user {user_id}: {denied:?}");
    Ok(Err(denied))
}

/// `UsageGate` backed by the `users` table.
pub struct DownloadGate {
    pub pool: PgPool,
    pub user_id: Uuid,
    pub limit: i32,
}

#[async_trait]
impl UsageGate for DownloadGate {
    async fn authorize_download(&self, template: TemplateId) -> Result<DownloadReceipt, GateError> {
        match record_download(&self.pool, self.user_id, template, self.limit).await {
            Ok(Ok(downloads)) => Ok(DownloadReceipt { downloads }),
            Ok(Err(denied)) => Err(denied.into()),
            Err(e) => Err(GateError::Unavailable(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_user_within_limit_is_allowed() {
        assert_eq!(check_download(false, 0, 3, TemplateId::Sourabh), Ok(()));
        assert_eq!(check_download(false, 2, 3, TemplateId::ModernMono), Ok(()));
    }

    #[test]
    fn test_free_user_at_limit_is_refused() {
        assert_eq!(
            check_download(false, 3, 3, TemplateId::Sourabh),
            Err(DownloadDenied::LimitReached { downloads: 3, limit: 3 })
        );
    }

    #[test]
    fn test_premium_template_requires_upgrade_before_limit() {
        assert_eq!(
            check_download(false, 0, 3, TemplateId::Deloitte),
            Err(DownloadDenied::UpgradeRequired(TemplateId::Deloitte))
        );
        assert_eq!(
            check_download(false, 5, 3, TemplateId::Editorial),
            Err(DownloadDenied::UpgradeRequired(TemplateId::Editorial))
        );
    }

    #[test]
    fn test_premium_user_is_unlimited() {
        assert_eq!(check_download(true, 500, 3, TemplateId::Deloitte), Ok(()));
    }

    #[test]
    fn test_denials_map_to_gate_errors() {
        let err: GateError = DownloadDenied::LimitReached { downloads: 3, limit: 3 }.into();
        assert_eq!(err, GateError::LimitReached { downloads: 3, limit: 3 });
        let err: GateError = DownloadDenied::UpgradeRequired(TemplateId::Minimal).into();
        assert_eq!(err, GateError::UpgradeRequired(TemplateId::Minimal));
    }
}
