use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

/// How long a toast stays visible.
pub const TOAST_TTL_SECS: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Info,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub id: Uuid,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: ToastKind,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    fn expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= Duration::seconds(TOAST_TTL_SECS)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn push(&mut self, kind: ToastKind, text: impl Into<String>) -> Uuid {
        self.push_at(kind, text, Utc::now())
    }

    pub fn push_at(&mut self, kind: ToastKind, text: impl Into<String>, now: DateTime<Utc>) -> Uuid {
        let toast = Toast {
            id: Uuid::new_v4(),
            text: text.into(),
            kind,
            created_at: now,
        };
        let id = toast.id;
        self.toasts.push(toast);
        id
    }

    pub fn info(&mut self, text: impl Into<String>) -> Uuid {
        self.push(ToastKind::Info, text)
    }

    pub fn error(&mut self, text: impl Into<String>) -> Uuid {
        self.push(ToastKind::Error, text)
    }

    pub fn success(&mut self, text: impl Into<String>) -> Uuid {
        self.push(ToastKind::Success, text)
    }

    /// Drops expired toasts and returns the rest, oldest first.
    pub fn active_at(&mut self, now: DateTime<Utc>) -> Vec<Toast> {
        self.toasts.retain(|t| !t.expired(now));
        self.toasts.clone()
    }

    pub fn active(&mut self) -> Vec<Toast> {
        self.active_at(Utc::now())
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire_after_four_seconds() {
        let start = Utc::now();
        let mut queue = ToastQueue::default();
        queue.push_at(ToastKind::Info, "Architecting your data...", start);
        queue.push_at(ToastKind::Success, "Architecture complete!", start + Duration::seconds(3));

        assert_eq!(queue.active_at(start + Duration::milliseconds(3999)).len(), 2);
        let remaining = queue.active_at(start + Duration::seconds(4));
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].text, "Architecture complete!");
        assert!(queue.active_at(start + Duration::seconds(8)).is_empty());
    }

    #[test]
    fn test_toast_serializes_kind_as_type() {
        let mut queue = ToastQueue::default();
        queue.error("Structure failed.");
        let json = serde_json::to_value(queue.latest().unwrap()).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["text"], "Structure failed.");
    }
}
