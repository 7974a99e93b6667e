use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::workspace::Workspace;

pub type SharedWorkspace = Arc<Mutex<Workspace>>;

/// Sessions untouched for this long are dropped.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

struct Entry {
    owner: Uuid,
    workspace: SharedWorkspace,
    last_seen: Instant,
}

/// In-memory editing sessions keyed by id. Each session has one owner and
/// its own lock, so one user's actions run one at a time. Idle sessions
/// are evicted after `idle_ttl`.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
    idle_ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TTL)
    }
}

impl SessionRegistry {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub async fn create(&self, owner: Uuid) -> (Uuid, SharedWorkspace) {
        self.evict_idle().await;

        let workspace = Workspace::new(owner);
        let id = workspace.id();
        let shared = Arc::new(Mutex::new(workspace));
        self.sessions.write().await.insert(
            id,
            Entry {
                owner,
                workspace: shared.clone(),
                last_seen: Instant::now(),
            },
        );
        info!("Opened editing session {id} for user {owner}");
        (id, shared)
    }

    /// `None` for unknown or expired sessions and for sessions owned by
    /// someone else. A hit counts as activity.
    pub async fn get(&self, id: Uuid, owner: Uuid) -> Option<SharedWorkspace> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&id) {
            Some(entry) if entry.owner == owner && entry.last_seen.elapsed() < self.idle_ttl => {
                entry.last_seen = Instant::now();
                return Some(entry.workspace.clone());
            }
            Some(entry) if entry.owner == owner => {}
            _ => return None,
        }
        sessions.remove(&id);
        info!("Editing session {id} expired");
        None
    }

    pub async fn remove(&self, id: Uuid, owner: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(&id) {
            Some(entry) if entry.owner == owner => {
                sessions.remove(&id);
                info!("Closed editing session {id}");
                true
            }
            _ => false,
        }
    }

    /// Drops every session idle for at least `idle_ttl`. Returns how many went.
    pub async fn evict_idle(&self) -> usize {
        let ttl = self.idle_ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() < ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {evicted} idle editing sessions");
        }
        evicted
    }

    /// Background sweep; runs until the runtime shuts down.
    pub fn spawn_reaper(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                registry.evict_idle().await;
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
