//! Concurrent registry of live sessions.

use crate::scheduler::ExpiryScheduler;
use crate::session::{Session, SessionKind};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::info;

/// Thread-safe session storage.
pub type Sessions = Arc<RwLock<HashMap<String, Session>>>;

/// Remove a session entry. Returns whether anything was removed.
pub(crate) async fn remove_session(sessions: &Sessions, session_id: &str) -> bool {
    sessions.write().await.remove(session_id).is_some()
}

/// Registry of time-boxed sessions keyed by an opaque id.
///
/// Every read re-checks the deadline, so a record the scheduler has not swept
/// yet is still reported absent once it is past `end_time`.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Sessions,
    scheduler: Arc<ExpiryScheduler>,
    ttl: Duration,
}

impl SessionStore {
    /// Create an empty store. Must be called from within a Tokio runtime.
    pub fn new(ttl: Duration) -> Self {
        let sessions: Sessions = Arc::new(RwLock::new(HashMap::new()));
        let scheduler = Arc::new(ExpiryScheduler::spawn(sessions.clone()));
        Self {
            sessions,
            scheduler,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Allocate a session and arm its eviction. Returns the new id.
    pub async fn create(&self, lab_id: &str, user_id: &str, kind: SessionKind) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        let session = Session::new(session_id.clone(), lab_id, user_id, kind, self.ttl);
        let deadline = session.deadline;

        self.sessions
            .write()
            .await
            .insert(session_id.clone(), session);
        self.scheduler.arm(&session_id, deadline).await;

        info!(session_id = %session_id, lab_id, user_id, kind = %kind, "Created session");
        session_id
    }

    /// Snapshot of the session, if present and before its deadline.
    pub async fn get(&self, session_id: &str) -> Option<Session> {
        let now = Instant::now();
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .filter(|s| s.is_live_at(now))
            .cloned()
    }

    /// Remove the session if present. Repeated calls are no-ops.
    pub async fn delete(&self, session_id: &str) -> bool {
        let removed = remove_session(&self.sessions, session_id).await;
        if removed {
            info!(session_id, "Deleted session");
        }
        removed
    }

    /// Live sessions belonging to `user_id`, oldest first.
    pub async fn list_by_user(&self, user_id: &str) -> Vec<Session> {
        let now = Instant::now();
        let sessions = self.sessions.read().await;
        let mut list: Vec<Session> = sessions
            .values()
            .filter(|s| s.user_id == user_id && s.is_live_at(now))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        list
    }

    /// Apply `mutate` to a live session. A missing or expired session makes
    /// this a silent no-op; the return value says whether it was applied.
    pub async fn update<F>(&self, session_id: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(session) if session.is_live_at(now) => {
                mutate(session);
                true
            }
            _ => false,
        }
    }

    /// Number of stored records, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const TTL: Duration = Duration::from_secs(14 * 60);

    #[tokio::test]
    async fn test_create_and_get() {
        let store = SessionStore::new(TTL);
        let id = store.create("lab-1", "alice", SessionKind::Interpreted).await;

        let session = store.get(&id).await.expect("live session");
        assert_eq!(session.id, id);
        assert_eq!(session.lab_id, "lab-1");
        assert_eq!(session.user_id, "alice");
        assert_eq!((session.end_time - session.start_time).to_std().unwrap(), TTL);
        assert!(session.executions.is_empty());
        assert!(session.sandbox.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_reports_absent_at_deadline() {
        let store = SessionStore::new(TTL);
        let id = store.create("lab", "alice", SessionKind::SandboxedWeb).await;

        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        assert!(store.get(&id).await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(store.get(&id).await.is_none());
        assert!(store.list_by_user("alice").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_sweeps_expired_records() {
        let store = SessionStore::new(Duration::from_secs(5));
        store.create("lab", "alice", SessionKind::Interpreted).await;
        assert_eq!(store.len().await, 1);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = SessionStore::new(TTL);
        let id = store.create("lab", "alice", SessionKind::Interpreted).await;

        assert!(store.delete(&id).await);
        assert!(!store.delete(&id).await);
        assert!(!store.delete("never-existed").await);
        assert!(store.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_update_after_delete_is_noop() {
        let store = SessionStore::new(TTL);
        let id = store.create("lab", "alice", SessionKind::Interpreted).await;
        store.delete(&id).await;

        let applied = store.update(&id, |s| s.lab_id = "changed".into()).await;
        assert!(!applied);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_by_user_has_no_cross_user_leakage() {
        let store = SessionStore::new(TTL);
        let a1 = store.create("lab", "alice", SessionKind::Interpreted).await;
        let a2 = store.create("lab", "alice", SessionKind::SandboxedWeb).await;
        let b1 = store.create("lab", "bob", SessionKind::Interpreted).await;

        let alice: HashSet<String> = store
            .list_by_user("alice")
            .await
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(alice, HashSet::from([a1, a2]));

        let bob = store.list_by_user("bob").await;
        assert_eq!(bob.len(), 1);
        assert_eq!(bob[0].id, b1);
        assert!(store.list_by_user("carol").await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_yield_distinct_ids() {
        let store = SessionStore::new(TTL);
        let mut handles = Vec::new();
        for n in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let user = format!("user-{n}");
                let id = store.create("lab", &user, SessionKind::Interpreted).await;
                (user, id)
            }));
        }

        let mut ids = HashSet::new();
        let mut created = Vec::new();
        for handle in handles {
            let (user, id) = handle.await.unwrap();
            ids.insert(id.clone());
            created.push((user, id));
        }
        assert_eq!(ids.len(), 32);

        for (user, id) in created {
            let sessions = store.list_by_user(&user).await;
            assert_eq!(sessions.len(), 1);
            assert_eq!(sessions[0].id, id);
            assert_eq!(sessions[0].user_id, user);
        }
    }
}
