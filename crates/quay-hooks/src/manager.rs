use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use crate::context::HooksContext;

/// Owns every live hooks session, keyed by an opaque session id.
///
/// Backs the control plane: create on "new session", tear down on "close
/// session". All counters and barriers share their session's lifetime.
pub struct HooksManager {
    sessions: DashMap<String, Arc<HooksContext>>,
}

impl HooksManager {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Construct a fresh hooks context and return its session id.
    pub fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions
            .insert(id.clone(), Arc::new(HooksContext::with_id(id.clone())));
        info!(session = %id, "hooks session created");
        id
    }

    pub fn get(&self, id: &str) -> Option<Arc<HooksContext>> {
        self.sessions.get(id).map(|entry| entry.clone())
    }

    /// Tear the session down; queued barrier waiters receive a cancellation
    /// error. Returns false when the id is unknown.
    pub fn close_session(&self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some((_, context)) => {
                context.close();
                info!(session = %id, "hooks session closed");
                true
            }
            None => false,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for HooksManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let manager = HooksManager::new();

        let id = manager.create_session();
        assert!(manager.get(&id).is_some());
        assert_eq!(manager.session_count(), 1);

        assert!(manager.close_session(&id));
        assert!(manager.get(&id).is_none());
        assert!(!manager.close_session(&id));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let manager = HooksManager::new();
        let a = manager.get(&manager.create_session()).unwrap();
        let b = manager.get(&manager.create_session()).unwrap();

        a.counter("n").update(3);
        assert_eq!(a.counter("n").get(), 3);
        assert_eq!(b.counter("n").get(), 0);
    }
}
