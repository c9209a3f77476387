use crate::algorithms::Recommender;
use crate::config::SessionConfig;
use crate::models::Dataset;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// An uploaded dataset and, once compiled, the recommender fitted on it.
///
/// Sessions are immutable; compiling stores a new session under the same id.
#[derive(Debug, Clone)]
pub struct Session {
    pub dataset: Arc<Dataset>,
    pub recommender: Option<Arc<Recommender>>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            recommender: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_recommender(&self, recommender: Recommender) -> Self {
        Self {
            dataset: Arc::clone(&self.dataset),
            recommender: Some(Arc::new(recommender)),
            created_at: self.created_at,
        }
    }
}

/// Session-id to session mapping owned by the service layer.
pub trait SessionStore: Send + Sync {
    fn get(&self, id: &Uuid) -> Option<Arc<Session>>;
    fn put(&self, id: Uuid, session: Arc<Session>);
    /// Swaps in `session` only while `id` still holds `expected`; false when
    /// the entry was closed, expired or replaced in the meantime.
    fn replace(&self, id: &Uuid, expected: &Arc<Session>, session: Arc<Session>) -> bool;
    fn evict(&self, id: &Uuid) -> Option<Arc<Session>>;
    /// Drops idle sessions and returns how many went.
    fn evict_expired(&self) -> usize;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Entry {
    session: Arc<Session>,
    last_accessed: DateTime<Utc>,
    last_used: u64,
}

/// Process-local store with idle expiry and least-recently-used eviction.
pub struct InMemorySessionStore {
    sessions: DashMap<Uuid, Entry>,
    ttl: Duration,
    max_sessions: usize,
    clock: AtomicU64,
}

impl InMemorySessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::from_secs(config.ttl_seconds),
            max_sessions: config.max_sessions.max(1),
            clock: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        match (now - entry.last_accessed).to_std() {
            Ok(idle) => idle >= self.ttl,
            Err(_) => false,
        }
    }

    fn evict_least_recent(&self, keep: &Uuid) -> Option<Uuid> {
        let oldest = self
            .sessions
            .iter()
            .filter(|entry| entry.key() != keep)
            .min_by_key(|entry| entry.value().last_used)
            .map(|entry| *entry.key())?;

        self.sessions.remove(&oldest);
        Some(oldest)
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        let now = Utc::now();
        if let Some(mut entry) = self.sessions.get_mut(id) {
            if !self.is_expired(&entry, now) {
                entry.last_accessed = now;
                entry.last_used = self.tick();
                return Some(Arc::clone(&entry.session));
            }
        }

        if self
            .sessions
            .remove_if(id, |_, entry| self.is_expired(entry, now))
            .is_some()
        {
            debug!("Session {} expired", id);
        }
        None
    }

    fn put(&self, id: Uuid, session: Arc<Session>) {
        let entry = Entry {
            session,
            last_accessed: Utc::now(),
            last_used: self.tick(),
        };
        self.sessions.insert(id, entry);

        while self.sessions.len() > self.max_sessions {
            match self.evict_least_recent(&id) {
                Some(evicted) => info!("Evicted least recently used session {}", evicted),
                None => break,
            }
        }
    }

    fn replace(&self, id: &Uuid, expected: &Arc<Session>, session: Arc<Session>) -> bool {
        let now = Utc::now();
        match self.sessions.get_mut(id) {
            Some(mut entry)
                if Arc::ptr_eq(&entry.session, expected) && !self.is_expired(&entry, now) =>
            {
                entry.session = session;
                entry.last_accessed = now;
                entry.last_used = self.tick();
                true
            }
            _ => false,
        }
    }

    fn evict(&self, id: &Uuid) -> Option<Arc<Session>> {
        self.sessions.remove(id).map(|(_, entry)| entry.session)
    }

    fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;
        self.sessions.retain(|_, entry| {
            let keep = !self.is_expired(entry, now);
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            info!("Evicted {} expired sessions", removed);
        }
        removed
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    fn session() -> Arc<Session> {
        let dataset = Dataset::new(vec!["title".into()], vec![vec![Value::from("A")]]).unwrap();
        Arc::new(Session::new(dataset))
    }

    fn store(ttl_seconds: u64, max_sessions: usize) -> InMemorySessionStore {
        InMemorySessionStore::new(&SessionConfig {
            ttl_seconds,
            max_sessions,
            sweep_interval_seconds: 60,
        })
    }

    #[test]
    fn test_put_get_evict() {
        let store = store(3600, 8);
        let id = Uuid::new_v4();
        assert!(store.get(&id).is_none());

        store.put(id, session());
        assert!(store.get(&id).is_some());
        assert_eq!(store.len(), 1);

        assert!(store.evict(&id).is_some());
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let store = store(3600, 2);
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        store.put(a, session());
        store.put(b, session());
        assert!(store.get(&a).is_some());
        store.put(c, session());

        assert_eq!(store.len(), 2);
        assert!(store.get(&a).is_some());
        assert!(store.get(&b).is_none());
        assert!(store.get(&c).is_some());
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let store = store(0, 8);
        let id = Uuid::new_v4();
        store.put(id, session());
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());

        store.put(Uuid::new_v4(), session());
        store.put(Uuid::new_v4(), session());
        assert_eq!(store.evict_expired(), 2);
    }

    #[test]
    fn test_replace_only_swaps_the_expected_session() {
        let store = store(3600, 8);
        let id = Uuid::new_v4();
        let first = session();
        store.put(id, first.clone());

        let second = session();
        assert!(!store.replace(&id, &second, session()));
        assert!(store.replace(&id, &first, second.clone()));
        assert!(Arc::ptr_eq(&store.get(&id).unwrap(), &second));

        store.evict(&id);
        assert!(!store.replace(&id, &second, session()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_with_recommender_keeps_dataset() {
        use crate::config::Config;
        use crate::models::{CompileSpec, ContentRoles};

        let original = session();
        let spec = CompileSpec::ContentBased(ContentRoles {
            input_columns: vec!["title".into()],
            output_column: "title".into(),
        });
        let compiled = original.with_recommender(Recommender::new(spec, &Config::default()));
        assert!(Arc::ptr_eq(&original.dataset, &compiled.dataset));
        assert!(compiled.recommender.is_some());
        assert!(original.recommender.is_none());
    }
}
