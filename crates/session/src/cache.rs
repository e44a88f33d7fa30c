//! Resolved-session cache with a freshness window

use std::sync::RwLock;
use std::time::Duration;
use tokio::time::Instant;

use crate::session::CurrentSession;

struct CachedSession {
    token: String,
    session: CurrentSession,
    stored_at: Instant,
}

/// Holds the last resolved session for the token it was resolved from
pub struct SessionCache {
    ttl: Duration,
    entry: RwLock<Option<CachedSession>>,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Fresh cached session for `token`
    pub fn get(&self, token: &str) -> Option<CurrentSession> {
        let entry = self.entry.read().ok()?;
        let cached = entry.as_ref()?;
        if cached.token != token || cached.stored_at.elapsed() >= self.ttl {
            return None;
        }
        Some(cached.session.clone())
    }

    pub fn store(&self, token: &str, session: CurrentSession) {
        let mut entry = match self.entry.write() {
            Ok(entry) => entry,
            Err(poisoned) => poisoned.into_inner(),
        };
        *entry = Some(CachedSession {
            token: token.to_string(),
            session,
            stored_at: Instant::now(),
        });
    }

    /// Evict everything
    pub fn clear(&self) {
        let mut entry = match self.entry.write() {
            Ok(entry) => entry,
            Err(poisoned) => poisoned.into_inner(),
        };
        *entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.entry.read().map(|e| e.is_none()).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> CurrentSession {
        CurrentSession::Philanthropist {
            display_name: "Anna".to_string(),
            email: "anna@example.org".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_within_ttl() {
        let cache = SessionCache::new(Duration::from_secs(300));
        cache.store("tok", session());

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("tok"), Some(session()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("tok"), None);
    }

    #[tokio::test]
    async fn test_keyed_by_token() {
        let cache = SessionCache::new(Duration::from_secs(300));
        cache.store("tok-a", session());
        assert!(cache.get("tok-b").is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = SessionCache::new(Duration::from_secs(300));
        cache.store("tok", session());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("tok").is_none());
    }
}
