//! Session Resolver - token → claims → probes → one session

use chrono::Utc;
use freetag_core::{KeyValueStore, STORAGE_KEY_LOGIN_ROLE, STORAGE_KEY_TOKEN};
use futures::future::join_all;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::cache::SessionCache;
use crate::claims::{ClaimsDecoder, TokenRole, UnverifiedJwtDecoder};
use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::probe::{ProbeKind, ProbePlan, SessionBackend};
use crate::scope::PageScope;
use crate::session::CurrentSession;

/// Where the user lands after logging out
pub const LOGOUT_REDIRECT: &str = "/login";

/// Observable resolver state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResolverState {
    /// No stored token
    #[default]
    Idle,
    /// Reading claims from the stored token
    Decoding,
    /// Waiting for every dispatched lookup to settle
    Probing(Vec<ProbeKind>),
    /// Exactly one session chosen
    Resolved(CurrentSession),
}

/// Resolves the current session from the stored bearer token
///
/// One instance is shared by every consumer on a page. It reads the
/// token store, decodes claims (unverified), issues only the lookups the
/// role claim warrants, and applies fixed precedence once all of them
/// have settled. Malformed tokens and failed lookups degrade silently to
/// [`CurrentSession::None`].
///
/// Login and logout start a new generation. A resolution that began in an
/// earlier generation publishes nothing: no cache entry, no state change.
pub struct SessionResolver {
    store: Arc<dyn KeyValueStore>,
    backend: Arc<dyn SessionBackend>,
    decoder: Arc<dyn ClaimsDecoder>,
    cache: SessionCache,
    config: SessionConfig,
    state: RwLock<ResolverState>,
    generation: Mutex<u64>,
}

impl SessionResolver {
    /// Create a resolver with the default unverified JWT decoder
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn SessionBackend>,
        config: SessionConfig,
    ) -> Self {
        Self::with_decoder(store, backend, Arc::new(UnverifiedJwtDecoder), config)
    }

    /// Create a resolver with a custom claims decoder
    pub fn with_decoder(
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn SessionBackend>,
        decoder: Arc<dyn ClaimsDecoder>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            backend,
            decoder,
            cache: SessionCache::new(config.cache_ttl()),
            config,
            state: RwLock::new(ResolverState::Idle),
            generation: Mutex::new(0),
        }
    }

    /// Current state of the resolver
    pub fn state(&self) -> ResolverState {
        self.state
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn set_state(&self, state: ResolverState) {
        let mut current = match self.state.write() {
            Ok(current) => current,
            Err(poisoned) => poisoned.into_inner(),
        };
        *current = state;
    }

    fn lock_generation(&self) -> MutexGuard<'_, u64> {
        match self.generation.lock() {
            Ok(generation) => generation,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Set `state` only if no login or logout happened since `generation`
    fn advance(&self, generation: u64, state: ResolverState) -> bool {
        let current = self.lock_generation();
        if *current != generation {
            return false;
        }
        self.set_state(state);
        true
    }

    /// Stored bearer token, if any
    pub fn token(&self) -> Option<String> {
        self.store
            .get(STORAGE_KEY_TOKEN)
            .filter(|t| !t.trim().is_empty())
    }

    /// Cached session for the stored token, without any lookup
    pub fn cached(&self) -> Option<CurrentSession> {
        let token = self.token()?;
        self.cache.get(&token)
    }

    /// Resolve the current session
    ///
    /// Never fails: every error path ends in `CurrentSession::None`. A
    /// resolution overtaken by login or logout returns `None` as well.
    pub async fn resolve(&self) -> CurrentSession {
        let generation = *self.lock_generation();
        let Some(token) = self.token() else {
            self.advance(generation, ResolverState::Idle);
            return CurrentSession::None;
        };

        if let Some(session) = self.cache.get(&token) {
            tracing::debug!("Session served from cache");
            if self.advance(generation, ResolverState::Resolved(session.clone())) {
                return session;
            }
            return CurrentSession::None;
        }

        self.advance(generation, ResolverState::Decoding);
        let Some(claims) = self.decoder.decode(&token) else {
            tracing::debug!("Stored token is malformed, treating as unauthenticated");
            return self.finish(generation, &token, CurrentSession::None);
        };
        if claims.is_expired(Utc::now()) {
            tracing::debug!(
                exp = ?claims.exp,
                "Stored token is expired, treating as unauthenticated"
            );
            return self.finish(generation, &token, CurrentSession::None);
        }

        let plan = ProbePlan::for_claim(claims.role, self.config.probe_all_when_unclaimed);
        self.advance(generation, ResolverState::Probing(plan.kinds().to_vec()));
        tracing::debug!(role = ?claims.role, probes = ?plan.kinds(), "Probing session endpoints");

        // Wait for every probe: a slower higher-precedence answer must win.
        let results = join_all(
            plan.kinds()
                .iter()
                .map(|kind| self.run_probe(*kind, &token)),
        )
        .await;

        let session = CurrentSession::pick(results.into_iter().flatten());
        self.finish(generation, &token, session)
    }

    /// Resolve under a page scope
    ///
    /// Returns `None` if the scope is cancelled first; in that case
    /// in-flight lookups are dropped and nothing is cached.
    pub async fn resolve_in(&self, scope: &PageScope) -> Option<CurrentSession> {
        if scope.is_cancelled() {
            return None;
        }

        tokio::select! {
            biased;
            _ = scope.cancelled() => {
                tracing::debug!("Page scope cancelled, abandoning session resolution");
                self.set_state(ResolverState::Idle);
                None
            }
            session = self.resolve() => Some(session),
        }
    }

    async fn run_probe(&self, kind: ProbeKind, token: &str) -> Option<CurrentSession> {
        match self.backend.probe(kind, token).await {
            Ok(Some(session)) => {
                tracing::debug!(endpoint = kind.endpoint(), "Session probe matched");
                Some(session)
            }
            Ok(None) => {
                tracing::debug!(endpoint = kind.endpoint(), "Session probe does not apply");
                None
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = kind.endpoint(),
                    error = %e,
                    "Session probe failed, role treated as not applicable"
                );
                None
            }
        }
    }

    fn finish(&self, generation: u64, token: &str, session: CurrentSession) -> CurrentSession {
        let current = self.lock_generation();
        if *current != generation || self.token().as_deref() != Some(token) {
            tracing::debug!("Session changed while resolving, discarding result");
            return CurrentSession::None;
        }

        if session.is_authenticated() {
            self.cache.store(token, session.clone());
        }
        tracing::info!(authenticated = session.is_authenticated(), "Session resolved");
        self.set_state(ResolverState::Resolved(session.clone()));
        session
    }

    /// Store a freshly issued token and the role the user logged in as
    pub fn login(&self, token: &str, login_role: Option<TokenRole>) -> SessionResult<()> {
        let mut generation = self.lock_generation();
        *generation += 1;
        self.cache.clear();
        self.set_state(ResolverState::Idle);
        self.store.set(STORAGE_KEY_TOKEN, token)?;
        match login_role {
            Some(role) => self.store.set(STORAGE_KEY_LOGIN_ROLE, &role.to_string())?,
            None => self.store.remove(STORAGE_KEY_LOGIN_ROLE)?,
        }
        Ok(())
    }

    /// Role chosen at the last login
    pub fn login_role(&self) -> Option<TokenRole> {
        self.store
            .get(STORAGE_KEY_LOGIN_ROLE)
            .and_then(|r| r.parse().ok())
    }

    /// Log out
    ///
    /// Evicts the cached session, then removes the token and login role,
    /// all before returning the redirect path. No stale session is
    /// observable once this returns, including one from a resolution
    /// still in flight.
    pub fn logout(&self) -> SessionResult<&'static str> {
        let mut generation = self.lock_generation();
        *generation += 1;
        self.cache.clear();
        self.set_state(ResolverState::Idle);
        self.store.remove(STORAGE_KEY_TOKEN)?;
        self.store.remove(STORAGE_KEY_LOGIN_ROLE)?;
        tracing::info!("Logged out, session state cleared");
        Ok(LOGOUT_REDIRECT)
    }
}
