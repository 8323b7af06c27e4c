//! Client-side session store.
//!
//! [`SessionStore`] is the only holder of the bearer token and the
//! authenticated [`User`]. It is constructed explicitly and shared by
//! cloning the handle; there is no global instance.
//!
//! # Consistency
//!
//! - `login` and `logout` replace token and user together under one write
//!   lock, so no reader ever sees one without the other.
//! - "Authenticated" is derived from the snapshot, never stored.
//! - Every mutation is written through to the [`SessionStorage`] while the
//!   write lock is held, so saves land in mutation order. The save is
//!   synchronous; a slow backend stalls the calling task for its duration.
//!   Write failures are logged and otherwise ignored.
//!
//! # Hydration
//!
//! A fresh store is empty and un-hydrated. [`SessionStore::hydrate`] loads
//! the persisted session once and then flips `has_hydrated` to true; until
//! then callers must treat the session as unknown rather than logged out.
//! If the hydrating future is dropped before it finishes, nothing is applied
//! and the next `hydrate` call starts the load over.

pub mod storage;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{OnceCell, watch};
use tracing::{debug, info, instrument, warn};

use crate::models::{User, UserPatch};

pub use storage::{
    FileStorage, MemoryStorage, PersistedSession, STORAGE_KEY, SessionStorage, StorageError,
};

/// Point-in-time copy of the session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<SecretString>,
    pub user: Option<User>,
}

impl Session {
    /// True iff both a token and a user are present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

#[derive(Default)]
struct State {
    token: Option<SecretString>,
    user: Option<User>,
    /// Bumped by `login`/`logout`; lets hydration detect that it lost a race.
    generation: u64,
}

impl State {
    fn persisted(&self) -> PersistedSession {
        PersistedSession {
            token: self.token.as_ref().map(|t| t.expose_secret().to_owned()),
            user: self.user.clone(),
        }
    }
}

/// Shared, cloneable session store.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    state: RwLock<State>,
    storage: Arc<dyn SessionStorage>,
    hydrated: watch::Sender<bool>,
    hydration: OnceCell<()>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("SessionStore")
            .field("token", &state.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &state.user.as_ref().map(|u| &u.id))
            .field("has_hydrated", &self.has_hydrated())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create an empty, un-hydrated store backed by `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let (hydrated, _) = watch::channel(false);
        Self {
            inner: Arc::new(SessionStoreInner {
                state: RwLock::new(State::default()),
                storage,
                hydrated,
                hydration: OnceCell::new(),
            }),
        }
    }

    /// Store backed by a fresh [`MemoryStorage`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Consistent copy of token and user.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        let state = self.read();
        Session {
            token: state.token.clone(),
            user: state.user.clone(),
        }
    }

    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.read().token.clone()
    }

    /// Current principal.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    /// True iff both a token and a user are present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let state = self.read();
        state.token.is_some() && state.user.is_some()
    }

    /// Whether hydration has finished. `false` means "unknown", not "logged out".
    #[must_use]
    pub fn has_hydrated(&self) -> bool {
        *self.inner.hydrated.borrow()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Replace token and user in one step.
    ///
    /// Makes no network call; the caller already obtained both from the server.
    #[instrument(skip(self, token, user), fields(user_id = %user.id, role = %user.role))]
    pub fn login(&self, token: impl Into<String>, user: User) {
        let mut state = self.write();
        state.token = Some(SecretString::from(token.into()));
        state.user = Some(user);
        state.generation += 1;
        self.persist(&state);
        info!("session started");
    }

    /// Clear token and user. Safe to call when already logged out.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        let mut state = self.write();
        let was_authenticated = state.token.is_some() || state.user.is_some();
        state.token = None;
        state.user = None;
        state.generation += 1;
        self.persist(&state);
        if was_authenticated {
            info!("session ended");
        }
    }

    /// Shallow-merge `patch` into the current user.
    ///
    /// No-op when no user is present; the patch type cannot carry `id` or
    /// `role`, so those stay as issued at login.
    pub fn update_user(&self, patch: UserPatch) {
        let mut state = self.write();
        let Some(user) = state.user.as_mut() else {
            debug!("update_user ignored: no active session");
            return;
        };
        patch.apply_to(user);
        self.persist(&state);
    }

    /// Called with the write lock held.
    fn persist(&self, state: &State) {
        if let Err(e) = self.inner.storage.save(&state.persisted()) {
            warn!(error = %e, "failed to persist session");
        }
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    /// Restore the persisted session, once.
    ///
    /// The stored pair is applied only if it has both a token and a user,
    /// and only if no `login`/`logout` happened while it was loading.
    /// Concurrent calls wait for the one doing the load; once it has
    /// finished, later calls return immediately.
    #[instrument(skip(self))]
    pub async fn hydrate(&self) {
        self.inner
            .hydration
            .get_or_init(|| self.load_persisted())
            .await;
    }

    async fn load_persisted(&self) {
        let generation = self.read().generation;
        let storage = Arc::clone(&self.inner.storage);
        match tokio::task::spawn_blocking(move || storage.load()).await {
            Ok(Ok(Some(persisted))) => self.restore(persisted, generation),
            Ok(Ok(None)) => debug!("no persisted session"),
            Ok(Err(e)) => warn!(error = %e, "failed to load persisted session"),
            Err(e) => warn!(error = %e, "session hydration task failed"),
        }

        self.inner.hydrated.send_replace(true);
        info!(authenticated = self.is_authenticated(), "session hydrated");
    }

    fn restore(&self, persisted: PersistedSession, generation: u64) {
        let mut state = self.write();
        if state.generation != generation {
            debug!("session changed during hydration; keeping the newer state");
            return;
        }
        match (persisted.token, persisted.user) {
            (Some(token), Some(user)) => {
                state.token = Some(SecretString::from(token));
                state.user = Some(user);
            }
            (None, None) => {}
            _ => warn!("persisted session is incomplete; starting logged out"),
        }
    }

    /// Resolve once hydration has finished.
    pub async fn wait_until_hydrated(&self) {
        let mut rx = self.inner.hydrated.subscribe();
        // The sender lives as long as `self`, so this cannot observe a close.
        let _ = rx.wait_for(|hydrated| *hydrated).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tiendita_core::{Email, Role, UserId};

    use super::*;

    fn ana() -> User {
        User {
            id: UserId::new("u1"),
            email: Email::parse("a@b.edu").unwrap(),
            first_name: "Ana".to_string(),
            last_name: "Lopez".to_string(),
            role: Role::Seller,
        }
    }

    fn assert_consistent(store: &SessionStore) {
        let snapshot = store.snapshot();
        assert_eq!(
            snapshot.is_authenticated(),
            snapshot.token.is_some() && snapshot.user.is_some()
        );
        assert_eq!(store.is_authenticated(), snapshot.is_authenticated());
    }

    #[test]
    fn test_starts_empty_and_unhydrated() {
        let store = SessionStore::in_memory();
        let snapshot = store.snapshot();
        assert!(snapshot.token.is_none());
        assert!(snapshot.user.is_none());
        assert!(!store.is_authenticated());
        assert!(!store.has_hydrated());
    }

    #[test]
    fn test_login_then_read() {
        let store = SessionStore::in_memory();
        store.login("tok123", ana());

        let snapshot = store.snapshot();
        assert_eq!(snapshot.token.unwrap().expose_secret(), "tok123");
        assert_eq!(snapshot.user.unwrap().role, Role::Seller);
        assert!(store.is_authenticated());
        assert_consistent(&store);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let store = SessionStore::in_memory();
        store.logout();
        store.login("tok123", ana());
        store.logout();
        store.logout();

        assert!(store.token().is_none());
        assert!(store.user().is_none());
        assert_consistent(&store);
    }

    #[test]
    fn test_update_user_without_session_is_noop() {
        let store = SessionStore::in_memory();
        store.update_user(UserPatch {
            first_name: Some("Nueva".to_string()),
            ..UserPatch::default()
        });
        assert!(store.user().is_none());

        store.login("tok", ana());
        store.logout();
        store.update_user(UserPatch {
            first_name: Some("Nueva".to_string()),
            ..UserPatch::default()
        });
        assert!(store.user().is_none());
        assert_consistent(&store);
    }

    #[test]
    fn test_update_user_keeps_id_and_role() {
        let store = SessionStore::in_memory();
        store.login("tok", ana());
        store.update_user(UserPatch {
            first_name: Some("Nueva".to_string()),
            ..UserPatch::default()
        });

        let user = store.user().unwrap();
        assert_eq!(user.first_name, "Nueva");
        assert_eq!(user.id, UserId::new("u1"));
        assert_eq!(user.role, Role::Seller);
    }

    #[test]
    fn test_mutations_write_through() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());

        store.login("tok123", ana());
        assert_eq!(
            storage.stored().unwrap().token.as_deref(),
            Some("tok123")
        );

        store.logout();
        assert_eq!(storage.stored(), Some(PersistedSession::default()));
        assert_eq!(storage.save_count(), 2);
    }

    #[tokio::test]
    async fn test_hydrate_restores_persisted_session() {
        let storage = Arc::new(MemoryStorage::with_session(PersistedSession {
            token: Some("tok123".to_string()),
            user: Some(ana()),
        }));
        let store = SessionStore::new(storage);

        store.hydrate().await;

        assert!(store.has_hydrated());
        assert!(store.is_authenticated());
        assert_eq!(store.token().unwrap().expose_secret(), "tok123");
    }

    #[tokio::test]
    async fn test_hydrate_with_nothing_persisted() {
        let store = SessionStore::in_memory();
        store.hydrate().await;
        assert!(store.has_hydrated());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_hydrate_ignores_incomplete_session() {
        let storage = Arc::new(MemoryStorage::with_session(PersistedSession {
            token: Some("orphan".to_string()),
            user: None,
        }));
        let store = SessionStore::new(storage);
        store.hydrate().await;

        assert!(store.has_hydrated());
        assert!(store.token().is_none());
        assert_consistent(&store);
    }

    #[tokio::test]
    async fn test_hydrate_runs_once() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());

        store.hydrate().await;
        store.login("tok", ana());
        store.logout();
        storage
            .save(&PersistedSession {
                token: Some("late".to_string()),
                user: Some(ana()),
            })
            .unwrap();
        store.hydrate().await;

        assert!(store.has_hydrated());
        assert!(!store.is_authenticated());
    }

    /// Storage whose `load` blocks for `delay` before returning `session`.
    struct SlowStorage {
        delay: Duration,
        session: PersistedSession,
        loads: AtomicUsize,
    }

    impl SlowStorage {
        fn new(delay: Duration, session: PersistedSession) -> Arc<Self> {
            Arc::new(Self {
                delay,
                session,
                loads: AtomicUsize::new(0),
            })
        }
    }

    impl SessionStorage for SlowStorage {
        fn load(&self) -> Result<Option<PersistedSession>, StorageError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            Ok(Some(self.session.clone()))
        }

        fn save(&self, _session: &PersistedSession) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn stale_session() -> PersistedSession {
        PersistedSession {
            token: Some("stale".to_string()),
            user: Some(ana()),
        }
    }

    #[tokio::test]
    async fn test_abandoned_hydrate_does_not_wedge_the_store() {
        let storage = SlowStorage::new(Duration::from_millis(200), stale_session());
        let store = SessionStore::new(storage.clone());

        let first = tokio::time::timeout(Duration::from_millis(20), store.hydrate()).await;
        assert!(first.is_err());
        assert!(!store.has_hydrated());

        tokio::time::timeout(Duration::from_secs(5), store.hydrate())
            .await
            .unwrap();
        assert!(store.has_hydrated());
        assert_eq!(store.token().unwrap().expose_secret(), "stale");
        assert_eq!(storage.loads.load(Ordering::SeqCst), 2);

        // Settled: no further loads.
        store.hydrate().await;
        assert_eq!(storage.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_login_during_hydrate_wins() {
        let storage = SlowStorage::new(Duration::from_millis(200), stale_session());
        let store = SessionStore::new(storage);

        let hydrating = {
            let store = store.clone();
            tokio::spawn(async move { store.hydrate().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.login("fresh", ana());
        hydrating.await.unwrap();

        assert!(store.has_hydrated());
        assert!(store.is_authenticated());
        assert_eq!(store.token().unwrap().expose_secret(), "fresh");
    }

    #[tokio::test]
    async fn test_logout_during_hydrate_wins() {
        let storage = SlowStorage::new(Duration::from_millis(200), stale_session());
        let store = SessionStore::new(storage);

        let hydrating = {
            let store = store.clone();
            tokio::spawn(async move { store.hydrate().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.logout();
        hydrating.await.unwrap();

        assert!(store.has_hydrated());
        assert!(!store.is_authenticated());
        assert_consistent(&store);
    }

    #[tokio::test]
    async fn test_wait_until_hydrated() {
        let store = SessionStore::in_memory();
        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                store.wait_until_hydrated().await;
                store.has_hydrated()
            })
        };
        store.hydrate().await;
        assert!(waiter.await.unwrap());
    }
}
