use anyhow::{Context, Result};
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{MemorySessionStore, Session, SessionStore, TokenPair, mask_token};

/// Shared, explicitly injected session.
///
/// Reads come from memory. Every mutation writes through to the store while
/// still holding the write lock, so a request issued right after a mutation
/// returns always sees the new tokens. Tokens and roles reach memory only once
/// the store has accepted them; `clear` drops memory even if the store fails.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<RwLock<Option<Session>>>,
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").finish_non_exhaustive()
    }
}

impl SessionHandle {
    /// Loads whatever the store has persisted.
    #[tracing::instrument(skip(store))]
    pub fn init(store: Arc<dyn SessionStore>) -> Result<Self> {
        let session = store.load().context("Failed to load persisted session")?;
        if let Some(session) = &session {
            debug!(
                "Restored session with access token {}",
                mask_token(&session.access_token)
            );
        }
        Ok(Self {
            state: Arc::new(RwLock::new(session)),
            store,
        })
    }

    /// A handle backed by a fresh in-memory store.
    pub fn in_memory(session: Option<Session>) -> Self {
        let store = match session.clone() {
            Some(session) => MemorySessionStore::with_session(session),
            None => MemorySessionStore::new(),
        };
        Self {
            state: Arc::new(RwLock::new(session)),
            store: Arc::new(store),
        }
    }

    pub async fn current(&self) -> Option<Session> {
        self.state.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
    }

    pub async fn is_logged_in(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Starts a new session (login or social-auth callback).
    #[tracing::instrument(skip(self, session))]
    pub async fn establish(&self, session: Session) -> Result<()> {
        let mut state = self.state.write().await;
        self.store.save(&session)?;
        info!(
            "Session established with access token {}",
            mask_token(&session.access_token)
        );
        *state = Some(session);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_role(&self, role: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let Some(session) = state.as_ref() else {
            anyhow::bail!("Cannot record a role without an active session");
        };
        let updated = session.clone().with_role(role);
        self.store.save(&updated)?;
        *state = Some(updated);
        Ok(())
    }

    /// Replaces the token pair after a successful refresh.
    ///
    /// Returns `false` when the session was cleared while the refresh was in
    /// flight; a logout must not be undone by a late refresh.
    #[tracing::instrument(skip(self, pair))]
    pub(crate) async fn update_tokens(&self, pair: &TokenPair) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(session) = state.as_ref() else {
            debug!("Session cleared during refresh; discarding new tokens");
            return Ok(false);
        };
        let updated = Session {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
            ..session.clone()
        };
        self.store.save(&updated)?;
        *state = Some(updated);
        Ok(true)
    }

    /// Drops the session from memory and from the store.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.write().await;
        *state = None;
        self.store.clear()?;
        info!("Session cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MockSessionStore;

    #[tokio::test]
    async fn test_init_restores_persisted_session() {
        let store = Arc::new(MemorySessionStore::with_session(
            Session::new("A1", "R1").with_role("USER"),
        ));
        let handle = SessionHandle::init(store).unwrap();

        assert!(handle.is_logged_in().await);
        assert_eq!(handle.access_token().await.as_deref(), Some("A1"));
        assert_eq!(handle.refresh_token().await.as_deref(), Some("R1"));
        assert_eq!(
            handle.current().await.and_then(|s| s.role).as_deref(),
            Some("USER")
        );
    }

    #[tokio::test]
    async fn test_init_propagates_store_errors() {
        let mut store = MockSessionStore::new();
        store
            .expect_load()
            .returning(|| Err(anyhow::anyhow!("permission denied")));

        let err = SessionHandle::init(Arc::new(store)).unwrap_err();
        assert!(err.to_string().contains("Failed to load persisted session"));
    }

    #[tokio::test]
    async fn test_store_then_read_has_no_stale_window() {
        let store = Arc::new(MemorySessionStore::new());
        let handle = SessionHandle::init(store.clone()).unwrap();

        handle.establish(Session::new("A1", "R1")).await.unwrap();
        assert_eq!(handle.access_token().await.as_deref(), Some("A1"));

        handle
            .update_tokens(&TokenPair::new("A2", "R2"))
            .await
            .unwrap();
        assert_eq!(handle.access_token().await.as_deref(), Some("A2"));
        assert_eq!(store.snapshot(), Some(Session::new("A2", "R2")));
    }

    #[tokio::test]
    async fn test_update_tokens_keeps_role() {
        let store = Arc::new(MemorySessionStore::new());
        let handle = SessionHandle::init(store.clone()).unwrap();
        handle
            .establish(Session::new("A1", "R1").with_role("ADMIN"))
            .await
            .unwrap();

        assert!(
            handle
                .update_tokens(&TokenPair::new("A2", "R2"))
                .await
                .unwrap()
        );
        assert_eq!(
            store.snapshot(),
            Some(Session::new("A2", "R2").with_role("ADMIN"))
        );
    }

    #[tokio::test]
    async fn test_update_tokens_after_clear_is_discarded() {
        let store = Arc::new(MemorySessionStore::new());
        let handle = SessionHandle::init(store.clone()).unwrap();

        let updated = handle
            .update_tokens(&TokenPair::new("A2", "R2"))
            .await
            .unwrap();

        assert!(!updated);
        assert!(!handle.is_logged_in().await);
        assert_eq!(store.snapshot(), None);
    }

    #[tokio::test]
    async fn test_set_role() {
        let handle = SessionHandle::in_memory(Some(Session::new("A1", "R1")));
        handle.set_role("ADMIN").await.unwrap();
        assert!(handle.current().await.unwrap().is_admin());
    }

    #[tokio::test]
    async fn test_set_role_without_session_fails() {
        let handle = SessionHandle::in_memory(None);
        assert!(handle.set_role("ADMIN").await.is_err());
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let store = Arc::new(MemorySessionStore::with_session(
            Session::new("A1", "R1").with_role("USER"),
        ));
        let handle = SessionHandle::init(store.clone()).unwrap();

        handle.clear().await.unwrap();

        assert!(!handle.is_logged_in().await);
        assert_eq!(handle.access_token().await, None);
        assert_eq!(store.snapshot(), None);
    }

    #[tokio::test]
    async fn test_establish_does_not_change_memory_when_save_fails() {
        let mut store = MockSessionStore::new();
        store.expect_load().returning(|| Ok(None));
        store
            .expect_save()
            .returning(|_| Err(anyhow::anyhow!("read-only file system")));

        let handle = SessionHandle::init(Arc::new(store)).unwrap();
        assert!(handle.establish(Session::new("A1", "R1")).await.is_err());
        assert!(!handle.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_update_tokens_does_not_change_memory_when_save_fails() {
        let mut store = MockSessionStore::new();
        store
            .expect_load()
            .returning(|| Ok(Some(Session::new("A1", "R1").with_role("USER"))));
        store
            .expect_save()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("disk full")));

        let handle = SessionHandle::init(Arc::new(store)).unwrap();
        assert!(
            handle
                .update_tokens(&TokenPair::new("A2", "R2"))
                .await
                .is_err()
        );
        assert_eq!(
            handle.current().await,
            Some(Session::new("A1", "R1").with_role("USER"))
        );
    }
}
