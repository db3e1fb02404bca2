//! Uniform session access, eager or deferred
//!
//! [`SessionAccess`] is implemented by [`Session`] itself and by
//! [`LazySession`], which postpones loading the session until the first
//! operation touches it. Requests that never touch the session therefore
//! never reach the store.

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::error::SessionError;
use crate::session::Session;

/// Future produced by a session factory
pub type SessionFuture = Pin<Box<dyn Future<Output = Result<Session, SessionError>> + Send>>;

type SessionFactory = Box<dyn FnOnce() -> SessionFuture + Send + Sync>;

/// Operations available on a session handle.
///
/// Only [`session`](SessionAccess::session) is required; everything else
/// goes through it. The provided methods call `Session`'s inherent methods by
/// path, since a `&mut Session` receiver would otherwise resolve to these.
#[async_trait]
pub trait SessionAccess: Send {
    /// The materialized session
    async fn session(&mut self) -> Result<&mut Session, SessionError>;

    async fn get(&mut self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(Session::get(self.session().await?, key).map(str::to_owned))
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        Session::set(self.session().await?, key, value);
        Ok(())
    }

    async fn remove(&mut self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(Session::remove(self.session().await?, key))
    }

    async fn contains(&mut self, key: &str) -> Result<bool, SessionError> {
        Ok(Session::contains(self.session().await?, key))
    }

    async fn len(&mut self) -> Result<usize, SessionError> {
        Ok(Session::len(self.session().await?))
    }

    async fn is_empty(&mut self) -> Result<bool, SessionError> {
        Ok(Session::is_empty(self.session().await?))
    }

    /// Field names, in no particular order
    async fn keys(&mut self) -> Result<Vec<String>, SessionError> {
        Ok(Session::keys(self.session().await?).map(str::to_owned).collect())
    }

    async fn clear(&mut self) -> Result<(), SessionError> {
        Session::clear(self.session().await?);
        Ok(())
    }

    async fn id(&mut self) -> Result<String, SessionError> {
        Ok(Session::id(self.session().await?).to_owned())
    }

    async fn csrf_token(&mut self) -> Result<Option<String>, SessionError> {
        Ok(Session::csrf_token(self.session().await?).map(str::to_owned))
    }

    async fn rotate(&mut self) -> Result<(), SessionError> {
        Session::rotate(self.session().await?)
    }

    async fn set_permanent(&mut self, permanent: bool) -> Result<(), SessionError> {
        Session::set_permanent(self.session().await?, permanent);
        Ok(())
    }

    async fn is_permanent(&mut self) -> Result<bool, SessionError> {
        Ok(Session::is_permanent(self.session().await?))
    }
}

#[async_trait]
impl SessionAccess for Session {
    async fn session(&mut self) -> Result<&mut Session, SessionError> {
        Ok(self)
    }
}

/// A session handle that runs its factory on first use
pub struct LazySession {
    init: Option<SessionFactory>,
    wrapped: Option<Session>,
}

impl LazySession {
    /// Wrap a factory; it runs at most once
    pub fn new<F, Fut>(init: F) -> Self
    where
        F: FnOnce() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Session, SessionError>> + Send + 'static,
    {
        Self {
            init: Some(Box::new(move || Box::pin(init()) as SessionFuture)),
            wrapped: None,
        }
    }

    /// Whether the factory has produced a session
    pub fn instantiated(&self) -> bool {
        self.wrapped.is_some()
    }

    /// The session, if it was ever materialized
    pub fn into_inner(self) -> Option<Session> {
        self.wrapped
    }
}

#[async_trait]
impl SessionAccess for LazySession {
    async fn session(&mut self) -> Result<&mut Session, SessionError> {
        if let Some(init) = self.init.take() {
            self.wrapped = Some(init().await?);
        }
        self.wrapped.as_mut().ok_or(SessionError::Unavailable)
    }
}

impl fmt::Debug for LazySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.wrapped {
            Some(session) => session.fmt(f),
            None => f.write_str("LazySession(<not instantiated>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_lazy(calls: Arc<AtomicUsize>) -> LazySession {
        LazySession::new(move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            let fields = HashMap::from([("a".to_string(), "1".to_string())]);
            Ok(Session::from_stored("abcd".to_string(), fields))
        })
    }

    #[tokio::test]
    async fn test_lazy_materializes_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut lazy = counting_lazy(Arc::clone(&calls));

        assert!(!lazy.instantiated());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(format!("{:?}", lazy).contains("not instantiated"));

        assert_eq!(lazy.get("a").await.unwrap().as_deref(), Some("1"));
        assert!(lazy.instantiated());
        assert_eq!(lazy.len().await.unwrap(), 1);

        lazy.set("b", "3").await.unwrap();
        assert_eq!(lazy.get("b").await.unwrap().as_deref(), Some("3"));
        assert!(lazy.contains("b").await.unwrap());

        let mut keys = lazy.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        assert_eq!(lazy.remove("b").await.unwrap().as_deref(), Some("3"));
        assert!(!lazy.contains("b").await.unwrap());

        lazy.clear().await.unwrap();
        assert!(lazy.is_empty().await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let session = lazy.into_inner().unwrap();
        assert!(session.is_dirty());
    }

    #[tokio::test]
    async fn test_untouched_lazy_never_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = counting_lazy(Arc::clone(&calls));
        assert!(lazy.into_inner().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_factory() {
        let mut lazy = LazySession::new(|| async {
            Err(SessionError::StoreError("down".to_string()))
        });
        assert!(matches!(
            lazy.get("a").await,
            Err(SessionError::StoreError(_))
        ));
        assert!(matches!(lazy.get("a").await, Err(SessionError::Unavailable)));
        assert!(!lazy.instantiated());
    }

    #[tokio::test]
    async fn test_eager_session_access() {
        let mut session = Session::create().unwrap();
        let id = SessionAccess::id(&mut session).await.unwrap();
        SessionAccess::rotate(&mut session).await.unwrap();
        assert_ne!(SessionAccess::id(&mut session).await.unwrap(), id);
        SessionAccess::set_permanent(&mut session, true).await.unwrap();
        assert!(SessionAccess::is_permanent(&mut session).await.unwrap());
    }
}
