//! Load/save protocol between sessions and the key-value store

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::random::is_url_safe;
use crate::session::Session;
use crate::store::KeyValueStore;

/// Longest cookie value considered as a session id
const MAX_ID_LENGTH: usize = 256;

/// What the response must do with the session cookie after a save
#[derive(Clone, Debug, PartialEq)]
pub enum CookieDirective {
    /// Leave the cookie untouched
    Keep,
    /// Set or refresh the cookie
    Set {
        id: String,
        max_age_secs: u64,
        expires: DateTime<Utc>,
    },
    /// Expire the cookie immediately
    Remove,
}

/// Loads sessions from and saves them to a [`KeyValueStore`]
pub struct SessionManager<S: KeyValueStore> {
    store: Arc<S>,
    config: SessionConfig,
}

impl<S: KeyValueStore> SessionManager<S> {
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load a stored session, `Ok(None)` if no entry exists for `sid`
    pub async fn load(&self, sid: &str) -> Result<Option<Session>, SessionError> {
        let key = self.config.store_key(sid);
        let Some(payload) = self.store.get(&key).await? else {
            return Ok(None);
        };
        let fields: HashMap<String, String> = serde_json::from_str(&payload)?;
        Ok(Some(Session::from_stored(sid.to_string(), fields)))
    }

    /// Start a fresh session with a new id and CSRF token
    pub fn create_new(&self) -> Result<Session, SessionError> {
        Session::create()
    }

    /// Resolve the session for a request from its cookie value.
    ///
    /// Missing, malformed and unknown ids all yield a fresh session; only
    /// store failures are errors.
    pub async fn open(&self, cookie_id: Option<&str>) -> Result<Session, SessionError> {
        if let Some(sid) = cookie_id {
            if is_well_formed_id(sid) {
                if let Some(session) = self.load(sid).await? {
                    tracing::debug!(sid = %session.id(), "loaded session");
                    return Ok(session);
                }
                tracing::debug!("session id not found in store, starting a new session");
            } else {
                tracing::debug!("ignoring malformed session id");
            }
        }
        self.create_new()
    }

    /// Persist a session and decide what happens to its cookie.
    ///
    /// Store writes complete before a directive is returned, so a failed save
    /// never produces a cookie.
    pub async fn save(&self, session: &Session) -> Result<CookieDirective, SessionError> {
        if session.is_empty() {
            return self.save_empty(session).await;
        }

        let key = self.config.store_key(session.id());
        let lifetime = self.config.session_lifetime(session.is_permanent());
        let ttl = lifetime.as_secs();

        if session.is_dirty() {
            let payload = serde_json::to_string(session.fields())?;
            self.store.set_ex(&key, &payload, ttl).await?;
        } else if !self.store.expire(&key, ttl).await? {
            // Entry vanished since load; write it back so the cookie stays valid
            let payload = serde_json::to_string(session.fields())?;
            self.store.set_ex(&key, &payload, ttl).await?;
        }

        // The old key goes only after the new one is written
        if let Some(previous) = session.previous_id() {
            self.store.delete(&self.config.store_key(previous)).await?;
            tracing::debug!(sid = %session.id(), "rotated session id");
        }

        let expires = Utc::now()
            + chrono::Duration::from_std(lifetime)
                .map_err(|e| SessionError::InvalidArgument(e.to_string()))?;

        Ok(CookieDirective::Set {
            id: session.id().to_string(),
            max_age_secs: ttl,
            expires,
        })
    }

    async fn save_empty(&self, session: &Session) -> Result<CookieDirective, SessionError> {
        if session.is_new() {
            // Nothing was ever stored under this id
            return Ok(if session.is_dirty() {
                CookieDirective::Remove
            } else {
                CookieDirective::Keep
            });
        }

        self.store.delete(&self.config.store_key(session.id())).await?;
        if let Some(previous) = session.previous_id() {
            self.store.delete(&self.config.store_key(previous)).await?;
        }
        tracing::debug!(sid = %session.id(), "deleted empty session");
        Ok(CookieDirective::Remove)
    }
}

impl<S: KeyValueStore> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

fn is_well_formed_id(sid: &str) -> bool {
    !sid.is_empty() && sid.len() <= MAX_ID_LENGTH && is_url_safe(sid)
}
