//! Session data model with dirty tracking and id rotation

use std::collections::HashMap;

use crate::error::SessionError;
use crate::random::{random_string, TOKEN_LENGTH};

/// Field holding the session's CSRF token
pub const CSRF_KEY: &str = "csrf";

/// Field recording the permanent flag, so it survives across requests
pub const PERMANENT_KEY: &str = "_permanent";

/// A server-side session, materialized for the duration of one request
#[derive(Clone, Debug)]
pub struct Session {
    id: String,
    previous_id: Option<String>,
    is_new: bool,
    fields: HashMap<String, String>,
    dirty: bool,
}

impl Session {
    /// Build a session from fields loaded out of the store
    pub fn from_stored(id: String, fields: HashMap<String, String>) -> Self {
        Self {
            id,
            previous_id: None,
            is_new: false,
            fields,
            dirty: false,
        }
    }

    /// Create a brand new session with a random id and CSRF token.
    ///
    /// New sessions start dirty so the first save persists them.
    pub fn create() -> Result<Self, SessionError> {
        let mut session = Self {
            id: String::new(),
            previous_id: None,
            is_new: true,
            fields: HashMap::new(),
            dirty: true,
        };
        session.init_data()?;
        Ok(session)
    }

    fn init_data(&mut self) -> Result<(), SessionError> {
        self.id = random_string(TOKEN_LENGTH)?;
        let csrf = random_string(TOKEN_LENGTH)?;
        self.set(CSRF_KEY, csrf);
        Ok(())
    }

    /// Session id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id this session was stored under before a rotation
    pub fn previous_id(&self) -> Option<&str> {
        self.previous_id.as_deref()
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Whether fields changed since the session was loaded
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Set a field and mark the session dirty
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.fields.insert(key.into(), value.into());
        self.dirty = true;
    }

    /// Remove a field, marking the session dirty if it was present
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let removed = self.fields.remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Read-only view of all fields
    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    /// Remove every field, including the CSRF token
    pub fn clear(&mut self) {
        if !self.fields.is_empty() {
            self.fields.clear();
            self.dirty = true;
        }
    }

    /// CSRF token of this session, if it has not been cleared
    pub fn csrf_token(&self) -> Option<&str> {
        self.get(CSRF_KEY)
    }

    pub fn is_permanent(&self) -> bool {
        self.get(PERMANENT_KEY) == Some("true")
    }

    /// Choose between the long-lived and the one-day lifetime
    pub fn set_permanent(&mut self, permanent: bool) {
        if permanent {
            self.set(PERMANENT_KEY, "true");
        } else {
            self.remove(PERMANENT_KEY);
        }
    }

    /// Replace the id and CSRF token, keeping the other fields.
    ///
    /// The id currently in the store is queued for deletion on save. Rotating
    /// twice in one request still deletes the id that was originally loaded.
    pub fn rotate(&mut self) -> Result<(), SessionError> {
        if !self.is_new && self.previous_id.is_none() {
            self.previous_id = Some(self.id.clone());
        }
        self.init_data()?;
        self.is_new = false;
        Ok(())
    }
}
