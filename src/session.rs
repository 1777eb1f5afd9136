//! Session handle and the data bag stored in the cache

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::SessionError;

/// Data key holding a per-session cookie lifetime in seconds.
///
/// When present it overrides the global `persistent` setting, including a
/// value of 0 which forces a browser-session cookie.
pub const SESSION_LIFETIME_KEY: &str = "__SESSION_TTL__";

/// Session data as stored in the cache: string keys to JSON values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionData(HashMap<String, Value>);

impl SessionData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value from session data
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.0.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get the raw JSON value for a key
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a value in session data
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        self.0.insert(key.to_string(), value);
        Ok(())
    }

    /// Remove a value from session data
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Check if a key exists
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Clear all session data
    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<HashMap<String, Value>> for SessionData {
    fn from(map: HashMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for SessionData {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A session handle for the duration of one request.
///
/// Produced by `initialize_session`, mutated by request handlers and consumed
/// by `persist_session`. Mutating methods set the `changed` flag; code that
/// edits the data through other means calls [`Session::mark_changed`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    id: String,
    data: SessionData,
    changed: bool,
    regenerated: bool,
}

impl Session {
    /// Create a session with the given ID (empty for "no ID yet") and data
    pub fn new(id: impl Into<String>, data: SessionData) -> Self {
        Self {
            id: id.into(),
            data,
            changed: false,
            regenerated: false,
        }
    }

    /// Get the session ID; empty when none has been issued yet
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Whether the data has been mutated since the session was loaded
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Whether a new ID was explicitly requested
    pub fn is_regenerated(&self) -> bool {
        self.regenerated
    }

    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    /// Request a new session ID when the session is persisted
    pub fn regenerate(&mut self) {
        self.regenerated = true;
    }

    /// Get a value from the session
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data.get(key)
    }

    /// Set a value in the session
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), SessionError> {
        self.data.set(key, value)?;
        self.changed = true;
        Ok(())
    }

    /// Remove a value from the session
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let result = self.data.remove(key);
        if result.is_some() {
            self.changed = true;
        }
        result
    }

    /// Check if a key exists in the session
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains(key)
    }

    /// Clear all session data
    pub fn clear(&mut self) {
        if !self.data.is_empty() {
            self.data.clear();
            self.changed = true;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Make the session cookie live for `secs` seconds, regardless of the
    /// global persistence setting. 0 yields a browser-session cookie.
    pub fn persist_session_for(&mut self, secs: i64) -> Result<(), SessionError> {
        self.set(SESSION_LIFETIME_KEY, secs)
    }

    /// The per-session cookie lifetime, if one was set
    pub fn session_lifetime(&self) -> Option<i64> {
        self.data.get_value(SESSION_LIFETIME_KEY).map(|v| v.as_i64().unwrap_or(0))
    }

    /// Take the session data, consuming the handle
    pub fn into_data(self) -> SessionData {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_session_is_clean() {
        let session = Session::new("", SessionData::new());
        assert_eq!(session.id(), "");
        assert!(session.is_empty());
        assert!(!session.has_changed());
        assert!(!session.is_regenerated());
    }

    #[test]
    fn test_mutations_mark_changed() {
        let mut session = Session::new("abc", SessionData::new());
        session.set("user", "alice").unwrap();
        assert!(session.has_changed());
        assert_eq!(session.get::<String>("user"), Some("alice".to_string()));

        let mut session = Session::new("abc", session.into_data());
        assert!(session.remove("missing").is_none());
        assert!(!session.has_changed());
        assert_eq!(session.remove("user"), Some(json!("alice")));
        assert!(session.has_changed());
    }

    #[test]
    fn test_clear_on_empty_session_is_not_a_change() {
        let mut session = Session::new("abc", SessionData::new());
        session.clear();
        assert!(!session.has_changed());
    }

    #[test]
    fn test_regenerate_keeps_data() {
        let mut data = SessionData::new();
        data.set("k", "v").unwrap();
        let mut session = Session::new("abc", data);
        session.regenerate();
        assert!(session.is_regenerated());
        assert!(!session.has_changed());
        assert_eq!(session.get::<String>("k"), Some("v".to_string()));
    }

    #[test]
    fn test_session_lifetime() {
        let mut session = Session::new("", SessionData::new());
        assert_eq!(session.session_lifetime(), None);
        session.persist_session_for(600).unwrap();
        assert_eq!(session.session_lifetime(), Some(600));
        assert!(session.contains(SESSION_LIFETIME_KEY));
        assert!(session.has_changed());
    }

    #[test]
    fn test_session_data_serializes_as_flat_map() {
        let mut data = SessionData::new();
        data.set("views", 3).unwrap();
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json, json!({ "views": 3 }));

        let back: SessionData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }
}
