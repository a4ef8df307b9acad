//! Request-scoped session object

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::Values;
use crate::config::Options;

/// A session as seen by the application during one request.
///
/// The identifier stays empty until the first successful save. The session is
/// owned by whoever handles the request and is never shared across requests.
#[derive(Debug, Clone)]
pub struct Session {
    name: String,
    id: String,
    values: Values,
    options: Options,
    is_new: bool,
}

impl Session {
    /// Create an empty, new session named after its cookie
    pub fn new<S: Into<String>>(name: S, options: Options) -> Self {
        Self {
            name: name.into(),
            id: String::new(),
            values: Values::new(),
            options,
            is_new: true,
        }
    }

    /// Cookie name of this session
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Session ID, empty until the session has been saved once
    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = id;
    }

    /// Whether this session was created during the current request
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub(crate) fn set_is_new(&mut self, is_new: bool) {
        self.is_new = is_new;
    }

    /// Get a value from the session
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a value in the session
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Remove a value from the session
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Check if a key exists in the session
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Clear all session data
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Check if the session is empty (no user data)
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw payload
    pub fn values(&self) -> &Values {
        &self.values
    }

    pub(crate) fn replace_values(&mut self, values: Values) {
        self.values = values;
    }

    /// This session's cookie options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Change this session's cookie options.
    ///
    /// Setting `max_age` to a negative value makes the next save expire the
    /// cookie instead of writing the session.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Shorthand for expiring the cookie on the next save
    pub fn expire(&mut self) {
        self.options.max_age = -1;
    }
}
