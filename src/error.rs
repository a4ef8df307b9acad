//! Session error types

use thiserror::Error;

use crate::cookie_codec::CookieError;
use crate::store::StorageError;

/// Errors that can occur during session operations
#[derive(Debug, Error)]
pub enum SessionError {
    /// No stored record exists for the identifier.
    ///
    /// This is an expected outcome of a lookup, kept apart from the
    /// connectivity and query failures in [`SessionError::Storage`].
    #[error("session not found")]
    NotFound,

    /// The column store could not be reached or rejected a statement
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// The session payload could not be serialized or deserialized
    #[error("session codec: {0}")]
    Codec(#[from] serde_json::Error),

    /// The session identifier could not be signed into a cookie value
    #[error("securecookie: {0}")]
    Cookie(#[from] CookieError),

    /// The system entropy source failed while generating an identifier
    #[error("id generator: {0}")]
    Entropy(#[from] rand::Error),
}

impl SessionError {
    /// Whether this is the distinguished "no record" lookup outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound)
    }
}
