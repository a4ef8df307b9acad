//! Per-request session cache

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::SessionError;
use crate::manager::CassandraStore;
use crate::session::Session;
use crate::transport::{CookieSink, CookieSource};

/// Sessions opened during one request, keyed by cookie name.
///
/// Asking for the same name twice returns the same session, so the cookie is
/// decoded and the row loaded at most once per request.
pub struct Registry {
    store: Arc<CassandraStore>,
    sessions: HashMap<String, Session>,
}

impl Registry {
    pub fn new(store: Arc<CassandraStore>) -> Self {
        Self {
            store,
            sessions: HashMap::new(),
        }
    }

    /// The store sessions are opened from
    pub fn store(&self) -> &Arc<CassandraStore> {
        &self.store
    }

    /// Fetch the named session, opening it on first use
    pub fn get<'a, C>(
        &'a mut self,
        cookies: &C,
        name: &str,
    ) -> impl Future<Output = &'a mut Session> + Send + 'a
    where
        C: CookieSource + ?Sized,
    {
        let raw = cookies.cookie_value(name);
        let name = name.to_string();
        async move {
            match self.sessions.entry(name) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let session = self.store.open(entry.key(), raw.as_deref()).await;
                    entry.insert(session)
                }
            }
        }
    }

    /// A session already opened in this request
    pub fn session(&self, name: &str) -> Option<&Session> {
        self.sessions.get(name)
    }

    pub fn session_mut(&mut self, name: &str) -> Option<&mut Session> {
        self.sessions.get_mut(name)
    }

    /// Save every session opened in this request.
    ///
    /// All sessions are attempted; the first error is returned.
    pub async fn save_all<C>(&mut self, cookies: &mut C) -> Result<(), SessionError>
    where
        C: CookieSink + Send + ?Sized,
    {
        let mut first_error = None;
        for session in self.sessions.values_mut() {
            if let Err(e) = self.store.save(cookies, session).await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("sessions", &self.sessions.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
