//! Session lifecycle: fetch-or-create, load, save, expire

use std::future::Future;
use std::sync::Arc;

use crate::codec::{decode_values, encode_values};
use crate::config::{Options, StoreConfig, DEFAULT_TABLE_NAME};
use crate::cookie_codec::{Authenticator, CodecChain};
use crate::error::SessionError;
use crate::id::generate_session_id;
use crate::session::Session;
use crate::store::{Cluster, SessionTable};
use crate::transport::{CookieSink, CookieSource};

/// Cookie-identified sessions persisted in a Cassandra table.
///
/// The cookie carries only the signed session ID; the payload lives in the
/// `values` column of the session table and expires through the row TTL.
pub struct CassandraStore {
    table: SessionTable,
    codecs: Arc<dyn Authenticator>,
    options: Options,
}

impl CassandraStore {
    /// Create a store on the given cluster.
    ///
    /// The connection is not checked here; the first load or save will report
    /// an unreachable cluster.
    pub fn new<C: Cluster>(cluster: C, config: StoreConfig) -> Self {
        let StoreConfig {
            table_name,
            key_pairs,
            options,
            cookie_max_age,
        } = config;
        let codecs = CodecChain::from_pairs(&key_pairs).with_max_age(cookie_max_age);
        let table_name = if table_name.is_empty() {
            DEFAULT_TABLE_NAME.to_string()
        } else {
            table_name
        };

        Self {
            table: SessionTable::new(Arc::new(cluster), table_name),
            codecs: Arc::new(codecs),
            options,
        }
    }

    /// Replace the cookie authenticator built from the configured key pairs
    pub fn with_authenticator<A: Authenticator>(mut self, authenticator: A) -> Self {
        self.codecs = Arc::new(authenticator);
        self
    }

    /// Options copied into each new session
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The backing session table
    pub fn table(&self) -> &SessionTable {
        &self.table
    }

    /// Create the session named `name` for a request, loading it when the
    /// request carries a valid cookie for it.
    ///
    /// This never fails: a missing or unverifiable cookie, or a failed load,
    /// yields an empty session.
    pub fn new_session<'a, C>(
        &'a self,
        cookies: &C,
        name: &str,
    ) -> impl Future<Output = Session> + Send + 'a
    where
        C: CookieSource + ?Sized,
    {
        let raw = cookies.cookie_value(name);
        let name = name.to_string();
        async move { self.open(&name, raw.as_deref()).await }
    }

    /// Like [`new_session`](Self::new_session) with the raw cookie value
    /// already extracted from the request.
    ///
    /// `is_new` ends up false whenever the cookie decoded and the lookup did
    /// not answer "not found", including when the lookup failed for another
    /// reason. Existing callers rely on that.
    pub async fn open(&self, name: &str, raw_cookie: Option<&str>) -> Session {
        let mut session = Session::new(name, self.options.clone());

        let Some(raw) = raw_cookie else {
            tracing::trace!(session = name, "no session cookie");
            return session;
        };

        let id = match self.codecs.decode(name, raw) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!(session = name, "ignoring session cookie: {}", e);
                return session;
            }
        };
        session.set_id(id);

        match self.load(&mut session).await {
            Ok(()) => session.set_is_new(false),
            Err(SessionError::NotFound) => {
                tracing::debug!(session = name, "no stored session for cookie");
            }
            Err(e) => {
                tracing::warn!(session = name, "failed to load session: {}", e);
                session.set_is_new(false);
            }
        }

        session
    }

    async fn load(&self, session: &mut Session) -> Result<(), SessionError> {
        let bytes = self.table.get(session.id()).await?;
        let values = decode_values(&bytes)?;
        session.replace_values(values);
        Ok(())
    }

    /// Persist the session and set its cookie.
    ///
    /// A negative `max_age` only expires the cookie; the stored row is left
    /// to its TTL. On any error no cookie is set.
    pub async fn save<C>(
        &self,
        cookies: &mut C,
        session: &mut Session,
    ) -> Result<(), SessionError>
    where
        C: CookieSink + Send + ?Sized,
    {
        if session.options().max_age < 0 {
            cookies.set_cookie(session.options().cookie(session.name(), ""));
            tracing::debug!(session = session.name(), "session cookie expired");
            return Ok(());
        }

        if session.id().is_empty() {
            session.set_id(generate_session_id()?);
        }

        let payload = encode_values(session.values())?;
        self.table
            .put(session.id(), &payload, session.options().max_age)
            .await?;

        let encoded = self.codecs.encode(session.name(), session.id())?;
        cookies.set_cookie(session.options().cookie(session.name(), &encoded));
        tracing::trace!(session = session.name(), "session saved");
        Ok(())
    }
}

impl std::fmt::Debug for CassandraStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CassandraStore")
            .field("table", &self.table)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
