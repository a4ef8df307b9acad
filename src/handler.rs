//! Salvo middleware providing per-request session registries

use salvo_core::prelude::*;
use std::sync::Arc;

use crate::manager::CassandraStore;
use crate::registry::Registry;

pub(crate) const REGISTRY_KEY: &str = "salvo.cassandra.session";

/// Session middleware for Salvo
///
/// Each request gets a fresh [`Registry`] in its depot. Handlers open sessions
/// through it and save them explicitly; nothing is written back automatically.
pub struct SessionHandler {
    store: Arc<CassandraStore>,
}

impl SessionHandler {
    /// Create a new session handler
    pub fn new(store: CassandraStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Create a handler sharing an existing store
    pub fn from_store(store: Arc<CassandraStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<CassandraStore> {
        &self.store
    }
}

impl Clone for SessionHandler {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

#[async_trait]
impl Handler for SessionHandler {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        tracing::trace!(path = req.uri().path(), "session registry attached");
        depot.insert(REGISTRY_KEY, Registry::new(Arc::clone(&self.store)));
        ctrl.call_next(req, depot, res).await;
    }
}
