//! Extension trait for Depot to easily access the session registry

use salvo_core::Depot;

use crate::handler::REGISTRY_KEY;
use crate::registry::Registry;

/// Extension trait for Salvo's Depot to provide easy session access
pub trait SessionDepotExt {
    /// Get the request's session registry
    fn session_registry(&self) -> Option<&Registry>;

    /// Get the request's session registry for opening and saving sessions
    fn session_registry_mut(&mut self) -> Option<&mut Registry>;
}

impl SessionDepotExt for Depot {
    fn session_registry(&self) -> Option<&Registry> {
        self.get::<Registry>(REGISTRY_KEY).ok()
    }

    fn session_registry_mut(&mut self) -> Option<&mut Registry> {
        self.get_mut::<Registry>(REGISTRY_KEY).ok()
    }
}
