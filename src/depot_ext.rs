//! Extension trait for Depot to easily access sessions

use salvo_core::Depot;

use crate::lazy::LazySession;

pub(crate) const SESSION_KEY: &str = "expenses.session";

/// Extension trait for Salvo's Depot to provide easy session access
pub trait SessionDepotExt {
    /// Get the lazy session handle installed by `SessionHandler`
    fn session_mut(&mut self) -> Option<&mut LazySession>;
}

impl SessionDepotExt for Depot {
    fn session_mut(&mut self) -> Option<&mut LazySession> {
        self.get_mut::<LazySession>(SESSION_KEY).ok()
    }
}
