//! Process-wide engine slot.
//!
//! Nothing in the crate reads this slot implicitly; callers opt in through
//! these functions.

use std::sync::{
    Arc,
    PoisonError,
    RwLock,
};

use crate::engine::Engine;

static INSTALLED: RwLock<Option<Arc<Engine>>> = RwLock::new(None);

/// Installs `engine` as the process-wide instance, returning the previous one.
pub fn install(engine: Arc<Engine>) -> Option<Arc<Engine>> {
    INSTALLED.write().unwrap_or_else(PoisonError::into_inner).replace(engine)
}

/// Removes and returns the installed instance.
pub fn uninstall() -> Option<Arc<Engine>> {
    INSTALLED.write().unwrap_or_else(PoisonError::into_inner).take()
}

/// The installed instance, if any.
#[must_use]
pub fn installed() -> Option<Arc<Engine>> {
    INSTALLED.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// The installed instance, installing a default-configured engine on first
/// use.
#[must_use]
pub fn default_engine() -> Arc<Engine> {
    if let Some(engine) = installed() {
        return engine;
    }
    let mut slot = INSTALLED.write().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(slot.get_or_insert_with(|| {
        tracing::debug!("Creating default engine");
        Arc::new(Engine::default())
    }))
}
