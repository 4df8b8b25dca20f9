use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::ports::{KeyValueStore, Notifier};
use crate::domain::session::Session;
use crate::errors::AppError;
use crate::infrastructure::notifier::DEFAULT_NOTICE_DURATION;

pub const SESSION_KEY: &str = "wayne-user-data";

/// Persisted login state.
pub struct SessionStore<S> {
    store: Arc<S>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The stored session, or an anonymous one.
    pub fn load(&self) -> Session {
        self.store.get_json(SESSION_KEY).unwrap_or_else(Session::anonymous)
    }

    pub fn save(&self, session: &Session) -> Result<(), DomainError> {
        self.store.set_json(SESSION_KEY, session)
    }

    /// Forgets the credential.
    pub fn end(&self) -> Result<(), DomainError> {
        self.store.remove(SESSION_KEY)?;
        log::info!("Session ended");
        Ok(())
    }
}

/// Surfaces a failed request to the user and logs out on a rejected credential.
pub fn report_error<S: KeyValueStore>(
    err: &AppError,
    notifier: &dyn Notifier,
    sessions: &SessionStore<S>,
) {
    let (message, severity) = err.notice();
    log::error!("Request failed: {}", err);
    notifier.notify(message, severity, DEFAULT_NOTICE_DURATION);

    if err.ends_session() {
        if let Err(e) = sessions.end() {
            log::error!("Failed to clear session: {}", e);
        }
    }
}
