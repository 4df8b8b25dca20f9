use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::domain::ports::{Notifier, Severity};

pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_secs(60);

/// Notification entry point that can be used before a transport exists.
///
/// Until `install` is called every notice is dropped with a warning.
#[derive(Default)]
pub struct NotificationSink {
    transport: RwLock<Option<Arc<dyn Notifier>>>,
}

impl NotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, transport: Arc<dyn Notifier>) {
        match self.transport.write() {
            Ok(mut slot) => *slot = Some(transport),
            Err(e) => log::error!("Notifier slot poisoned: {}", e),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.transport.read().map(|t| t.is_some()).unwrap_or(false)
    }

    pub fn notify_default(&self, message: &str, severity: Severity) {
        self.notify(message, severity, DEFAULT_NOTICE_DURATION);
    }
}

impl Notifier for NotificationSink {
    fn notify(&self, message: &str, severity: Severity, duration: Duration) {
        let transport = self.transport.read().ok().and_then(|t| t.clone());
        match transport {
            Some(t) => t.notify(message, severity, duration),
            None => log::warn!("Notifier not initialized; dropping notice: {}", message),
        }
    }
}

/// Writes notices to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity, _duration: Duration) {
        match severity {
            Severity::Error => log::error!("{}", message),
            Severity::Warning => log::warn!("{}", message),
            Severity::Default | Severity::Info | Severity::Success => log::info!("{}", message),
        }
    }
}
