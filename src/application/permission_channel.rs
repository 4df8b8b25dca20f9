use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::ports::{ChannelConnector, ChannelSession};
use crate::domain::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    /// Terminal: shut down or out of attempts.
    Stopped,
}

/// Delay between reconnection attempts.
///
/// The first retry after a drop waits `initial_delay`; each further
/// consecutive failure multiplies it, up to `max_delay`. A successful
/// connection resets the count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
    /// Give up after this many consecutive failed connection attempts.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            multiplier: 2,
            max_delay: Duration::from_secs(60),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Constant delay, retrying forever.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            multiplier: 1,
            max_delay: delay,
            max_attempts: None,
        }
    }

    pub fn delay_for(&self, failures: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(failures.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Authenticated realtime feed of permission updates.
pub struct PermissionChannel<C> {
    connector: Arc<C>,
    policy: ReconnectPolicy,
}

impl<C: ChannelConnector> PermissionChannel<C> {
    pub fn new(connector: Arc<C>, policy: ReconnectPolicy) -> Self {
        Self { connector, policy }
    }

    /// Starts the connection task.
    ///
    /// Returns `None` without connecting when the session carries no token.
    /// Every text frame that parses as JSON is passed to `on_message`; other
    /// frames are logged and skipped.
    pub fn spawn<F>(&self, session: &Session, on_message: F) -> Option<ChannelHandle>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let Some(bearer) = session.bearer() else {
            log::warn!("No auth token; permission channel not started");
            return None;
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(ChannelState::Disconnected);
        let task = tokio::spawn(run(
            self.connector.clone(),
            bearer.to_string(),
            self.policy.clone(),
            on_message,
            state_tx,
            shutdown_rx,
        ));

        Some(ChannelHandle {
            shutdown: shutdown_tx,
            state: state_rx,
            task,
        })
    }
}

/// Owner of a running channel. Dropping it also stops the channel.
pub struct ChannelHandle {
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<ChannelState>,
    task: JoinHandle<()>,
}

impl ChannelHandle {
    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Closes the live connection, cancels any pending retry and waits for
    /// the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            log::error!("Permission channel task failed: {}", e);
        }
    }
}

async fn run<C, F>(
    connector: Arc<C>,
    bearer: String,
    policy: ReconnectPolicy,
    on_message: F,
    state: watch::Sender<ChannelState>,
    mut shutdown: watch::Receiver<bool>,
) where
    C: ChannelConnector,
    F: Fn(Value) + Send + Sync + 'static,
{
    let mut failures: u32 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        state.send_replace(ChannelState::Connecting);
        let connected = tokio::select! {
            _ = shutdown.changed() => break,
            result = connector.connect(&bearer) => result,
        };

        match connected {
            Ok(mut session) => {
                failures = 0;
                state.send_replace(ChannelState::Connected);
                log::info!("Permission channel connected");
                if pump(session.as_mut(), &on_message, &mut shutdown).await {
                    break;
                }
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                log::warn!("Permission channel connection failed ({}): {}", failures, e);
            }
        }

        state.send_replace(ChannelState::Disconnected);
        if let Some(max) = policy.max_attempts {
            if failures >= max {
                log::error!("Permission channel gave up after {} attempts", failures);
                break;
            }
        }

        let delay = policy.delay_for(failures);
        log::info!("Reconnecting permission channel in {:?}", delay);
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    state.send_replace(ChannelState::Stopped);
    log::info!("Permission channel stopped");
}

/// Feeds frames to the handler until the session ends. Returns `true` when
/// the end was a shutdown request.
async fn pump<F>(
    session: &mut dyn ChannelSession,
    on_message: &F,
    shutdown: &mut watch::Receiver<bool>,
) -> bool
where
    F: Fn(Value) + Send + Sync,
{
    loop {
        let frame = tokio::select! {
            _ = shutdown.changed() => None,
            frame = session.next_text() => Some(frame),
        };

        match frame {
            None => {
                session.close().await;
                return true;
            }
            Some(Some(Ok(text))) => match serde_json::from_str::<Value>(&text) {
                Ok(message) => on_message(message),
                Err(e) => log::warn!("Ignoring malformed permission message: {}", e),
            },
            Some(Some(Err(e))) => {
                log::error!("Permission channel error: {}", e);
                session.close().await;
                return false;
            }
            Some(None) => {
                log::info!("Permission channel closed by server");
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::time::sleep;

    use super::*;
    use crate::domain::errors::DomainError;

    struct ScriptedSession {
        frames: VecDeque<Result<String, DomainError>>,
        hold_open: bool,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ChannelSession for ScriptedSession {
        async fn next_text(&mut self) -> Option<Result<String, DomainError>> {
            match self.frames.pop_front() {
                Some(frame) => Some(frame),
                None if self.hold_open => std::future::pending().await,
                None => None,
            }
        }

        async fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Hands out scripted outcomes in order, refusing once the script runs out.
    #[derive(Default)]
    struct ScriptedConnector {
        script: Mutex<VecDeque<Result<(Vec<Result<String, DomainError>>, bool), DomainError>>>,
        bearers: Mutex<Vec<String>>,
        closes: Arc<AtomicUsize>,
    }

    impl ScriptedConnector {
        fn session(self, frames: Vec<Result<String, DomainError>>, hold_open: bool) -> Self {
            self.script.lock().unwrap().push_back(Ok((frames, hold_open)));
            self
        }

        fn refuse(self) -> Self {
            self.script
                .lock()
                .unwrap()
                .push_back(Err(DomainError::Network("refused".to_string())));
            self
        }

        fn attempts(&self) -> usize {
            self.bearers.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChannelConnector for ScriptedConnector {
        async fn connect(&self, bearer: &str) -> Result<Box<dyn ChannelSession>, DomainError> {
            self.bearers.lock().unwrap().push(bearer.to_string());
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DomainError::Network("refused".to_string())));
            let (frames, hold_open) = next?;
            Ok(Box::new(ScriptedSession {
                frames: frames.into_iter().collect(),
                hold_open,
                closes: self.closes.clone(),
            }))
        }
    }

    fn start(
        connector: &Arc<ScriptedConnector>,
        policy: ReconnectPolicy,
    ) -> (ChannelHandle, Arc<Mutex<Vec<Value>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let handle = PermissionChannel::new(connector.clone(), policy)
            .spawn(&Session::new("tok"), move |v| sink.lock().unwrap().push(v))
            .expect("authenticated session starts the channel");
        (handle, received)
    }

    #[tokio::test(start_paused = true)]
    async fn reconnects_once_per_close_after_the_delay() {
        let connector = Arc::new(ScriptedConnector::default().session(vec![], false).session(vec![], true));
        let (handle, _) = start(&connector, ReconnectPolicy::default());

        sleep(Duration::from_millis(4900)).await;
        assert_eq!(connector.attempts(), 1);
        assert_eq!(handle.state(), ChannelState::Disconnected);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(connector.attempts(), 2);
        assert_eq!(handle.state(), ChannelState::Connected);

        sleep(Duration::from_secs(120)).await;
        assert_eq!(connector.attempts(), 2);
        assert_eq!(*connector.bearers.lock().unwrap(), vec!["tok", "tok"]);

        handle.shutdown().await;
        assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_a_pending_retry() {
        let connector = Arc::new(ScriptedConnector::default().refuse());
        let (handle, _) = start(&connector, ReconnectPolicy::default());
        let state = handle.subscribe();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(*state.borrow(), ChannelState::Disconnected);

        handle.shutdown().await;
        assert_eq!(*state.borrow(), ChannelState::Stopped);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_json_messages_and_skips_malformed_ones() {
        let frames = vec![
            Ok(r#"{"permission": "orders.edit"}"#.to_string()),
            Ok("not json".to_string()),
            Ok(r#"{"permission": "orders.pay"}"#.to_string()),
        ];
        let connector = Arc::new(ScriptedConnector::default().session(frames, true));
        let (handle, received) = start(&connector, ReconnectPolicy::default());

        sleep(Duration::from_millis(10)).await;
        assert_eq!(
            *received.lock().unwrap(),
            vec![
                json!({"permission": "orders.edit"}),
                json!({"permission": "orders.pay"})
            ]
        );
        assert_eq!(handle.state(), ChannelState::Connected);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_closes_the_session_and_reconnects() {
        let connector = Arc::new(
            ScriptedConnector::default()
                .session(vec![Err(DomainError::Network("reset".to_string()))], true)
                .session(vec![], true),
        );
        let (handle, _) = start(&connector, ReconnectPolicy::fixed(Duration::from_secs(5)));

        sleep(Duration::from_millis(10)).await;
        assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
        assert_eq!(connector.attempts(), 1);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(connector.attempts(), 2);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_max_attempts() {
        let connector = Arc::new(ScriptedConnector::default());
        let policy = ReconnectPolicy {
            max_attempts: Some(2),
            ..ReconnectPolicy::fixed(Duration::from_secs(1))
        };
        let (handle, _) = start(&connector, policy);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(connector.attempts(), 2);
        assert_eq!(handle.state(), ChannelState::Stopped);
    }

    #[test]
    fn anonymous_session_does_not_start() {
        let channel = PermissionChannel::new(
            Arc::new(ScriptedConnector::default()),
            ReconnectPolicy::default(),
        );
        assert!(channel.spawn(&Session::anonymous(), |_| {}).is_none());
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(5));
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(2), Duration::from_secs(10));
        assert_eq!(policy.delay_for(3), Duration::from_secs(20));
        assert_eq!(policy.delay_for(5), Duration::from_secs(60));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(60));

        let fixed = ReconnectPolicy::fixed(Duration::from_secs(5));
        assert_eq!(fixed.delay_for(7), Duration::from_secs(5));
    }
}
