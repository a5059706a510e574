use super::state::{SessionSnapshot, SessionState, SessionStatus, SessionUpdate};
use crate::{
    config::SessionConfig,
    depth::DepthSampler,
    error::{FeedError, SessionError, StreamConnectionError},
    feed::{DepthSource, TradeSource},
};
use futures::StreamExt;
use smol_str::SmolStr;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, mpsc, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

/// Owns the lifecycle of the (single) analysis session.
///
/// Each session runs as one session task which spawns two producers, the trade stream task
/// and the depth poll task. Producers never touch session data: they send [`SessionUpdate`]s
/// through a bounded channel and the session task applies them one at a time, publishing
/// the resulting [`SessionSnapshot`] through a `watch` channel so readers always see a whole
/// update.
pub struct SessionController {
    trades: Arc<dyn TradeSource>,
    depth: Arc<dyn DepthSource>,
    config: SessionConfig,
    published: Arc<watch::Sender<SessionSnapshot>>,
    active: Mutex<Option<ActiveSession>>,
}

/// Handle to the running session task.
#[derive(Debug)]
struct ActiveSession {
    symbol: SmolStr,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("config", &self.config)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl SessionController {
    pub fn new(
        trades: Arc<dyn TradeSource>,
        depth: Arc<dyn DepthSource>,
        config: SessionConfig,
    ) -> Self {
        let (published, _) = watch::channel(SessionSnapshot::idle());
        Self {
            trades,
            depth,
            config,
            published: Arc::new(published),
            active: Mutex::new(None),
        }
    }

    /// Receiver notified on every published [`SessionSnapshot`].
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.published.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.published.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.published.borrow().status
    }

    /// Start analysing `symbol` with zeroed session state.
    ///
    /// Any session on another symbol (or a faulted one) is fully stopped first. Starting the
    /// symbol that is already running is a no-op. Returns once the session task is spawned;
    /// connecting happens in the background and a connection failure surfaces as
    /// [`SessionStatus::Faulted`].
    pub async fn start(&self, symbol: &str) -> Result<(), SessionError> {
        let symbol = SmolStr::new(symbol.trim().to_uppercase());
        if symbol.is_empty() {
            return Err(SessionError::EmptySymbol);
        }

        let mut active = self.active.lock().await;

        if let Some(current) = active.as_ref() {
            if current.symbol == symbol && self.status() == SessionStatus::Running {
                debug!(%symbol, "session already running");
                return Ok(());
            }
        }

        if let Some(current) = active.take() {
            self.teardown(current).await;
        }

        self.published
            .send_replace(SessionSnapshot::starting(symbol.clone()));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let session = SessionTask {
            symbol: symbol.clone(),
            trades: Arc::clone(&self.trades),
            sampler: DepthSampler::new(Arc::clone(&self.depth), self.config.depth_levels),
            config: self.config.clone(),
            published: Arc::clone(&self.published),
        };

        self.published
            .send_modify(|snapshot| snapshot.status = SessionStatus::Running);

        let task = tokio::spawn(session.run(shutdown_rx));
        info!(%symbol, "session started");

        *active = Some(ActiveSession {
            symbol,
            shutdown_tx,
            task,
        });

        Ok(())
    }

    /// Stop the current session, closing the trade stream and cancelling the depth poll.
    ///
    /// Resolves once both are released. Calling `stop` with no session is a no-op.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(current) => self.teardown(current).await,
            None => debug!("stop requested with no active session"),
        }
    }

    async fn teardown(&self, session: ActiveSession) {
        let ActiveSession {
            symbol,
            shutdown_tx,
            task,
        } = session;

        self.published.send_modify(|snapshot| {
            if snapshot.status != SessionStatus::Faulted {
                snapshot.status = SessionStatus::Stopping;
            }
        });

        let _ = shutdown_tx.send(true);
        if let Err(error) = task.await {
            error!(%symbol, %error, "session task terminated abnormally");
        }

        self.published.send_replace(SessionSnapshot::idle());
        info!(%symbol, "session stopped");
    }
}

/// Everything the session task needs, moved into the task on start.
struct SessionTask {
    symbol: SmolStr,
    trades: Arc<dyn TradeSource>,
    sampler: DepthSampler,
    config: SessionConfig,
    published: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionTask {
    /// Single writer of session data. Runs until shutdown is signalled (or the controller is
    /// dropped) or a fatal stream error occurs, then releases both producers before returning.
    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let Self {
            symbol,
            trades,
            sampler,
            config,
            published,
        } = self;

        let (update_tx, mut update_rx) = mpsc::channel(config.update_buffer_size.max(1));
        let (producer_shutdown_tx, producer_shutdown_rx) = watch::channel(false);

        let trade_task = tokio::spawn(stream_trades(
            trades,
            symbol.clone(),
            update_tx.clone(),
            producer_shutdown_rx.clone(),
        ));
        let depth_task = tokio::spawn(poll_depth(
            sampler,
            symbol.clone(),
            config,
            update_tx,
            producer_shutdown_rx,
        ));

        let mut state = SessionState::new();
        let mut fault = None;

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => break,

                update = update_rx.recv() => {
                    let Some(update) = update else {
                        break;
                    };

                    match state.apply(update) {
                        Ok(()) => published.send_modify(|snapshot| state.write_to(snapshot)),
                        Err(error) => {
                            fault = Some(error);
                            break;
                        }
                    }
                }
            }
        }

        // Updates still queued after close are discarded
        let _ = producer_shutdown_tx.send(true);
        drop(update_rx);

        for (name, task) in [("trade stream", trade_task), ("depth poll", depth_task)] {
            if let Err(error) = task.await {
                error!(%symbol, %error, "{name} task terminated abnormally");
            }
        }

        if let Some(error) = fault {
            error!(%symbol, %error, "trade stream failed, session faulted");
            published.send_modify(|snapshot| {
                snapshot.status = SessionStatus::Faulted;
                snapshot.fault = Some(error.to_string());
            });
        }
    }
}

/// Connect to the trade stream and forward trades in arrival order until shutdown, the session
/// task going away, or a fatal stream error.
async fn stream_trades(
    source: Arc<dyn TradeSource>,
    symbol: SmolStr,
    update_tx: mpsc::Sender<SessionUpdate>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let connection = tokio::select! {
        _ = shutdown_rx.changed() => return,
        connection = source.connect(&symbol) => connection,
    };

    let mut stream = match connection {
        Ok(stream) => stream,
        Err(error) => {
            let _ = update_tx.send(SessionUpdate::Fault(error)).await;
            return;
        }
    };

    loop {
        let item = tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            item = stream.next() => item,
        };

        let update = match item {
            Some(Ok(trade)) => SessionUpdate::Trade(trade),
            Some(Err(FeedError::Malformed(error))) => {
                debug!(%symbol, %error, "dropping malformed trade message");
                SessionUpdate::Malformed(error)
            }
            Some(Err(FeedError::Connection(error))) => SessionUpdate::Fault(error),
            None => SessionUpdate::Fault(StreamConnectionError::Ended),
        };

        let is_fault = matches!(update, SessionUpdate::Fault(_));
        if update_tx.send(update).await.is_err() || is_fault {
            break;
        }
    }

    debug!(%symbol, "trade stream closed");
}

/// Sample order book depth every `poll_interval` until shutdown or the session task going
/// away. The first sample is taken one interval after start. Failures are logged and
/// reported, never fatal.
async fn poll_depth(
    sampler: DepthSampler,
    symbol: SmolStr,
    config: SessionConfig,
    update_tx: mpsc::Sender<SessionUpdate>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let period = config.poll_interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        let update = tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            sample = sampler.sample(&symbol) => match sample {
                Ok(snapshot) => SessionUpdate::Depth(snapshot),
                Err(error) => {
                    warn!(%symbol, %error, "depth poll failed, keeping previous snapshot");
                    SessionUpdate::DepthFailed(error)
                }
            },
        };

        if update_tx.send(update).await.is_err() {
            break;
        }
    }

    debug!(%symbol, "depth poll cancelled");
}
