use crate::{
    error::{MalformedMessageError, StreamConnectionError, TransientFetchError},
    flow::{FlowState, RatioHistory, VolumeAccumulator},
    model::{DepthSnapshot, TradeEvent},
    signal::{Signal, classify},
};
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Lifecycle status of the analysis session.
///
/// `Idle -> Starting -> Running -> Stopping -> Idle`, with `Running -> Faulted` on a fatal
/// trade stream error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, Display)]
pub enum SessionStatus {
    #[default]
    Idle,
    Starting,
    Running,
    Stopping,
    Faulted,
}

impl SessionStatus {
    /// True while a session owns (or is acquiring/releasing) feed resources.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionStatus::Starting | SessionStatus::Running | SessionStatus::Stopping
        )
    }
}

/// Diagnostic counters for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct SessionStats {
    pub trades_applied: u64,
    pub malformed_messages: u64,
    pub depth_samples: u64,
    pub depth_failures: u64,
}

/// Message sent by the trade stream and depth poll tasks to the session task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Trade(TradeEvent),
    Depth(DepthSnapshot),
    DepthFailed(TransientFetchError),
    Malformed(MalformedMessageError),
    Fault(StreamConnectionError),
}

/// Session data owned by the session task. The only place flow, history, depth and signal are
/// mutated.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    accumulator: VolumeAccumulator,
    depth: Option<DepthSnapshot>,
    signal: Signal,
    stats: SessionStats,
    last_update: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one update. Returns the fatal error carried by [`SessionUpdate::Fault`], leaving
    /// the state untouched.
    pub fn apply(&mut self, update: SessionUpdate) -> Result<(), StreamConnectionError> {
        match update {
            SessionUpdate::Trade(trade) => {
                self.accumulator.apply(&trade);
                self.stats.trades_applied += 1;
            }
            SessionUpdate::Depth(depth) => {
                self.signal = classify(self.accumulator.state().ratio, &depth);
                self.depth = Some(depth);
                self.stats.depth_samples += 1;
            }
            SessionUpdate::DepthFailed(_) => {
                self.stats.depth_failures += 1;
                return Ok(());
            }
            SessionUpdate::Malformed(_) => {
                self.stats.malformed_messages += 1;
                return Ok(());
            }
            SessionUpdate::Fault(error) => return Err(error),
        }

        self.last_update = Some(Utc::now());
        Ok(())
    }

    pub fn flow(&self) -> &FlowState {
        self.accumulator.state()
    }

    pub fn history(&self) -> &RatioHistory {
        self.accumulator.history()
    }

    pub fn depth(&self) -> Option<&DepthSnapshot> {
        self.depth.as_ref()
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Copy the session data into a published snapshot, leaving its lifecycle fields as is.
    pub fn write_to(&self, snapshot: &mut SessionSnapshot) {
        snapshot.flow = *self.accumulator.state();
        snapshot.history.clone_from(self.accumulator.history());
        snapshot.depth = self.depth;
        snapshot.signal = self.signal;
        snapshot.stats = self.stats;
        snapshot.last_update = self.last_update;
    }
}

/// Consistent, read-only view of the current session published to readers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct SessionSnapshot {
    pub symbol: Option<SmolStr>,
    pub status: SessionStatus,
    /// Human-readable cause of the last fault, set while `Faulted`.
    pub fault: Option<String>,
    pub flow: FlowState,
    pub history: RatioHistory,
    pub depth: Option<DepthSnapshot>,
    pub signal: Signal,
    pub stats: SessionStats,
    pub started_at: Option<DateTime<Utc>>,
    pub last_update: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// Snapshot with no session.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Zeroed snapshot for a session on `symbol` that is being started.
    pub fn starting(symbol: SmolStr) -> Self {
        Self {
            symbol: Some(symbol),
            status: SessionStatus::Starting,
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }
}
