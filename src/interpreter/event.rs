use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the live event channel; slow subscribers skip older events.
const LIVE_CHANNEL_CAPACITY: usize = 256;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// The actor ate the target.
    Succeeded,
    /// Every reachable block ran without the target being eaten.
    Exhausted,
}

/// One entry in the run's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// A run began executing its entry points.
    Started,
    /// A repeat block began iteration `iteration` of `count`.
    Repetition {
        /// 1-based iteration number.
        iteration: u32,
        /// Total iterations of the block.
        count: u32,
    },
    /// A move ended within sniffing distance of the target.
    NearTarget {
        /// Distance after the move.
        distance: f64,
    },
    /// An eat block ran while the target was out of reach.
    TooFar {
        /// Distance at the time of the attempt.
        distance: f64,
    },
    /// The actor ate the target.
    TargetEaten,
    /// The program had no `start` block.
    MissingEntryPoint,
    /// Summary emitted at the end of a run.
    Finished {
        /// Final outcome.
        outcome: RunOutcome,
    },
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::Started => f.write_str("Running program..."),
            RunEvent::Repetition { iteration, count } => {
                write!(f, "Repetition {iteration} of {count}")
            }
            RunEvent::NearTarget { .. } => f.write_str("The cat is near the food!"),
            RunEvent::TooFar { .. } => f.write_str("The food is too far away. Keep trying!"),
            RunEvent::TargetEaten => f.write_str("Success! The cat ate the food"),
            RunEvent::MissingEntryPoint => {
                f.write_str("You need a \"when run starts\" block!")
            }
            RunEvent::Finished {
                outcome: RunOutcome::Succeeded,
            } => f.write_str("Program finished. The cat ate the food!"),
            RunEvent::Finished {
                outcome: RunOutcome::Exhausted,
            } => f.write_str("Program finished. The cat did not reach the food!"),
        }
    }
}

/// Ordered event log shared between a controller and the run it drives.
///
/// Every pushed event is both recorded and forwarded to live subscribers.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<RunEvent>>>,
    live: broadcast::Sender<RunEvent>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            live,
        }
    }

    /// Append an event.
    pub fn push(&self, event: RunEvent) {
        tracing::debug!(%event, "run event");
        self.entries.lock().push(event.clone());
        // No subscribers is fine; the log still has the event.
        let _ = self.live.send(event);
    }

    /// Drop all recorded events.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Copy of the recorded events, oldest first.
    pub fn snapshot(&self) -> Vec<RunEvent> {
        self.entries.lock().clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Receive events as they are pushed.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.live.subscribe()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
