//! Run orchestration
//!
//! The controller owns the scene, the current program, and the event log.
//! It admits one run at a time: a request arriving while a run is active is
//! dropped without touching any state.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{MutexGuard, broadcast};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::Pacing;
use crate::interpreter::{EventLog, Interpreter, RunContext, RunEvent, RunOutcome};
use crate::program::Program;
use crate::scene::Scene;

/// Record of one completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// Name of the program that ran.
    pub program: String,
    /// Every event emitted, in order.
    pub events: Vec<RunEvent>,
    /// Terminal outcome.
    pub outcome: RunOutcome,
    /// Number of entry points found; zero means the run was aborted.
    pub entry_points: usize,
    /// When the run began.
    pub started_at: DateTime<Utc>,
    /// When the run ended.
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    /// Whether the target was eaten.
    pub fn succeeded(&self) -> bool {
        self.outcome == RunOutcome::Succeeded
    }

    /// Whether the run stopped early for lack of a `start` block.
    pub fn aborted(&self) -> bool {
        self.entry_points == 0
    }
}

/// Clears the in-progress flag when the run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Top-level driver that runs the current program against a scene.
pub struct RunController<S> {
    scene: tokio::sync::Mutex<S>,
    program: RwLock<Arc<Program>>,
    pacing: Pacing,
    log: EventLog,
    running: AtomicBool,
    last_result: Mutex<Option<RunResult>>,
}

impl<S: Scene + Send> RunController<S> {
    /// Create a controller for `scene`, initially holding `program`.
    pub fn new(scene: S, program: Program, pacing: Pacing) -> Self {
        Self {
            scene: tokio::sync::Mutex::new(scene),
            program: RwLock::new(Arc::new(program)),
            pacing,
            log: EventLog::new(),
            running: AtomicBool::new(false),
            last_result: Mutex::new(None),
        }
    }

    /// Execute the current program once.
    ///
    /// Returns `None` without changing anything if a run is already active.
    pub async fn run(&self) -> Option<RunResult> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            warn!("run already in progress; request dropped");
            return None;
        };

        let run_id = Uuid::new_v4();
        let result = self
            .execute(run_id)
            .instrument(info_span!("run", %run_id))
            .await;
        *self.last_result.lock() = Some(result.clone());
        Some(result)
    }

    async fn execute(&self, run_id: Uuid) -> RunResult {
        let started_at = Utc::now();
        let program = Arc::clone(&self.program.read());
        let mut scene = self.scene.lock().await;

        scene.reset();
        self.log.clear();
        let mut ctx = RunContext::new(self.log.clone());

        let sequences: Vec<_> = program.entry_points().collect();
        let entry_points = sequences.len();
        if entry_points == 0 {
            info!(program = %program.name, "no entry point; run aborted");
            ctx.emit(RunEvent::MissingEntryPoint);
            return self.result(run_id, &program, &ctx, 0, started_at);
        }

        info!(
            program = %program.name,
            entry_points,
            blocks = program.block_count(),
            "run started"
        );
        ctx.emit(RunEvent::Started);

        let mut interpreter = Interpreter::new(&mut *scene, self.pacing);
        for (index, sequence) in sequences.into_iter().enumerate() {
            if ctx.succeeded() {
                break;
            }
            debug!(entry = index, blocks = sequence.len(), "running entry point");
            interpreter.run_sequence(sequence, &mut ctx).await;
        }

        let outcome = ctx.outcome();
        ctx.emit(RunEvent::Finished { outcome });
        info!(?outcome, "run finished");
        self.result(run_id, &program, &ctx, entry_points, started_at)
    }

    fn result(
        &self,
        run_id: Uuid,
        program: &Program,
        ctx: &RunContext,
        entry_points: usize,
        started_at: DateTime<Utc>,
    ) -> RunResult {
        RunResult {
            run_id,
            program: program.name.clone(),
            events: ctx.log().snapshot(),
            outcome: ctx.outcome(),
            entry_points,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Replace the program used by subsequent runs. An active run keeps the
    /// program it started with.
    pub fn set_program(&self, program: Program) {
        *self.program.write() = Arc::new(program);
    }

    /// The program the next run will execute.
    pub fn program(&self) -> Arc<Program> {
        Arc::clone(&self.program.read())
    }

    /// Whether a run is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Events of the active or most recent run.
    pub fn events(&self) -> Vec<RunEvent> {
        self.log.snapshot()
    }

    /// Receive events live as runs emit them.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.log.subscribe()
    }

    /// Result of the most recent completed run.
    pub fn last_result(&self) -> Option<RunResult> {
        self.last_result.lock().clone()
    }

    /// Configured pacing.
    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Lock the scene, waiting for an active run to finish.
    pub async fn scene(&self) -> MutexGuard<'_, S> {
        self.scene.lock().await
    }

    /// Lock the scene if no run currently holds it.
    pub fn try_scene(&self) -> Option<MutexGuard<'_, S>> {
        self.scene.try_lock().ok()
    }
}
