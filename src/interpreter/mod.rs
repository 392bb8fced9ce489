//! Script interpreter.
//!
//! Walks one entry point's block sequence against a [`Scene`], pausing after
//! every visible action so a renderer can animate it. Nesting is handled with
//! an explicit frame stack: each repeat block pushes a frame that loops over
//! its body, and a successful eat unwinds every frame at once.

/// Run events and the shared event log.
pub mod event;

use std::time::Duration;
use tracing::{debug, trace};

use crate::config::Pacing;
use crate::program::{BlockNode, Direction};
use crate::scene::Scene;

pub use event::{EventLog, RunEvent, RunOutcome};

/// A move ending closer than this reports that the target is near.
pub const NEAR_TARGET_DISTANCE: f64 = 60.0;

/// An eat block succeeds when the target is closer than this.
pub const EAT_DISTANCE: f64 = 50.0;

/// Mutable state of a single run, threaded through every interpreter call.
#[derive(Debug)]
pub struct RunContext {
    log: EventLog,
    succeeded: bool,
}

impl RunContext {
    /// Start a fresh run writing into `log`.
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            succeeded: false,
        }
    }

    /// Whether the target has been eaten during this run.
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Outcome so far.
    pub fn outcome(&self) -> RunOutcome {
        if self.succeeded {
            RunOutcome::Succeeded
        } else {
            RunOutcome::Exhausted
        }
    }

    /// Record an event.
    pub fn emit(&self, event: RunEvent) {
        self.log.push(event);
    }

    /// The log this run writes into.
    pub fn log(&self) -> &EventLog {
        &self.log
    }
}

/// Executes block sequences against a borrowed scene.
pub struct Interpreter<'s, S: ?Sized> {
    scene: &'s mut S,
    pacing: Pacing,
}

impl<'s, S: Scene + ?Sized> Interpreter<'s, S> {
    /// Create an interpreter driving `scene` with the given pacing.
    pub fn new(scene: &'s mut S, pacing: Pacing) -> Self {
        Self { scene, pacing }
    }

    /// Run `blocks` in order until they are exhausted or the target is eaten.
    ///
    /// Returns immediately if `ctx` already records a success.
    pub async fn run_sequence(&mut self, blocks: &[BlockNode], ctx: &mut RunContext) {
        let mut frames = vec![Frame::new(blocks, FrameKind::Sequence)];

        while !ctx.succeeded {
            let Some(frame) = frames.last_mut() else {
                break;
            };

            if frame.index >= frame.blocks.len() {
                match &mut frame.kind {
                    FrameKind::Sequence => {
                        frames.pop();
                    }
                    FrameKind::Repeat { iteration, count } => {
                        pause(self.pacing.step()).await;
                        if *iteration < *count {
                            *iteration += 1;
                            frame.index = 0;
                            ctx.emit(RunEvent::Repetition {
                                iteration: *iteration,
                                count: *count,
                            });
                        } else {
                            frames.pop();
                        }
                    }
                }
                continue;
            }

            let blocks = frame.blocks;
            let block = &blocks[frame.index];
            frame.index += 1;
            trace!(block = block.label(), depth = frames.len(), "executing block");

            match block {
                BlockNode::Start => {}
                BlockNode::Move { direction } => self.step(*direction, ctx).await,
                BlockNode::Eat => self.eat(ctx).await,
                BlockNode::Repeat { count, body } => {
                    let count = count.get();
                    ctx.emit(RunEvent::Repetition {
                        iteration: 1,
                        count,
                    });
                    frames.push(Frame::new(
                        body,
                        FrameKind::Repeat {
                            iteration: 1,
                            count,
                        },
                    ));
                }
            }
        }
    }

    async fn step(&mut self, direction: Direction, ctx: &mut RunContext) {
        self.scene.move_actor(direction);
        let distance = self.scene.distance_to_target();
        debug!(%direction, distance, "moved actor");
        if distance < NEAR_TARGET_DISTANCE {
            ctx.emit(RunEvent::NearTarget { distance });
        }
        pause(self.pacing.step()).await;
    }

    async fn eat(&mut self, ctx: &mut RunContext) {
        let distance = self.scene.distance_to_target();
        if distance < EAT_DISTANCE {
            self.scene.consume_target();
            ctx.succeeded = true;
            debug!(distance, "target eaten");
            ctx.emit(RunEvent::TargetEaten);
            pause(self.pacing.celebration()).await;
        } else {
            debug!(distance, "target out of reach");
            ctx.emit(RunEvent::TooFar { distance });
        }
    }
}

/// Yield to the runtime for `duration`; zero skips the await entirely.
async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

struct Frame<'p> {
    blocks: &'p [BlockNode],
    index: usize,
    kind: FrameKind,
}

enum FrameKind {
    Sequence,
    Repeat { iteration: u32, count: u32 },
}

impl<'p> Frame<'p> {
    fn new(blocks: &'p [BlockNode], kind: FrameKind) -> Self {
        Self {
            blocks,
            index: 0,
            kind,
        }
    }
}
