//! Blockstep – execution engine for nested block scripts
//!
//! A player snaps `start`, `move`, `repeat`, and `eat` blocks together; this
//! crate runs the resulting tree against a 2D scene:
//! - Block tree model with normalized repeat counts and a small text format
//! - Scene capability trait plus a headless reference stage
//! - Paced, strictly sequential interpreter with early exit on success
//! - Run controller that rejects overlapping runs and streams events live

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Engine configuration (pacing, stage geometry).
pub mod config;
/// Run orchestration and results.
pub mod controller;
/// Script interpreter and run events.
pub mod interpreter;
/// Block tree model and script parser.
pub mod program;
/// Scene capability and the built-in stage.
pub mod scene;

// Re-export key types for convenience
pub use config::{EngineConfig, Pacing};
pub use controller::{RunController, RunResult};
pub use interpreter::{EventLog, Interpreter, RunContext, RunEvent, RunOutcome};
pub use program::{BlockNode, Direction, Program, ProgramError, RepeatCount, parse_program};
pub use scene::{Scene, Stage, StageConfig};

/// Current version of the engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
