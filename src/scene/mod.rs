//! Scene capability consumed by the interpreter.
//!
//! The interpreter never touches positions directly; it asks the scene to
//! move the actor, measure the remaining distance, and consume the target.
//! A renderer implements [`Scene`] for its own stage, and [`Stage`] provides
//! a headless implementation with the classic playground geometry.

/// Headless rectangular stage.
pub mod stage;

use serde::{Deserialize, Serialize};

use crate::program::Direction;

pub use stage::{Stage, StageConfig};

/// Operations the interpreter performs against the scene.
pub trait Scene {
    /// Restore actor and target to their initial positions, show the target,
    /// and return the actor to its hungry look. Calling it twice is the same
    /// as calling it once.
    fn reset(&mut self);

    /// Displace the actor by one step, clamped to the scene bounds.
    fn move_actor(&mut self, direction: Direction);

    /// Euclidean distance between the actor and the target.
    fn distance_to_target(&self) -> f64;

    /// Hide the target and mark it eaten. A second call does nothing.
    fn consume_target(&mut self);
}

/// A position on the stage, in stage units from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal offset.
    pub x: f64,
    /// Vertical offset; grows downward.
    pub y: f64,
}

impl Point {
    /// Construct a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// How the actor is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorMood {
    /// Still looking for food.
    #[default]
    Hungry,
    /// Has eaten the target.
    Satisfied,
}

/// Observable state of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneState {
    /// Current actor position.
    pub actor: Point,
    /// Current target position.
    pub target: Point,
    /// Whether the target has been eaten (and hidden).
    pub target_consumed: bool,
    /// Actor appearance.
    pub mood: ActorMood,
}
