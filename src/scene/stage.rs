use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{ActorMood, Point, Scene, SceneState};
use crate::program::Direction;

/// Geometry of a [`Stage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Stage width in stage units.
    pub width: f64,
    /// Stage height in stage units.
    pub height: f64,
    /// Distance covered by one move block.
    pub step: f64,
    /// Closest the actor may get to any edge.
    pub margin: f64,
    /// Initial actor position, as percentages of width and height.
    pub actor_start: Point,
    /// Initial target position, as percentages of width and height.
    pub target_start: Point,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 360.0,
            step: 30.0,
            margin: 20.0,
            actor_start: Point::new(25.0, 50.0),
            target_start: Point::new(75.0, 33.0),
        }
    }
}

impl StageConfig {
    fn resolve(&self, percent: Point) -> Point {
        Point::new(
            self.width * percent.x / 100.0,
            self.height * percent.y / 100.0,
        )
    }
}

/// Headless stage holding one actor and one target.
#[derive(Debug, Clone)]
pub struct Stage {
    config: StageConfig,
    state: SceneState,
}

impl Stage {
    /// Create a stage already in its initial layout.
    pub fn new(config: StageConfig) -> Self {
        let state = initial_state(&config);
        Self { config, state }
    }

    /// Stage geometry.
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Snapshot of the current scene state.
    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Current actor position.
    pub fn actor(&self) -> Point {
        self.state.actor
    }

    /// Current target position.
    pub fn target(&self) -> Point {
        self.state.target
    }

    /// Whether the target is still drawn.
    pub fn target_visible(&self) -> bool {
        !self.state.target_consumed
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(StageConfig::default())
    }
}

fn initial_state(config: &StageConfig) -> SceneState {
    SceneState {
        actor: config.resolve(config.actor_start),
        target: config.resolve(config.target_start),
        target_consumed: false,
        mood: ActorMood::Hungry,
    }
}

impl Scene for Stage {
    fn reset(&mut self) {
        self.state = initial_state(&self.config);
    }

    fn move_actor(&mut self, direction: Direction) {
        let StageConfig {
            width,
            height,
            step,
            margin,
            ..
        } = self.config;
        let actor = &mut self.state.actor;
        match direction {
            Direction::Up => actor.y = (actor.y - step).max(margin),
            Direction::Down => actor.y = (actor.y + step).min(height - margin),
            Direction::Left => actor.x = (actor.x - step).max(margin),
            Direction::Right => actor.x = (actor.x + step).min(width - margin),
        }
        trace!(%direction, x = actor.x, y = actor.y, "actor moved");
    }

    fn distance_to_target(&self) -> f64 {
        self.state.actor.distance_to(self.state.target)
    }

    fn consume_target(&mut self) {
        if self.state.target_consumed {
            return;
        }
        self.state.target_consumed = true;
        self.state.mood = ActorMood::Satisfied;
    }
}
