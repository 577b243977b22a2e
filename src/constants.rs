use crate::types::{Direction, Vec2};

// Cadence of the driving loop; the engine's own cadences below are
// multiples of it.
pub const TICK_RATE: u32 = 20;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const RUNNER_STEP_MS: u64 = 200;
pub const GHOST_STEP_MS: u64 = 400;
pub const MODE_SWITCH_MS: u64 = 7_000;
pub const VULNERABLE_DURATION_MS: u64 = 10_000;

pub const DOT_SCORE: i32 = 10;
pub const POWER_PELLET_SCORE: i32 = 50;
pub const GHOST_CAPTURE_SCORE: i32 = 200;

pub const INITIAL_LIVES: i32 = 3;
pub const INITIAL_LEVEL: i32 = 1;

// Probability that a pursuing ghost moves greedily toward the runner
// instead of picking a random corridor.
pub const PURSUE_BIAS: f32 = 0.65;

pub const RUNNER_SPAWN: Vec2 = Vec2 { x: 13, y: 26 };
pub const RUNNER_SPAWN_DIR: Direction = Direction::Right;

pub const GHOST_SPAWNS: [(Vec2, &str); 4] = [
    (Vec2 { x: 13, y: 11 }, "red"),
    (Vec2 { x: 12, y: 13 }, "pink"),
    (Vec2 { x: 13, y: 13 }, "cyan"),
    (Vec2 { x: 14, y: 13 }, "orange"),
];
pub const GHOST_SPAWN_DIR: Direction = Direction::Up;
