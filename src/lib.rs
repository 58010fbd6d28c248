//! Co-op Shooter - simulation core for a two-player arcade shooter
//!
//! Core modules:
//! - `sim`: Fixed-step simulation (pools, effects, items, combat, level state)
//! - `tuning`: Data-driven game balance
//! - `audio`: Sound cue vocabulary handed to the host's audio layer
//! - `highscores`: End-of-run leaderboard

pub mod audio;
pub mod highscores;
pub mod sim;
pub mod tuning;

pub use audio::SoundCue;
pub use highscores::HighScores;
pub use tuning::{Difficulty, Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Number of local players sharing one tick
    pub const NUM_PLAYERS: usize = 2;

    /// Arena dimensions (origin top-left, +y down)
    pub const ARENA_WIDTH: f32 = 448.0;
    pub const ARENA_HEIGHT: f32 = 640.0;
    /// Projectiles this far outside the arena are culled
    pub const CULL_MARGIN: f32 = 32.0;
    /// Enemies spawn and roam in the upper part of the arena
    pub const SPAWN_BAND_HEIGHT: f32 = 240.0;

    /// Character hitbox
    pub const CHARACTER_SIZE: f32 = 26.0;
    /// Enemy hitbox
    pub const ENEMY_SIZE: f32 = 24.0;
    /// Boss hitbox
    pub const BOSS_SIZE: f32 = 96.0;
    /// Falling item hitbox
    pub const ITEM_SIZE: f32 = 14.0;
    /// Player bullet hitbox
    pub const BULLET_WIDTH: f32 = 4.0;
    pub const BULLET_HEIGHT: f32 = 10.0;

    /// Bonus granted per remaining life at the end of a run
    pub const LIFE_SCORE: u64 = 100;
    /// Homing projectiles stop steering after this long
    pub const HOMING_MS: u64 = 5000;
    /// Coins and score granted per point of overflowing heal
    pub const HEAL_OVERFLOW_REWARD: u32 = 20;
}

/// Clamp a center position so a box of `size` stays inside the arena
#[inline]
pub fn clamp_to_arena(pos: Vec2, size: Vec2) -> Vec2 {
    let half = size * 0.5;
    Vec2::new(
        pos.x.clamp(half.x, consts::ARENA_WIDTH - half.x),
        pos.y.clamp(half.y, consts::ARENA_HEIGHT - half.y),
    )
}

/// Convert seconds to whole milliseconds, treating negatives as zero
#[inline]
pub fn secs_to_ms(secs: f32) -> u64 {
    if secs <= 0.0 {
        0
    } else {
        (secs * 1000.0).round() as u64
    }
}
