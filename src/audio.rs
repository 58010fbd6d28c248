//! Sound cues
//!
//! The simulation never plays audio. It emits [`SoundCue`]s as game events
//! and the host maps them to its own assets, best effort.

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Player fired
    Shoot,
    /// Enemy fired or swung
    EnemyAttack,
    /// Player bullet hit an enemy that survived
    EnemyHit,
    /// Enemy, bonus ship or boss destroyed
    Explosion,
    /// Character lost a life
    PlayerHit,
    /// Shield absorbed a hit
    ShieldBlock,
    /// Item picked up
    Pickup,
    /// Active item triggered
    ItemUse,
    /// Class skill triggered
    Skill,
    /// Level target reached
    LevelClear,
    /// Team out of lives
    GameOver,
    /// Achievement unlocked
    Achievement,
}

impl SoundCue {
    /// Asset key the host looks the cue up by
    pub fn name(&self) -> &'static str {
        match self {
            SoundCue::Shoot => "shoot",
            SoundCue::EnemyAttack => "enemy_attack",
            SoundCue::EnemyHit => "enemy_hit",
            SoundCue::Explosion => "explosion",
            SoundCue::PlayerHit => "player_hit",
            SoundCue::ShieldBlock => "shield_block",
            SoundCue::Pickup => "pickup",
            SoundCue::ItemUse => "item_use",
            SoundCue::Skill => "skill",
            SoundCue::LevelClear => "level_clear",
            SoundCue::GameOver => "game_over",
            SoundCue::Achievement => "achievement",
        }
    }
}
