//! Game balance
//!
//! Everything a designer may want to tweak without touching the simulation.
//! Loaded from JSON; missing fields fall back to the defaults below.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sim::class::CharacterClass;
use crate::sim::player::{PerPlayer, PlayerId};
use crate::sim::run::PlayMode;

/// Upper bounds that keep every derived quantity well inside integer range
pub const MAX_LIVES: u32 = 99;
pub const MAX_DAMAGE: i32 = 10_000;
pub const MAX_BOSS_HEALTH: i32 = 1_000_000;
pub const MAX_KILLS: u32 = 10_000;
pub const MAX_LEVEL: u32 = 10_000;
pub const MAX_ENEMIES: usize = 1_024;
/// Longest timer a tuning file may ask for (one hour)
pub const MAX_MS: u64 = 3_600_000;

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    /// Lives each player starts with
    pub fn lives_per_player(&self) -> u32 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Normal => 3,
            Difficulty::Hard => 2,
        }
    }

    /// Spawn interval scale (lower spawns faster)
    pub fn spawn_scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 1.4,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 0.7,
        }
    }

    /// Chance a destroyed enemy drops an item
    pub fn drop_chance(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.35,
            Difficulty::Normal => 0.25,
            Difficulty::Hard => 0.15,
        }
    }
}

impl FromStr for Difficulty {
    type Err = TuningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" | "medium" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(TuningError::Invalid {
                field: "difficulty",
                reason: format!("unknown preset '{s}'"),
            }),
        }
    }
}

/// What a hostile hit costs a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DamageModel {
    /// Every hit costs a life
    #[default]
    Arcade,
    /// Hits drain class health (after defense); a life goes when it runs out
    Health,
}

/// Balance parameters for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub difficulty: Difficulty,
    pub mode: PlayMode,
    pub lives_per_player: u32,
    pub starting_coins: u32,

    // === Players ===
    pub classes: PerPlayer<CharacterClass>,
    pub damage_model: DamageModel,
    /// Invincibility after a hit that did not cost a life
    pub hit_guard_ms: u64,
    /// Pixels per second
    pub player_speed: f32,
    pub fire_cooldown_ms: u64,
    /// Pixels per second, fired straight up
    pub bullet_speed: f32,
    pub bullet_damage: i32,
    /// Angle between the side bullets of a triple shot (radians)
    pub triple_shot_spread: f32,
    /// Invincible respawn delay after a hit
    pub respawn_ms: u64,
    /// Base dash distance, scaled by the Dash magnitude
    pub dash_distance: f32,

    // === Enemies ===
    pub spawn_interval_ms: u64,
    pub spawn_jitter_ms: u64,
    pub max_enemies: usize,
    pub bonus_interval_ms: u64,
    pub bonus_jitter_ms: u64,
    pub explosion_ms: u64,
    pub boss_health: i32,
    pub boss_spread_ms: u64,
    pub boss_missile_ms: u64,

    // === Levels ===
    pub kills_base: u32,
    pub kills_per_level: u32,
    /// Every n-th level is a boss level (0 disables bosses)
    pub boss_every: u32,
    pub final_level: u32,

    // === Items ===
    pub drop_chance: f32,
    /// Pixels per second
    pub item_fall_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self::from_difficulty(Difficulty::Normal)
    }
}

impl Tuning {
    /// Defaults adjusted for a difficulty preset
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let scale = difficulty.spawn_scale();
        Self {
            difficulty,
            mode: PlayMode::CoopShared,
            lives_per_player: difficulty.lives_per_player(),
            starting_coins: 0,

            classes: PerPlayer::from_fn(|p| match p {
                PlayerId::One => CharacterClass::Warrior,
                PlayerId::Two => CharacterClass::Archer,
            }),
            damage_model: DamageModel::Arcade,
            hit_guard_ms: 1000,
            player_speed: 220.0,
            fire_cooldown_ms: 250,
            bullet_speed: 480.0,
            bullet_damage: 1,
            triple_shot_spread: 0.2,
            respawn_ms: 1000,
            dash_distance: 40.0,

            spawn_interval_ms: (1000.0 * scale) as u64,
            spawn_jitter_ms: (1000.0 * scale) as u64,
            max_enemies: 12,
            bonus_interval_ms: 20_000,
            bonus_jitter_ms: 5_000,
            explosion_ms: 500,
            boss_health: 120,
            boss_spread_ms: 2_500,
            boss_missile_ms: 1_000,

            kills_base: 10,
            kills_per_level: 5,
            boss_every: 5,
            final_level: 10,

            drop_chance: difficulty.drop_chance(),
            item_fall_speed: 90.0,
        }
    }

    /// Kills needed to clear `level`
    pub fn kill_target(&self, level: u32) -> u32 {
        self.kills_base
            .saturating_add(self.kills_per_level.saturating_mul(level))
    }

    pub fn is_boss_level(&self, level: u32) -> bool {
        self.boss_every > 0 && level % self.boss_every == 0
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        fn check(ok: bool, field: &'static str, reason: &str) -> Result<(), TuningError> {
            if ok {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    reason: reason.to_string(),
                })
            }
        }

        let finite_positive = |v: f32| v.is_finite() && v > 0.0;
        let ms_ok = |ms: u64| ms <= MAX_MS;

        check(
            (1..=MAX_LIVES).contains(&self.lives_per_player),
            "lives_per_player",
            "must be within 1..=99",
        )?;
        check(finite_positive(self.player_speed), "player_speed", "must be positive")?;
        check(finite_positive(self.bullet_speed), "bullet_speed", "must be positive")?;
        check(
            (1..=MAX_DAMAGE).contains(&self.bullet_damage),
            "bullet_damage",
            "must be within 1..=10000",
        )?;
        check(
            self.triple_shot_spread.is_finite(),
            "triple_shot_spread",
            "must be a number",
        )?;
        check(
            self.dash_distance.is_finite() && self.dash_distance >= 0.0,
            "dash_distance",
            "must not be negative",
        )?;
        check(
            (1..=MAX_BOSS_HEALTH).contains(&self.boss_health),
            "boss_health",
            "must be within 1..=1000000",
        )?;
        check(
            (1..=MAX_KILLS).contains(&self.kills_base),
            "kills_base",
            "must be within 1..=10000",
        )?;
        check(
            self.kills_per_level <= MAX_KILLS,
            "kills_per_level",
            "must be at most 10000",
        )?;
        check(
            (1..=MAX_LEVEL).contains(&self.final_level),
            "final_level",
            "must be within 1..=10000",
        )?;
        check(self.max_enemies <= MAX_ENEMIES, "max_enemies", "must be at most 1024")?;
        check(
            [
                self.fire_cooldown_ms,
                self.respawn_ms,
                self.hit_guard_ms,
                self.spawn_interval_ms,
                self.spawn_jitter_ms,
                self.bonus_interval_ms,
                self.bonus_jitter_ms,
                self.explosion_ms,
                self.boss_spread_ms,
                self.boss_missile_ms,
            ]
            .into_iter()
            .all(ms_ok),
            "timers",
            "durations must be at most one hour",
        )?;
        check(
            (0.0..=1.0).contains(&self.drop_chance),
            "drop_chance",
            "must be within 0..=1",
        )?;
        check(
            finite_positive(self.item_fall_speed),
            "item_fall_speed",
            "must be positive",
        )?;
        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum TuningError {
    /// Malformed JSON or wrong field types
    Parse(serde_json::Error),
    /// Well-formed but unusable value
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "malformed configuration: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        for difficulty in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            assert!(Tuning::from_difficulty(difficulty).validate().is_ok());
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "lives_per_player": 4, "mode": "Solo" }"#).unwrap();
        assert_eq!(tuning.lives_per_player, 4);
        assert_eq!(tuning.mode, PlayMode::Solo);
        assert_eq!(tuning.kills_base, Tuning::default().kills_base);
    }

    #[test]
    fn test_round_trip_json() {
        let tuning = Tuning::from_difficulty(Difficulty::Hard);
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Tuning::from_json(r#"{ "lives_per_player": 0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "lives_per_player", .. }));
        assert!(err.to_string().contains("lives_per_player"));

        let err = Tuning::from_json(r#"{ "drop_chance": 1.5 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "drop_chance", .. }));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let err = Tuning::from_json(r#"{ "lives_per_player": 4294967295 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "lives_per_player", .. }));

        let err = Tuning::from_json(r#"{ "bullet_damage": 2147483647 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "bullet_damage", .. }));

        let err = Tuning::from_json(r#"{ "boss_health": 2147483647 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "boss_health", .. }));

        let err = Tuning::from_json(r#"{ "respawn_ms": 18446744073709551615 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "timers", .. }));

        let tuning = Tuning {
            lives_per_player: MAX_LIVES,
            kills_per_level: MAX_KILLS,
            ..Tuning::default()
        };
        assert!(tuning.validate().is_ok());
        assert_eq!(tuning.kill_target(u32::MAX), u32::MAX);
    }

    #[test]
    fn test_classes_and_damage_model_from_json() {
        let tuning = Tuning::from_json(
            r#"{ "classes": ["Wizard", "Bomber"], "damage_model": "Health" }"#,
        )
        .unwrap();
        assert_eq!(tuning.classes[PlayerId::One], CharacterClass::Wizard);
        assert_eq!(tuning.classes[PlayerId::Two], CharacterClass::Bomber);
        assert_eq!(tuning.damage_model, DamageModel::Health);
        assert_eq!(Tuning::default().damage_model, DamageModel::Arcade);
    }

    #[test]
    fn test_malformed_json() {
        let err = Tuning::from_json("{ lives: ").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("brutal".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_level_targets() {
        let tuning = Tuning::default();
        assert_eq!(tuning.kill_target(1), 15);
        assert!(tuning.is_boss_level(5));
        assert!(!tuning.is_boss_level(4));
    }
}
