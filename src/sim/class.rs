//! Playable character classes
//!
//! A class fixes a ship's health, mana, handling and critical-hit odds, and
//! picks the skill bound to the skill button.

use serde::{Deserialize, Serialize};

use super::skill::SkillKind;

/// Base stats of one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassStats {
    pub max_health: i32,
    pub max_mana: i32,
    /// Multiplies the tuned player speed
    pub speed_scale: f32,
    /// Flat damage reduction applied as `damage * 100 / (100 + defense)`
    pub defense: i32,
    /// Chance in `0..=1` that a bullet crits
    pub crit_chance: f32,
    pub crit_multiplier: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CharacterClass {
    #[default]
    Warrior,
    Archer,
    Wizard,
    Laser,
    Electric,
    Bomber,
    Healer,
}

impl CharacterClass {
    pub const ALL: [CharacterClass; 7] = [
        CharacterClass::Warrior,
        CharacterClass::Archer,
        CharacterClass::Wizard,
        CharacterClass::Laser,
        CharacterClass::Electric,
        CharacterClass::Bomber,
        CharacterClass::Healer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CharacterClass::Warrior => "Warrior",
            CharacterClass::Archer => "Archer",
            CharacterClass::Wizard => "Wizard",
            CharacterClass::Laser => "Laser",
            CharacterClass::Electric => "Electric",
            CharacterClass::Bomber => "Bomber",
            CharacterClass::Healer => "Healer",
        }
    }

    pub fn stats(self) -> ClassStats {
        let (max_health, max_mana, speed_scale, defense, crit_chance, crit_multiplier) = match self
        {
            CharacterClass::Warrior => (150, 100, 1.0, 30, 0.05, 1.5),
            CharacterClass::Archer => (90, 100, 1.2, 8, 0.15, 2.0),
            CharacterClass::Wizard => (70, 200, 0.9, 5, 0.01, 1.5),
            CharacterClass::Laser => (80, 250, 0.8, 6, 0.01, 1.5),
            CharacterClass::Electric => (85, 180, 1.0, 7, 0.05, 1.5),
            CharacterClass::Bomber => (110, 100, 1.1, 12, 0.05, 1.5),
            CharacterClass::Healer => (100, 200, 1.0, 10, 0.01, 1.5),
        };
        ClassStats {
            max_health,
            max_mana,
            speed_scale,
            defense,
            crit_chance,
            crit_multiplier,
        }
    }

    /// Skill on the skill button. Fighters burst, casters reposition.
    pub fn skill(self) -> SkillKind {
        match self {
            CharacterClass::Warrior | CharacterClass::Archer | CharacterClass::Bomber => {
                SkillKind::RapidFire
            }
            CharacterClass::Wizard
            | CharacterClass::Laser
            | CharacterClass::Electric
            | CharacterClass::Healer => SkillKind::EvasionShot,
        }
    }
}
