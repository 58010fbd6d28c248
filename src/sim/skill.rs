//! Mana-gated character skills
//!
//! A skill is ready when its cooldown has run out and the character has the
//! mana for it. Activation spends the mana and restarts the cooldown; what
//! the skill then does is up to [`GameState::use_skill`](super::state::GameState::use_skill).

use serde::{Deserialize, Serialize};

use super::timer::{Timer, TimerFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    /// Faster, weaker volleys for a few seconds
    RapidFire,
    /// Hop away from the facing direction and fire one heavy, fast bolt
    EvasionShot,
}

impl SkillKind {
    pub fn name(self) -> &'static str {
        match self {
            SkillKind::RapidFire => "Rapid Fire",
            SkillKind::EvasionShot => "Evasion Shot",
        }
    }

    pub fn mana_cost(self) -> i32 {
        match self {
            SkillKind::RapidFire => 30,
            SkillKind::EvasionShot => 25,
        }
    }

    pub fn cooldown_ms(self) -> u64 {
        match self {
            SkillKind::RapidFire => 12_000,
            SkillKind::EvasionShot => 10_000,
        }
    }
}

/// Rapid fire buff length (seconds)
pub const RAPID_FIRE_SECS: f32 = 5.0;
/// Rapid fire multiplies the fire rate by this
pub const RAPID_FIRE_RATE: f32 = 1.5;
/// ...and scales bullet damage by this (never below 1)
pub const RAPID_FIRE_DAMAGE: f32 = 0.8;
pub const EVASION_JUMP: f32 = 150.0;
pub const EVASION_DAMAGE: f32 = 1.5;
pub const EVASION_SPEED: f32 = 2.0;

/// Scale a damage value, keeping at least 1
pub fn scale_damage(damage: i32, factor: f32) -> i32 {
    ((damage as f32 * factor) as i32).max(1)
}

/// A character's skill slot
#[derive(Debug, Clone)]
pub struct Skill {
    pub kind: SkillKind,
    cooldown: Timer,
}

impl Skill {
    pub fn new(kind: SkillKind, timers: &TimerFactory) -> Self {
        Self {
            kind,
            cooldown: timers.fixed(kind.cooldown_ms()),
        }
    }

    pub fn ready(&self, mana: i32) -> bool {
        self.cooldown.check_finished() && mana >= self.kind.mana_cost()
    }

    /// Spend `mana` and restart the cooldown. False (nothing spent) when the
    /// skill is not ready.
    pub fn activate(&mut self, mana: &mut i32) -> bool {
        if !self.ready(*mana) {
            return false;
        }
        *mana -= self.kind.mana_cost();
        self.cooldown.reset();
        true
    }

    pub fn remaining_ms(&self) -> u64 {
        self.cooldown.remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::timer::Clock;

    #[test]
    fn test_mana_and_cooldown_gate() {
        let timers = TimerFactory::new(Clock::manual(), 1);
        let mut skill = Skill::new(SkillKind::RapidFire, &timers);

        let mut mana = 29;
        assert!(!skill.activate(&mut mana));
        assert_eq!(mana, 29);

        mana = 100;
        assert!(skill.activate(&mut mana));
        assert_eq!(mana, 70);
        assert!(!skill.activate(&mut mana));
        assert_eq!(mana, 70);
        assert_eq!(skill.remaining_ms(), 12_000);

        timers.clock().advance(12_000);
        assert!(skill.activate(&mut mana));
        assert_eq!(mana, 40);
    }

    #[test]
    fn test_scale_damage_floor() {
        assert_eq!(scale_damage(1, RAPID_FIRE_DAMAGE), 1);
        assert_eq!(scale_damage(10, RAPID_FIRE_DAMAGE), 8);
        assert_eq!(scale_damage(10, EVASION_DAMAGE), 15);
        assert_eq!(scale_damage(i32::MAX, 2.0), i32::MAX);
    }
}
