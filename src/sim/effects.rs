//! Per-player buff/debuff ledger
//!
//! One slot per [`EffectKind`]. Re-applying an active effect extends its
//! timer and replaces its magnitude; effects never stack.

use serde::{Deserialize, Serialize};

use super::timer::{Timer, TimerFactory};
use crate::secs_to_ms;

/// Timed effects a player can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    TripleShot,
    /// Magnitude multiplies score gains
    ScoreBoost,
    /// Magnitude is a percentage bonus to bullet speed
    BulletSpeedUp,
    /// Magnitude is a percentage bonus to movement speed
    MoveSpeedUp,
    /// Magnitude is subtracted from enemy health on hit
    EnemyHpDown,
    /// Magnitude is the percentage enemies are slowed by
    TimeSlow,
    /// Magnitude is the dash distance multiplier
    Dash,
    Shield,
    PetSupport,
    /// Skill buff: faster, weaker volleys
    RapidFire,
}

impl EffectKind {
    pub const COUNT: usize = 10;

    pub const ALL: [EffectKind; Self::COUNT] = [
        EffectKind::TripleShot,
        EffectKind::ScoreBoost,
        EffectKind::BulletSpeedUp,
        EffectKind::MoveSpeedUp,
        EffectKind::EnemyHpDown,
        EffectKind::TimeSlow,
        EffectKind::Dash,
        EffectKind::Shield,
        EffectKind::PetSupport,
        EffectKind::RapidFire,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Default)]
struct EffectSlot {
    active: bool,
    magnitude: Option<i32>,
    timer: Option<Timer>,
}

impl EffectSlot {
    fn is_live(&self) -> bool {
        self.active && self.timer.as_ref().is_some_and(|t| !t.check_finished())
    }

    fn clear(&mut self) {
        self.active = false;
        self.magnitude = None;
        self.timer = None;
    }
}

/// Timed effects held by one player
#[derive(Debug, Clone)]
pub struct EffectLedger {
    slots: [EffectSlot; EffectKind::COUNT],
    timers: TimerFactory,
}

impl EffectLedger {
    pub fn new(timers: TimerFactory) -> Self {
        Self {
            slots: std::array::from_fn(|_| EffectSlot::default()),
            timers,
        }
    }

    /// Start an effect, or extend an active one by `duration_secs` and
    /// replace its magnitude. A slot stays active until `update_effects`
    /// sweeps it, so a timed-out slot is still extended until then.
    pub fn add_effect(&mut self, kind: EffectKind, magnitude: Option<i32>, duration_secs: f32) {
        let ms = secs_to_ms(duration_secs);
        let slot = &mut self.slots[kind.index()];

        if slot.active {
            if let Some(timer) = slot.timer.as_mut() {
                timer.add_time(ms);
            }
            slot.magnitude = magnitude;
            log::debug!("{kind:?} extended by {ms}ms, magnitude {magnitude:?}");
            return;
        }

        slot.timer = Some(self.timers.started(ms));
        slot.active = true;
        slot.magnitude = magnitude;
        log::debug!("{kind:?} started for {ms}ms, magnitude {magnitude:?}");
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.slots[kind.index()].is_live()
    }

    /// Current magnitude, `None` if inactive or already timed out
    pub fn effect_value(&self, kind: EffectKind) -> Option<i32> {
        let slot = &self.slots[kind.index()];
        if slot.is_live() { slot.magnitude } else { None }
    }

    /// Milliseconds left on an effect
    pub fn remaining_ms(&self, kind: EffectKind) -> u64 {
        let slot = &self.slots[kind.index()];
        match (&slot.timer, slot.active) {
            (Some(timer), true) => timer.remaining(),
            _ => 0,
        }
    }

    /// Deactivate every effect whose timer has finished. Returns the kinds
    /// that expired this call.
    pub fn update_effects(&mut self) -> Vec<EffectKind> {
        let mut expired = Vec::new();
        for kind in EffectKind::ALL {
            let slot = &mut self.slots[kind.index()];
            if slot.active && !slot.is_live() {
                slot.clear();
                expired.push(kind);
            }
        }
        expired
    }

    pub fn clear_effects(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }

    /// Kinds currently in effect, in declaration order
    pub fn active_kinds(&self) -> impl Iterator<Item = EffectKind> + '_ {
        EffectKind::ALL
            .into_iter()
            .filter(|kind| self.has_effect(*kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::timer::Clock;

    fn ledger() -> (EffectLedger, Clock) {
        let clock = Clock::manual();
        (EffectLedger::new(TimerFactory::new(clock.clone(), 3)), clock)
    }

    #[test]
    fn test_add_and_query() {
        let (mut effects, _clock) = ledger();
        assert!(!effects.has_effect(EffectKind::ScoreBoost));
        assert_eq!(effects.effect_value(EffectKind::ScoreBoost), None);

        effects.add_effect(EffectKind::ScoreBoost, Some(2), 5.0);
        assert!(effects.has_effect(EffectKind::ScoreBoost));
        assert_eq!(effects.effect_value(EffectKind::ScoreBoost), Some(2));
        assert!(!effects.has_effect(EffectKind::TimeSlow));
    }

    #[test]
    fn test_extend_not_stack() {
        let (mut effects, clock) = ledger();
        effects.add_effect(EffectKind::MoveSpeedUp, Some(20), 5.0);
        clock.advance(10);
        effects.add_effect(EffectKind::MoveSpeedUp, Some(50), 5.0);

        assert_eq!(effects.effect_value(EffectKind::MoveSpeedUp), Some(50));
        assert!(effects.remaining_ms(EffectKind::MoveSpeedUp) > 5000);
    }

    #[test]
    fn test_expiry_clears_magnitude() {
        let (mut effects, clock) = ledger();
        effects.add_effect(EffectKind::TimeSlow, Some(50), 1.0);
        clock.advance(1000);

        // Timed out but not yet swept
        assert!(!effects.has_effect(EffectKind::TimeSlow));
        assert_eq!(effects.effect_value(EffectKind::TimeSlow), None);

        let expired = effects.update_effects();
        assert_eq!(expired, vec![EffectKind::TimeSlow]);
        assert!(effects.update_effects().is_empty());
        assert_eq!(effects.remaining_ms(EffectKind::TimeSlow), 0);
    }

    #[test]
    fn test_reapply_before_sweep_extends() {
        let (mut effects, clock) = ledger();
        effects.add_effect(EffectKind::Shield, None, 1.0);
        clock.advance(1500);
        assert!(!effects.has_effect(EffectKind::Shield));

        // Still active until swept: extended from the original start
        effects.add_effect(EffectKind::Shield, None, 2.0);
        assert!(effects.has_effect(EffectKind::Shield));
        assert_eq!(effects.remaining_ms(EffectKind::Shield), 1500);
    }

    #[test]
    fn test_reapply_after_sweep_restarts() {
        let (mut effects, clock) = ledger();
        effects.add_effect(EffectKind::Shield, None, 1.0);
        clock.advance(1500);
        assert_eq!(effects.update_effects(), vec![EffectKind::Shield]);

        effects.add_effect(EffectKind::Shield, None, 2.0);
        assert!(effects.has_effect(EffectKind::Shield));
        assert_eq!(effects.remaining_ms(EffectKind::Shield), 2000);
    }

    #[test]
    fn test_clear_effects() {
        let (mut effects, _clock) = ledger();
        effects.add_effect(EffectKind::TripleShot, None, 10.0);
        effects.add_effect(EffectKind::Dash, Some(3), 10.0);
        assert_eq!(effects.active_kinds().count(), 2);

        effects.clear_effects();
        assert_eq!(effects.active_kinds().count(), 0);
        assert_eq!(effects.effect_value(EffectKind::Dash), None);
    }
}
