//! Spawning and drop collaborators
//!
//! The simulation only consumes what these produce. Hosts can swap in their
//! own formation scripts or loot tables through the [`Spawner`] and
//! [`DropSource`] traits.

use std::rc::Rc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::ai::spawn_band_point;
use super::entities::{Destructible, EnemyKind};
use super::items::{DropTier, ItemDb, ItemDef};
use super::state::GameState;
use super::timer::Timer;

/// Supplies enemies and wave timing
pub trait Spawner {
    /// Called once per playing tick, before enemies move
    fn update(&mut self, state: &mut GameState);
}

/// Decides what (if anything) a destroyed enemy drops
pub trait DropSource {
    fn roll(&mut self, at: Vec2) -> Option<Rc<ItemDef>>;
}

/// Never drops anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDrops;

impl DropSource for NoDrops {
    fn roll(&mut self, _at: Vec2) -> Option<Rc<ItemDef>> {
        None
    }
}

/// Never spawns anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpawns;

impl Spawner for NoSpawns {
    fn update(&mut self, _state: &mut GameState) {}
}

/// Rolls a drop chance, then a tier by weight, then an item in that tier
#[derive(Debug, Clone)]
pub struct TieredDrops {
    db: ItemDb,
    chance: f32,
    rng: Pcg32,
}

impl TieredDrops {
    pub fn new(db: ItemDb, chance: f32, seed: u64) -> Self {
        Self {
            db,
            chance: chance.clamp(0.0, 1.0),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn pick_tier(&mut self) -> Option<DropTier> {
        let stocked: Vec<DropTier> = DropTier::ALL
            .into_iter()
            .filter(|tier| self.db.by_tier(*tier).next().is_some())
            .collect();
        let total: u32 = stocked.iter().map(|t| t.weight()).sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.rng.random_range(0..total);
        for tier in stocked {
            if roll < tier.weight() {
                return Some(tier);
            }
            roll -= tier.weight();
        }
        None
    }
}

impl DropSource for TieredDrops {
    fn roll(&mut self, _at: Vec2) -> Option<Rc<ItemDef>> {
        if self.rng.random::<f32>() >= self.chance {
            return None;
        }
        let tier = self.pick_tier()?;
        let count = self.db.by_tier(tier).count();
        let index = self.rng.random_range(0..count);
        self.db.by_tier(tier).nth(index).cloned()
    }
}

/// Default wave timing: jittered enemy spawns in the upper band and an
/// occasional bonus ship. Formation spawns stop on boss levels and once the
/// level's kill target is covered.
#[derive(Debug, Clone)]
pub struct WaveSpawner {
    spawn_timer: Timer,
    bonus_timer: Timer,
    rng: Pcg32,
}

impl WaveSpawner {
    pub fn new(state: &mut GameState) -> Self {
        let tuning = &state.tuning;
        let (interval, jitter) = (tuning.spawn_interval_ms, tuning.spawn_jitter_ms);
        let (bonus, bonus_jitter) = (tuning.bonus_interval_ms, tuning.bonus_jitter_ms);

        let mut spawn_timer = state.timers.jittered(interval, jitter);
        let mut bonus_timer = state.timers.jittered(bonus, bonus_jitter);
        spawn_timer.reset();
        bonus_timer.reset();
        Self {
            spawn_timer,
            bonus_timer,
            rng: Pcg32::seed_from_u64(state.seed ^ 0x5eed_5eed),
        }
    }

    /// Later levels lean toward tougher kinds
    fn pick_kind(&mut self, level: u32) -> EnemyKind {
        let roll = self.rng.random_range(0..100u32);
        let sniper_cut = (5 + level * 3).min(30);
        let gunner_cut = sniper_cut + (25 + level * 2).min(40);
        if roll < sniper_cut {
            EnemyKind::Sniper
        } else if roll < gunner_cut {
            EnemyKind::Gunner
        } else {
            EnemyKind::Brawler
        }
    }
}

impl Spawner for WaveSpawner {
    fn update(&mut self, state: &mut GameState) {
        if state.enemies_frozen() {
            return;
        }

        if state.bonus.is_none() && self.bonus_timer.check_finished() {
            self.bonus_timer.reset();
            let from_left = self.rng.random::<bool>();
            state.spawn_bonus(from_left);
            log::debug!("Bonus ship entering from the {}", if from_left { "left" } else { "right" });
        }

        if state.is_boss_level() || !self.spawn_timer.check_finished() {
            return;
        }
        self.spawn_timer.reset();

        let alive = state.enemies.iter().filter(|e| e.is_alive()).count();
        let outstanding = state.run.level_kills as usize + alive;
        if alive >= state.tuning.max_enemies || outstanding >= state.kill_target() as usize {
            return;
        }

        let kind = self.pick_kind(state.run.level);
        let pos = spawn_band_point(self.rng.random(), self.rng.random());
        let id = state.spawn_enemy(kind, pos);
        log::trace!("Spawned {kind:?} #{id} at {pos}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::items::ItemKind;
    use crate::sim::timer::Clock;
    use crate::tuning::Tuning;

    #[test]
    fn test_no_drops_when_chance_zero() {
        let mut drops = TieredDrops::new(ItemDb::builtin(), 0.0, 1);
        assert!((0..100).all(|_| drops.roll(Vec2::ZERO).is_none()));
    }

    #[test]
    fn test_always_drops_when_chance_one() {
        let mut drops = TieredDrops::new(ItemDb::builtin(), 1.0, 1);
        assert!((0..100).all(|_| drops.roll(Vec2::ZERO).is_some()));
    }

    #[test]
    fn test_drops_are_seeded() {
        let mut a = TieredDrops::new(ItemDb::builtin(), 0.5, 77);
        let mut b = TieredDrops::new(ItemDb::builtin(), 0.5, 77);
        for _ in 0..50 {
            let x = a.roll(Vec2::ZERO).map(|d| d.id.clone());
            let y = b.roll(Vec2::ZERO).map(|d| d.id.clone());
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_single_tier_catalogue() {
        let coin = ItemDef {
            id: "coin".to_string(),
            kind: ItemKind::Coin,
            tier: DropTier::Rare,
            ..ItemDef::default()
        };
        let mut drops = TieredDrops::new(ItemDb::from_defs([coin]), 1.0, 3);
        assert_eq!(drops.roll(Vec2::ZERO).unwrap().id, "coin");
        let mut empty = TieredDrops::new(ItemDb::default(), 1.0, 3);
        assert!(empty.roll(Vec2::ZERO).is_none());
    }

    #[test]
    fn test_wave_spawner_respects_interval() {
        let tuning = Tuning {
            spawn_interval_ms: 1000,
            spawn_jitter_ms: 0,
            bonus_interval_ms: 60_000,
            bonus_jitter_ms: 0,
            ..Tuning::default()
        };
        let mut state = GameState::new(8, tuning, Clock::manual());
        let mut spawner = WaveSpawner::new(&mut state);

        spawner.update(&mut state);
        assert!(state.enemies.is_empty());

        state.clock().advance(1000);
        spawner.update(&mut state);
        assert_eq!(state.enemies.len(), 1);

        spawner.update(&mut state);
        assert_eq!(state.enemies.len(), 1);
        assert!(state.bonus.is_none());
    }

    #[test]
    fn test_wave_spawner_pauses_while_frozen() {
        let tuning = Tuning {
            spawn_interval_ms: 100,
            spawn_jitter_ms: 0,
            ..Tuning::default()
        };
        let mut state = GameState::new(8, tuning, Clock::manual());
        let mut spawner = WaveSpawner::new(&mut state);
        state.apply_global_freeze(5000);
        state.clock().advance(1000);
        spawner.update(&mut state);
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_wave_spawner_caps_at_kill_target() {
        let tuning = Tuning {
            spawn_interval_ms: 10,
            spawn_jitter_ms: 0,
            max_enemies: 100,
            ..Tuning::default()
        };
        let mut state = GameState::new(8, tuning, Clock::manual());
        let mut spawner = WaveSpawner::new(&mut state);
        for _ in 0..100 {
            state.clock().advance(10);
            spawner.update(&mut state);
        }
        assert_eq!(state.enemies.len(), state.kill_target() as usize);
    }
}
