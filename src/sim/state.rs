//! Game state and core simulation types
//!
//! Owns every pool, ledger and entity for one run. The host drives it with
//! [`tick`](super::tick::tick) and reads it back for rendering.

use std::collections::BTreeSet;
use std::rc::Rc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::{EffectKind, EffectLedger};
use super::entities::{
    BonusEnemy, Boss, Character, Destructible, Enemy, EnemyKind, ItemDrop, Pet,
};
use super::inventory::{ActiveItem, Inventory, SlotAfterUse};
use super::item_effect;
use super::items::ItemDef;
use super::player::{PerPlayer, PlayerId};
use super::pool::Pool;
use super::projectile::{Owner, Projectile, ProjectilePool, ProjectileSpec};
use super::run::{RunState, RunSummary};
use super::skill::{self, Skill, SkillKind, scale_damage};
use super::timer::{Clock, Timer, TimerFactory};
use crate::audio::SoundCue;
use crate::clamp_to_arena;
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Level target met; waiting for the host to call `advance_level`
    LevelCleared,
    /// Team out of lives
    GameOver,
}

/// How a level ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelOutcome {
    Cleared,
    Failed,
}

/// One-shot run achievements
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Achievement {
    /// First enemy destroyed
    FirstBlood,
    /// Level cleared without losing a life
    Survivor,
    /// Final level cleared
    Clear,
    /// Level cleared with at least 80% accuracy
    Sharpshooter,
    /// 50 bullets fired
    FiftyBullets,
    /// 3000 points in one run
    Score3000,
}

impl Achievement {
    pub fn name(&self) -> &'static str {
        match self {
            Achievement::FirstBlood => "First Blood",
            Achievement::Survivor => "Survivor",
            Achievement::Clear => "Clear",
            Achievement::Sharpshooter => "Sharpshooter",
            Achievement::FiftyBullets => "50 Bullets",
            Achievement::Score3000 => "Get 3000 Score",
        }
    }
}

/// Game events for audio/VFX/achievement collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(SoundCue),
    Unlock(Achievement),
    /// Lost a life
    PlayerHit { player: PlayerId },
    /// Hit but still flying, with `health` left
    PlayerDamaged { player: PlayerId, health: i32 },
    SkillUsed { player: PlayerId, skill: SkillKind },
    ShieldBlocked { player: PlayerId },
    EnemyDestroyed { by: PlayerId, points: u64, pos: Vec2 },
    ItemCollected { player: PlayerId, item: String },
    ItemUsed { player: PlayerId, item: String },
    LevelEnded(LevelOutcome),
}

/// Complete simulation state for one run
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub phase: GamePhase,
    pub run: RunState,
    /// Characters taking part in the run, in player order
    pub characters: Vec<Character>,
    pub effects: PerPlayer<EffectLedger>,
    pub inventories: PerPlayer<Inventory>,
    /// Formation enemies in spawn order
    pub enemies: Vec<Enemy>,
    pub bonus: Option<BonusEnemy>,
    pub boss: Option<Boss>,
    pub pets: Vec<Pet>,
    /// In-flight projectiles
    pub projectiles: Vec<Projectile>,
    pub items: Vec<ItemDrop>,
    pub projectile_pool: ProjectilePool,
    item_pool: Pool<ItemDrop>,
    pub timers: TimerFactory,
    /// Critical hit rolls
    rng: Pcg32,
    freeze: Option<Timer>,
    /// Events since the last drain
    pub events: Vec<GameEvent>,
    pub achievements: BTreeSet<Achievement>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a run with the given seed, tuning and clock
    pub fn new(seed: u64, tuning: Tuning, clock: Clock) -> Self {
        let timers = TimerFactory::new(clock, seed);
        let run = RunState::new(tuning.mode, tuning.lives_per_player, tuning.starting_coins);

        let characters = PlayerId::ALL
            .into_iter()
            .filter(|p| run.is_playing(*p))
            .map(|p| {
                let class = tuning.classes[p];
                let skill = Skill::new(class.skill(), &timers);
                Character::new(p, tuning.player_speed, timers.fixed(tuning.fire_cooldown_ms))
                    .with_class(class, skill)
            })
            .collect();

        let mut state = Self {
            seed,
            phase: GamePhase::Playing,
            run,
            characters,
            effects: PerPlayer::from_fn(|_| EffectLedger::new(timers.clone())),
            inventories: PerPlayer::from_fn(|_| Inventory::new(timers.clone())),
            enemies: Vec::new(),
            bonus: None,
            boss: None,
            pets: Vec::new(),
            projectiles: Vec::new(),
            items: Vec::new(),
            projectile_pool: ProjectilePool::new(),
            item_pool: Pool::new(),
            timers,
            rng: Pcg32::seed_from_u64(seed ^ 0xc217_c217),
            freeze: None,
            events: Vec::new(),
            achievements: BTreeSet::new(),
            time_ticks: 0,
            next_id: 1,
            tuning,
        };
        if state.is_boss_level() {
            state.spawn_boss();
        }
        log::info!(
            "Run started: seed {}, {:?}, {} lives",
            seed,
            state.run.mode,
            state.run.lives_remaining()
        );
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn clock(&self) -> &Clock {
        self.timers.clock()
    }

    // === Entities ===

    pub fn character(&self, player: PlayerId) -> Option<&Character> {
        self.characters.iter().find(|c| c.player == player)
    }

    pub fn character_mut(&mut self, player: PlayerId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.player == player)
    }

    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        let attack_timer = self.timers.fixed(kind.ai().attack_cooldown_ms);
        self.enemies.push(Enemy::new(id, kind, pos, attack_timer));
        id
    }

    pub fn spawn_bonus(&mut self, from_left: bool) {
        if self.bonus.is_none() {
            self.bonus = Some(BonusEnemy::new(from_left));
        }
    }

    pub fn spawn_boss(&mut self) {
        let spread = self.timers.fixed(self.tuning.boss_spread_ms);
        let missile = self.timers.fixed(self.tuning.boss_missile_ms);
        self.boss = Some(Boss::new(self.tuning.boss_health, spread, missile));
        log::info!("Boss spawned on level {}", self.run.level);
    }

    pub fn spawn_pet(&mut self, owner: PlayerId, lifetime_ms: u64) -> bool {
        let lifetime = self.timers.started(lifetime_ms);
        let Some(character) = self.character(owner).filter(|c| c.is_alive()) else {
            return false;
        };
        let pet = Pet::new(character, lifetime);
        self.pets.retain(|p| p.owner != owner);
        self.pets.push(pet);
        true
    }

    /// Put an item drop in play, reusing a pooled one when possible
    pub fn spawn_item_drop(&mut self, def: Rc<ItemDef>, pos: Vec2) {
        let id = self.next_entity_id();
        let fall_speed = self.tuning.item_fall_speed;
        let size = Vec2::splat(ITEM_SIZE);
        let mut item = self.item_pool.take_or_else(|| ItemDrop {
            id,
            def: Rc::clone(&def),
            pos,
            size,
            fall_speed,
        });
        item.id = id;
        item.def = def;
        item.pos = pos;
        item.size = size;
        item.fall_speed = fall_speed;
        self.items.push(item);
    }

    /// Return collected or fallen items to their pool
    pub fn reclaim_items(&mut self, pred: impl FnMut(&ItemDrop) -> bool) -> usize {
        self.item_pool.reclaim_where(&mut self.items, pred)
    }

    pub fn living_enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().filter(|e| e.is_alive())
    }

    /// Ensure entity lists are sorted for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.characters.sort_by_key(|c| c.player);
        self.enemies.sort_by_key(|e| e.id);
        self.items.sort_by_key(|i| i.id);
    }

    // === Global enemy modifiers ===

    pub fn apply_global_freeze(&mut self, ms: u64) {
        match &mut self.freeze {
            Some(timer) if timer.is_running() => timer.add_time(ms),
            _ => self.freeze = Some(self.timers.started(ms)),
        }
        log::info!("Enemies frozen for {ms}ms");
    }

    pub fn enemies_frozen(&self) -> bool {
        self.freeze.as_ref().is_some_and(Timer::is_running)
    }

    /// `(100 - strongest slow) / 100` over both players, 1.0 with no slow
    pub fn enemy_speed_multiplier(&self) -> f32 {
        let strongest = self
            .effects
            .values()
            .filter_map(|ledger| ledger.effect_value(EffectKind::TimeSlow))
            .max();
        match strongest {
            Some(slow) => ((100 - slow.clamp(0, 100)) as f32 / 100.0).max(0.0),
            None => 1.0,
        }
    }

    // === Effects ===

    pub fn add_effect(
        &mut self,
        player: PlayerId,
        kind: EffectKind,
        magnitude: Option<i32>,
        duration_secs: f32,
    ) {
        self.effects[player].add_effect(kind, magnitude, duration_secs);
    }

    pub fn has_effect(&self, player: PlayerId, kind: EffectKind) -> bool {
        self.effects[player].has_effect(kind)
    }

    pub fn effect_value(&self, player: PlayerId, kind: EffectKind) -> Option<i32> {
        self.effects[player].effect_value(kind)
    }

    /// Expire finished effects, item cooldowns and the global freeze
    pub fn update_effects(&mut self) {
        for (player, ledger) in self.effects.iter_mut() {
            for kind in ledger.update_effects() {
                log::debug!("Player {} {:?} expired", player.number(), kind);
            }
        }
        for (_, inventory) in self.inventories.iter_mut() {
            inventory.update_cooldowns();
        }
        if self.freeze.as_ref().is_some_and(Timer::check_finished) {
            self.freeze = None;
        }
    }

    pub fn clear_effects(&mut self, player: PlayerId) {
        self.effects[player].clear_effects();
    }

    pub fn clear_all_effects(&mut self) {
        for (_, ledger) in self.effects.iter_mut() {
            ledger.clear_effects();
        }
        self.freeze = None;
    }

    // === Items ===

    pub fn assign_active_item(&mut self, player: PlayerId, def: Rc<ItemDef>) {
        self.inventories[player].assign(def);
    }

    /// Definition of the item in `player`'s active slot
    pub fn active_item(&self, player: PlayerId) -> Option<Rc<ItemDef>> {
        self.inventories[player].active_def()
    }

    pub fn active_item_state(&self, player: PlayerId) -> Option<&ActiveItem> {
        self.inventories[player].active()
    }

    pub fn add_passive_item(&mut self, player: PlayerId, def: Rc<ItemDef>) {
        self.inventories[player].add_passive(def);
    }

    pub fn passive_items(&self, player: PlayerId) -> &[Rc<ItemDef>] {
        self.inventories[player].passives()
    }

    /// Trigger the active item. False if the slot is empty, cooling down or
    /// the item's effect could not be applied.
    pub fn use_active_item(&mut self, player: PlayerId) -> bool {
        let Some(def) = self.inventories[player].ready() else {
            return false;
        };
        if !item_effect::apply(self, player, &def) {
            return false;
        }
        if let Some(after) = self.inventories[player].consume_charge() {
            if after == SlotAfterUse::Emptied {
                log::info!("Player {} used the last charge of {}", player.number(), def.id);
            }
        }
        self.emit(GameEvent::Sound(SoundCue::ItemUse));
        self.emit(GameEvent::ItemUsed {
            player,
            item: def.id.clone(),
        });
        true
    }

    // === Skills ===

    /// Trigger `player`'s class skill. False if the character is down, the
    /// skill is cooling down or mana is short.
    pub fn use_skill(&mut self, player: PlayerId) -> bool {
        let Some(character) = self
            .characters
            .iter_mut()
            .find(|c| c.player == player && c.is_alive())
        else {
            return false;
        };
        let Some(skill) = character.skill.as_mut() else {
            return false;
        };
        if !skill.activate(&mut character.mana) {
            return false;
        }
        let kind = skill.kind;
        log::info!(
            "Player {} used {} ({} mana left)",
            player.number(),
            kind.name(),
            character.mana
        );

        match kind {
            SkillKind::RapidFire => {
                self.add_effect(player, EffectKind::RapidFire, None, skill::RAPID_FIRE_SECS);
            }
            SkillKind::EvasionShot => self.evasion_shot(player),
        }
        self.emit(GameEvent::SkillUsed { player, skill: kind });
        self.emit(GameEvent::Sound(SoundCue::Skill));
        true
    }

    /// Hop away from the facing direction and loose one heavy bolt
    fn evasion_shot(&mut self, player: PlayerId) {
        let Some(character) = self.character_mut(player) else {
            return;
        };
        let hop = -character.facing * skill::EVASION_JUMP;
        character.pos = clamp_to_arena(character.pos + hop, character.size);
        let muzzle = character.muzzle();

        let bolt = self.projectile_pool.acquire(ProjectileSpec {
            pos: muzzle,
            size: Vec2::new(BULLET_WIDTH * 2.0, BULLET_HEIGHT * 2.0),
            vel: Vec2::NEG_Y * self.tuning.bullet_speed * skill::EVASION_SPEED,
            owner: Owner::Player(player),
            damage: scale_damage(self.tuning.bullet_damage, skill::EVASION_DAMAGE),
        });
        self.projectiles.push(bolt);
    }

    /// Damage of `player`'s next volley: rapid fire weakens it, a crit
    /// (rolled once per volley) strengthens it
    pub fn volley_damage(&mut self, player: PlayerId) -> i32 {
        let mut damage = self.tuning.bullet_damage;
        if self.has_effect(player, EffectKind::RapidFire) {
            damage = scale_damage(damage, skill::RAPID_FIRE_DAMAGE);
        }
        if let Some(stats) = self.character(player).map(|c| c.stats) {
            if self.rng.random::<f32>() < stats.crit_chance {
                damage = scale_damage(damage, stats.crit_multiplier);
                log::trace!("Player {} crit for {damage}", player.number());
            }
        }
        damage
    }

    /// Fire rate multiplier from active buffs
    pub fn fire_rate(&self, player: PlayerId) -> f32 {
        if self.has_effect(player, EffectKind::RapidFire) {
            skill::RAPID_FIRE_RATE
        } else {
            1.0
        }
    }

    /// Buy an item into the active slot
    pub fn buy_item(&mut self, player: PlayerId, def: Rc<ItemDef>) -> bool {
        if !self.run.spend_coins(def.cost) {
            return false;
        }
        self.assign_active_item(player, def);
        true
    }

    // === Scoring ===

    /// Credit score to `player`, applying their score boost
    pub fn add_score(&mut self, player: PlayerId, points: u64) -> u64 {
        let boost = self.effect_value(player, EffectKind::ScoreBoost);
        let gained = self.run.add_score(player, points, boost);
        if self.run.total_score() >= 3000 {
            self.unlock(Achievement::Score3000);
        }
        gained
    }

    // === Events ===

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Fire an achievement once per run
    pub fn unlock(&mut self, achievement: Achievement) {
        if self.achievements.insert(achievement) {
            log::info!("Achievement unlocked: {}", achievement.name());
            self.emit(GameEvent::Unlock(achievement));
            self.emit(GameEvent::Sound(SoundCue::Achievement));
        }
    }

    // === Level flow ===

    pub fn is_boss_level(&self) -> bool {
        self.tuning.is_boss_level(self.run.level)
    }

    pub fn kill_target(&self) -> u32 {
        self.tuning.kill_target(self.run.level)
    }

    /// End-of-level predicates. `None` while the level is still on.
    pub fn level_outcome(&self) -> Option<LevelOutcome> {
        if !self.run.team_alive() {
            return Some(LevelOutcome::Failed);
        }

        let cleared = if self.is_boss_level() {
            self.boss.as_ref().is_none_or(|b| !b.is_alive())
        } else {
            self.run.level_kills >= self.kill_target()
        };
        cleared.then_some(LevelOutcome::Cleared)
    }

    /// Level-clear achievements, run once when a level is cleared
    pub fn check_clear_achievements(&mut self) {
        if !self.run.took_damage {
            self.unlock(Achievement::Survivor);
        }
        let shots = self.run.bullets_shot();
        let kills = self.run.ships_destroyed();
        if shots > 0 && kills as f32 / shots as f32 >= 0.8 {
            self.unlock(Achievement::Sharpshooter);
        }
        if self.run.level >= self.tuning.final_level {
            self.unlock(Achievement::Clear);
        }
    }

    /// Start the next level: clear the field, reset effects and characters
    pub fn advance_level(&mut self) {
        self.run.next_level();
        let in_flight = std::mem::take(&mut self.projectiles);
        self.projectile_pool.release_all(in_flight);
        self.reclaim_items(|_| true);
        self.enemies.clear();
        self.bonus = None;
        self.boss = None;
        self.pets.clear();
        self.clear_all_effects();

        let run = &self.run;
        for character in &mut self.characters {
            if run.lives_for(character.player) > 0 {
                character.respawn_now();
            }
        }
        if self.is_boss_level() {
            self.spawn_boss();
        }
        self.phase = GamePhase::Playing;
        log::info!("Level {} started (target {} kills)", self.run.level, self.kill_target());
    }

    /// Close the run and hand totals to persistence
    pub fn finish_run(&mut self) -> RunSummary {
        self.run.finish()
    }
}
