//! Characters, enemies and other things that occupy the arena

use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::class::{CharacterClass, ClassStats};
use super::collision::{Aabb, Hitbox};
use super::items::ItemDef;
use super::player::PlayerId;
use super::skill::Skill;
use super::timer::Timer;
use crate::clamp_to_arena;
use crate::consts::*;

/// Enemy life cycle as seen by the renderer
#[derive(Debug, Clone)]
pub enum Lifecycle {
    Alive,
    /// Destroyed; explosion plays until the timer finishes
    Exploding(Timer),
    /// Ready to be removed
    Gone,
}

impl Lifecycle {
    pub fn is_alive(&self) -> bool {
        matches!(self, Lifecycle::Alive)
    }

    pub fn is_exploding(&self) -> bool {
        matches!(self, Lifecycle::Exploding(_))
    }

    pub fn is_gone(&self) -> bool {
        matches!(self, Lifecycle::Gone)
    }

    /// Advance an explosion to `Gone` once it has played out
    pub fn update(&mut self) {
        if let Lifecycle::Exploding(timer) = self {
            if timer.check_finished() {
                *self = Lifecycle::Gone;
            }
        }
    }
}

/// Anything player projectiles can destroy
pub trait Destructible: Hitbox {
    fn is_alive(&self) -> bool;
    /// Apply damage; true if this hit destroyed it
    fn take_hit(&mut self, damage: i32, explosion: Timer) -> bool;
    /// Score and coins credited on destruction
    fn reward(&self) -> (u64, u32);
}

/// How an enemy attacks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackStyle {
    /// Short-lived hitbox in front of the enemy
    Melee,
    /// Aimed bullet; keeps `preferred_distance` from its target
    Ranged {
        bullet_speed: f32,
        preferred_distance: f32,
    },
}

/// Per-kind steering and attack parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiParams {
    /// Pixels per second
    pub move_speed: f32,
    pub separation_radius: f32,
    pub separation_force: f32,
    pub attack_range: f32,
    pub attack_damage: i32,
    pub attack_cooldown_ms: u64,
    pub style: AttackStyle,
}

/// Formation enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Closes in and swings
    Brawler,
    /// Hovers at mid range and shoots
    Gunner,
    /// Hangs back and fires slow aimed shots
    Sniper,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Brawler, EnemyKind::Gunner, EnemyKind::Sniper];

    pub fn health(self) -> i32 {
        match self {
            EnemyKind::Brawler => 2,
            EnemyKind::Gunner | EnemyKind::Sniper => 1,
        }
    }

    pub fn points(self) -> u64 {
        match self {
            EnemyKind::Brawler => 10,
            EnemyKind::Gunner => 20,
            EnemyKind::Sniper => 30,
        }
    }

    pub fn coins(self) -> u32 {
        match self {
            EnemyKind::Brawler => 2,
            EnemyKind::Gunner => 3,
            EnemyKind::Sniper => 5,
        }
    }

    pub fn ai(self) -> AiParams {
        match self {
            EnemyKind::Brawler => AiParams {
                move_speed: 90.0,
                separation_radius: 60.0,
                separation_force: 0.5,
                attack_range: 80.0,
                attack_damage: 10,
                attack_cooldown_ms: 1500,
                style: AttackStyle::Melee,
            },
            EnemyKind::Gunner => AiParams {
                move_speed: 60.0,
                separation_radius: 30.0,
                separation_force: 0.5,
                attack_range: 500.0,
                attack_damage: 15,
                attack_cooldown_ms: 2000,
                style: AttackStyle::Ranged {
                    bullet_speed: 240.0,
                    preferred_distance: 200.0,
                },
            },
            EnemyKind::Sniper => AiParams {
                move_speed: 45.0,
                separation_radius: 40.0,
                separation_force: 0.4,
                attack_range: 640.0,
                attack_damage: 20,
                attack_cooldown_ms: 2600,
                style: AttackStyle::Ranged {
                    bullet_speed: 300.0,
                    preferred_distance: 300.0,
                },
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub size: Vec2,
    pub health: i32,
    pub points: u64,
    pub coins: u32,
    pub ai: AiParams,
    pub lifecycle: Lifecycle,
    pub attack_timer: Timer,
    pub facing_right: bool,
}

impl Enemy {
    /// `attack_timer` should be an unstarted timer of the kind's cooldown
    pub fn new(id: u32, kind: EnemyKind, pos: Vec2, attack_timer: Timer) -> Self {
        Self {
            id,
            kind,
            pos,
            size: Vec2::splat(ENEMY_SIZE),
            health: kind.health(),
            points: kind.points(),
            coins: kind.coins(),
            ai: kind.ai(),
            lifecycle: Lifecycle::Alive,
            attack_timer,
            facing_right: true,
        }
    }
}

impl Hitbox for Enemy {
    fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

impl Destructible for Enemy {
    fn is_alive(&self) -> bool {
        self.lifecycle.is_alive()
    }

    fn take_hit(&mut self, damage: i32, explosion: Timer) -> bool {
        self.health = self.health.saturating_sub(damage);
        if self.health <= 0 {
            self.lifecycle = Lifecycle::Exploding(explosion);
            true
        } else {
            false
        }
    }

    fn reward(&self) -> (u64, u32) {
        (self.points, self.coins)
    }
}

/// Roaming bonus ship that crosses the top of the arena
#[derive(Debug, Clone)]
pub struct BonusEnemy {
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    pub health: i32,
    pub lifecycle: Lifecycle,
}

impl BonusEnemy {
    pub const POINTS: u64 = 100;
    pub const COINS: u32 = 10;
    pub const SPEED: f32 = 120.0;

    /// Enter from the left or right edge and fly across
    pub fn new(from_left: bool) -> Self {
        let size = Vec2::new(ENEMY_SIZE * 1.6, ENEMY_SIZE * 0.8);
        let y = size.y * 2.0;
        let (x, dir) = if from_left {
            (-size.x, 1.0)
        } else {
            (ARENA_WIDTH + size.x, -1.0)
        };
        Self {
            pos: Vec2::new(x, y),
            size,
            vel: Vec2::new(dir * Self::SPEED, 0.0),
            health: 1,
            lifecycle: Lifecycle::Alive,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        if self.lifecycle.is_alive() {
            self.pos += self.vel * dt;
        }
    }

    /// Flew past the far edge without being shot
    pub fn has_left_arena(&self) -> bool {
        let margin = self.size.x;
        (self.vel.x > 0.0 && self.pos.x > ARENA_WIDTH + margin)
            || (self.vel.x < 0.0 && self.pos.x < -margin)
    }
}

impl Hitbox for BonusEnemy {
    fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

impl Destructible for BonusEnemy {
    fn is_alive(&self) -> bool {
        self.lifecycle.is_alive()
    }

    fn take_hit(&mut self, damage: i32, explosion: Timer) -> bool {
        self.health = self.health.saturating_sub(damage);
        if self.health <= 0 {
            self.lifecycle = Lifecycle::Exploding(explosion);
            true
        } else {
            false
        }
    }

    fn reward(&self) -> (u64, u32) {
        (Self::POINTS, Self::COINS)
    }
}

/// End-of-stage boss
#[derive(Debug, Clone)]
pub struct Boss {
    pub pos: Vec2,
    pub size: Vec2,
    pub health: i32,
    pub max_health: i32,
    pub speed: f32,
    pub lifecycle: Lifecycle,
    /// Radial bullet burst
    pub spread_timer: Timer,
    /// Homing missiles once enraged
    pub missile_timer: Timer,
}

impl Boss {
    pub const POINTS: u64 = 5000;
    pub const COINS: u32 = 5000;
    pub const SPREAD_BULLETS: usize = 16;
    pub const SPREAD_SPEED: f32 = 150.0;
    pub const MISSILE_SPEED: f32 = 180.0;
    pub const BULLET_DAMAGE: i32 = 10;

    pub fn new(health: i32, spread_timer: Timer, missile_timer: Timer) -> Self {
        Self {
            pos: Vec2::new(ARENA_WIDTH * 0.5, BOSS_SIZE),
            size: Vec2::splat(BOSS_SIZE),
            health,
            max_health: health,
            speed: 80.0,
            lifecycle: Lifecycle::Alive,
            spread_timer,
            missile_timer,
        }
    }

    /// Below half health the boss adds homing missiles
    pub fn is_enraged(&self) -> bool {
        i64::from(self.health) * 2 <= i64::from(self.max_health)
    }

    /// Bounce between the side walls
    pub fn advance(&mut self, dt: f32) {
        if !self.lifecycle.is_alive() {
            return;
        }
        self.pos.x += self.speed * dt;
        let half = self.size.x * 0.5;
        if self.pos.x < half || self.pos.x > ARENA_WIDTH - half {
            self.speed = -self.speed;
            self.pos.x = self.pos.x.clamp(half, ARENA_WIDTH - half);
        }
    }
}

impl Hitbox for Boss {
    fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

impl Destructible for Boss {
    fn is_alive(&self) -> bool {
        self.lifecycle.is_alive()
    }

    fn take_hit(&mut self, damage: i32, explosion: Timer) -> bool {
        self.health = self.health.saturating_sub(damage);
        if self.health <= 0 {
            self.lifecycle = Lifecycle::Exploding(explosion);
            true
        } else {
            false
        }
    }

    fn reward(&self) -> (u64, u32) {
        (Self::POINTS, Self::COINS)
    }
}

/// Character life state
#[derive(Debug, Clone)]
pub enum CharacterState {
    Alive,
    /// Lost a life; invincible until the timer finishes, then respawns if
    /// lives remain
    Respawning(Timer),
    /// No lives left
    Out,
}

/// Mana regained per second
const MANA_REGEN_PER_SEC: f32 = 2.0;

/// A player's ship
#[derive(Debug, Clone)]
pub struct Character {
    pub player: PlayerId,
    pub class: CharacterClass,
    pub stats: ClassStats,
    pub pos: Vec2,
    pub size: Vec2,
    pub spawn_point: Vec2,
    /// Pixels per second before buffs
    pub base_speed: f32,
    pub state: CharacterState,
    pub health: i32,
    pub mana: i32,
    mana_regen: f32,
    /// Post-hit invincibility while the character keeps flying
    pub guard: Option<Timer>,
    pub skill: Option<Skill>,
    pub fire_timer: Timer,
    /// Last non-zero movement direction
    pub facing: Vec2,
    /// A dash was already spent for the current Dash effect
    pub dash_spent: bool,
}

impl Character {
    pub fn new(player: PlayerId, base_speed: f32, fire_timer: Timer) -> Self {
        let x = match player {
            PlayerId::One => ARENA_WIDTH * 0.35,
            PlayerId::Two => ARENA_WIDTH * 0.65,
        };
        let spawn_point = Vec2::new(x, ARENA_HEIGHT - CHARACTER_SIZE * 2.0);
        let class = CharacterClass::default();
        let stats = class.stats();
        Self {
            player,
            class,
            stats,
            pos: spawn_point,
            size: Vec2::splat(CHARACTER_SIZE),
            spawn_point,
            base_speed,
            state: CharacterState::Alive,
            health: stats.max_health,
            mana: stats.max_mana,
            mana_regen: 0.0,
            guard: None,
            skill: None,
            fire_timer,
            facing: Vec2::NEG_Y,
            dash_spent: false,
        }
    }

    /// Take on `class`'s stats and bind `skill` to the skill button
    pub fn with_class(mut self, class: CharacterClass, skill: Skill) -> Self {
        let stats = class.stats();
        self.base_speed *= stats.speed_scale / self.stats.speed_scale;
        self.class = class;
        self.stats = stats;
        self.health = stats.max_health;
        self.mana = stats.max_mana;
        self.skill = Some(skill);
        self
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.state, CharacterState::Alive)
    }

    /// Cannot be hit while respawning, out, or shortly after a hit
    pub fn is_invincible(&self) -> bool {
        !self.is_alive() || self.guard.as_ref().is_some_and(Timer::is_running)
    }

    pub fn is_out(&self) -> bool {
        matches!(self.state, CharacterState::Out)
    }

    /// Damage left after defense; a hit always does at least 1
    pub fn mitigate(&self, damage: i32) -> i32 {
        let defense = i64::from(self.stats.defense.max(0));
        let reduced = i64::from(damage.max(0)) * 100 / (100 + defense);
        reduced.clamp(1, i64::from(i32::MAX)) as i32
    }

    /// Apply a hit; `guard` should be a started invincibility timer.
    /// Returns true once health is gone.
    pub fn take_damage(&mut self, damage: i32, guard: Timer) -> bool {
        self.health = self.health.saturating_sub(self.mitigate(damage));
        self.guard = Some(guard);
        self.health <= 0
    }

    /// Destroyed by a hit; `respawn` should be a started timer
    pub fn destroy(&mut self, respawn: Timer) {
        self.state = CharacterState::Respawning(respawn);
    }

    /// Finish a respawn once its timer is done
    pub fn update_respawn(&mut self, has_lives: bool) {
        if let CharacterState::Respawning(timer) = &self.state {
            if timer.check_finished() {
                if has_lives {
                    self.state = CharacterState::Alive;
                    self.pos = self.spawn_point;
                    self.health = self.stats.max_health;
                    self.guard = None;
                } else {
                    log::info!("Player {} is out of lives", self.player.number());
                    self.state = CharacterState::Out;
                }
            }
        }
    }

    /// Put the character back at its spawn point (level start)
    pub fn respawn_now(&mut self) {
        self.state = CharacterState::Alive;
        self.pos = self.spawn_point;
        self.health = self.stats.max_health;
        self.guard = None;
        self.dash_spent = false;
    }

    /// Trickle mana back, whole points at a time
    pub fn regen_mana(&mut self, dt: f32) {
        self.mana_regen += MANA_REGEN_PER_SEC * dt;
        if self.mana_regen >= 1.0 {
            let whole = self.mana_regen.floor();
            self.mana = self
                .mana
                .saturating_add(whole as i32)
                .min(self.stats.max_mana);
            self.mana_regen -= whole;
        }
    }

    pub fn walk(&mut self, dir: Vec2, speed_multiplier: f32, dt: f32) {
        let dir = dir.clamp_length_max(1.0);
        if dir != Vec2::ZERO {
            self.facing = dir.normalize();
        }
        self.pos += dir * self.base_speed * speed_multiplier * dt;
        self.pos = clamp_to_arena(self.pos, self.size);
    }

    /// Instant jump along the facing direction
    pub fn dash(&mut self, distance: f32) {
        self.pos += self.facing * distance;
        self.pos = clamp_to_arena(self.pos, self.size);
    }

    /// Fire cooldown check; `rate` above 1 shortens the cooldown
    pub fn ready_to_fire(&self, rate: f32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.fire_timer.check_finished()
            || self.fire_timer.elapsed() as f32 * rate >= self.fire_timer.duration() as f32
    }

    /// Top-center of the hull, where bullets leave
    pub fn muzzle(&self) -> Vec2 {
        self.pos - Vec2::new(0.0, self.size.y * 0.5)
    }
}

impl Hitbox for Character {
    fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

/// Companion that follows its owner and soaks one hostile hit
#[derive(Debug, Clone)]
pub struct Pet {
    pub owner: PlayerId,
    pub pos: Vec2,
    pub size: Vec2,
    pub lifetime: Timer,
    pub dead: bool,
}

impl Pet {
    pub const OFFSET: Vec2 = Vec2::new(CHARACTER_SIZE, -CHARACTER_SIZE * 0.5);

    pub fn new(owner: &Character, lifetime: Timer) -> Self {
        Self {
            owner: owner.player,
            pos: owner.pos + Self::OFFSET,
            size: Vec2::splat(CHARACTER_SIZE * 0.5),
            lifetime,
            dead: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.dead && !self.lifetime.check_finished()
    }

    pub fn follow(&mut self, owner: &Character) {
        self.pos = clamp_to_arena(owner.pos + Self::OFFSET, self.size);
    }
}

impl Hitbox for Pet {
    fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

/// A falling item waiting to be picked up
#[derive(Debug, Clone)]
pub struct ItemDrop {
    pub id: u32,
    pub def: Rc<ItemDef>,
    pub pos: Vec2,
    pub size: Vec2,
    pub fall_speed: f32,
}

impl ItemDrop {
    pub fn advance(&mut self, dt: f32) {
        self.pos.y += self.fall_speed * dt;
    }
}

impl Hitbox for ItemDrop {
    fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::skill::SkillKind;
    use crate::sim::timer::{Clock, TimerFactory};
    use proptest::prelude::*;

    fn timers() -> TimerFactory {
        TimerFactory::new(Clock::manual(), 11)
    }

    #[test]
    fn test_enemy_kind_table() {
        assert_eq!(EnemyKind::Brawler.points(), 10);
        assert_eq!(EnemyKind::Gunner.coins(), 3);
        assert_eq!(EnemyKind::Sniper.points(), 30);
        assert_eq!(EnemyKind::Brawler.health(), 2);
        assert!(matches!(EnemyKind::Brawler.ai().style, AttackStyle::Melee));
    }

    #[test]
    fn test_enemy_destroy_and_explode() {
        let t = timers();
        let mut enemy = Enemy::new(1, EnemyKind::Brawler, Vec2::new(100.0, 100.0), t.fixed(1500));
        assert!(!enemy.take_hit(1, t.started(300)));
        assert!(enemy.is_alive());
        assert!(enemy.take_hit(1, t.started(300)));
        assert!(enemy.lifecycle.is_exploding());

        enemy.lifecycle.update();
        assert!(enemy.lifecycle.is_exploding());
        t.clock().advance(300);
        enemy.lifecycle.update();
        assert!(enemy.lifecycle.is_gone());
    }

    #[test]
    fn test_character_respawn() {
        let t = timers();
        let mut ship = Character::new(PlayerId::One, 200.0, t.fixed(250));
        ship.pos.x += 50.0;
        ship.destroy(t.started(1000));
        assert!(ship.is_invincible());

        ship.update_respawn(true);
        assert!(!ship.is_alive());
        t.clock().advance(1000);
        ship.update_respawn(true);
        assert!(ship.is_alive());
        assert_eq!(ship.pos, ship.spawn_point);

        ship.destroy(t.started(1000));
        t.clock().advance(1000);
        ship.update_respawn(false);
        assert!(ship.is_out());
    }

    #[test]
    fn test_character_stays_in_arena() {
        let t = timers();
        let mut ship = Character::new(PlayerId::Two, 200.0, t.fixed(250));
        ship.walk(Vec2::new(1.0, 0.0), 1.0, 100.0);
        assert!(ship.pos.x <= ARENA_WIDTH - ship.size.x * 0.5);
        assert_eq!(ship.facing, Vec2::X);
    }

    #[test]
    fn test_character_damage_model() {
        let t = timers();
        let mut ship = Character::new(PlayerId::One, 200.0, t.fixed(250));
        assert_eq!(ship.health, 150);
        // 30 defense: 13 * 100 / 130 = 10
        assert_eq!(ship.mitigate(13), 10);
        assert_eq!(ship.mitigate(0), 1);

        assert!(!ship.take_damage(13, t.started(1000)));
        assert_eq!(ship.health, 140);
        assert!(ship.is_alive());
        assert!(ship.is_invincible());
        t.clock().advance(1000);
        assert!(!ship.is_invincible());

        assert!(ship.take_damage(i32::MAX, t.started(1000)));
        ship.destroy(t.started(500));
        t.clock().advance(500);
        ship.update_respawn(true);
        assert_eq!(ship.health, 150);
        assert!(ship.guard.is_none());
    }

    #[test]
    fn test_class_changes_stats() {
        let t = timers();
        let skill = Skill::new(CharacterClass::Archer.skill(), &t);
        let ship = Character::new(PlayerId::Two, 200.0, t.fixed(250))
            .with_class(CharacterClass::Archer, skill);
        assert_eq!(ship.health, 90);
        assert_eq!(ship.mana, 100);
        assert!((ship.base_speed - 240.0).abs() < 1e-3);
        assert_eq!(ship.mitigate(10), 9);
    }

    #[test]
    fn test_mana_regen_caps() {
        let t = timers();
        let mut ship = Character::new(PlayerId::One, 200.0, t.fixed(250));
        ship.mana = 10;
        ship.regen_mana(0.25);
        assert_eq!(ship.mana, 10);
        ship.regen_mana(0.25);
        assert_eq!(ship.mana, 11);
        ship.regen_mana(1000.0);
        assert_eq!(ship.mana, ship.stats.max_mana);
    }

    #[test]
    fn test_fire_rate_shortens_cooldown() {
        let t = timers();
        let mut ship = Character::new(PlayerId::One, 200.0, t.fixed(300));
        assert!(ship.ready_to_fire(1.0));
        ship.fire_timer.reset();
        t.clock().advance(200);
        assert!(!ship.ready_to_fire(1.0));
        assert!(ship.ready_to_fire(1.5));
    }

    #[test]
    fn test_boss_enrage_with_huge_health() {
        let t = timers();
        let boss = Boss::new(i32::MAX, t.fixed(1000), t.fixed(1000));
        assert!(!boss.is_enraged());
    }

    #[test]
    fn test_bonus_leaves() {
        let mut bonus = BonusEnemy::new(true);
        assert!(!bonus.has_left_arena());
        bonus.advance(10.0);
        assert!(bonus.has_left_arena());
    }

    #[test]
    fn test_boss_enrage() {
        let t = timers();
        let mut boss = Boss::new(100, t.fixed(1000), t.fixed(1000));
        assert!(!boss.is_enraged());
        boss.take_hit(50, t.started(500));
        assert!(boss.is_enraged());
        assert!(boss.is_alive());
    }

    proptest! {
        #[test]
        fn prop_any_hit_costs_between_one_and_damage(damage in any::<i32>(), class in 0usize..7) {
            let t = timers();
            let mut ship = Character::new(PlayerId::One, 200.0, t.fixed(100))
                .with_class(CharacterClass::ALL[class], Skill::new(SkillKind::RapidFire, &t));
            let cost = ship.mitigate(damage);
            prop_assert!(cost >= 1);
            prop_assert!(cost <= damage.max(1));

            let before = ship.health;
            ship.take_damage(damage, t.started(100));
            prop_assert!(ship.health < before);
        }
    }
}
