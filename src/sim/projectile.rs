//! Projectiles and their pool
//!
//! A projectile is either in flight (owned by the game state's projectile
//! list) or pooled (owned by [`ProjectilePool`]). `Projectile` is not
//! `Clone`, so releasing moves it and a released projectile cannot be read
//! or released again by the caller.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Hitbox};
use super::player::{PerPlayer, PlayerId};
use super::pool::Pool;
use super::timer::Timer;

/// Stable identity of a pooled projectile, kept across reuse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(pub u32);

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    /// Enemies, the bonus ship and the boss
    Hostile,
    Player(PlayerId),
}

impl Owner {
    /// 0 for hostile, 1..=N for players
    pub fn id(self) -> u8 {
        match self {
            Owner::Hostile => 0,
            Owner::Player(player) => player.number(),
        }
    }

    pub fn is_hostile(self) -> bool {
        matches!(self, Owner::Hostile)
    }
}

/// Steering toward a player for a limited time
#[derive(Debug, Clone)]
pub struct Homing {
    pub target: PlayerId,
    /// Radians per second the heading may turn
    pub turn_rate: f32,
    pub timer: Timer,
}

/// What the pool needs to issue a projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpec {
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    pub owner: Owner,
    pub damage: i32,
}

#[derive(Debug)]
pub struct Projectile {
    id: ProjectileId,
    /// Center position
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub owner: Owner,
    pub damage: i32,
    pub homing: Option<Homing>,
    /// Presentation only
    pub rotation: f32,
    /// Melee swings and other short-lived hitboxes
    pub lifetime: Option<Timer>,
    /// Distance after which the projectile is culled
    pub max_range: Option<f32>,
    pub origin: Vec2,
    /// Not consumed on hit (lasers); remembers who it already hit
    pub persistent: bool,
    pub hit_players: PerPlayer<bool>,
    /// Consumed this tick; released when combat resolution ends
    pub marked: bool,
}

impl Projectile {
    fn blank(id: ProjectileId) -> Self {
        Self {
            id,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            size: Vec2::ONE,
            owner: Owner::Hostile,
            damage: 0,
            homing: None,
            rotation: 0.0,
            lifetime: None,
            max_range: None,
            origin: Vec2::ZERO,
            persistent: false,
            hit_players: PerPlayer::default(),
            marked: false,
        }
    }

    /// Overwrite every field except identity
    fn configure(&mut self, spec: ProjectileSpec) {
        *self = Self {
            pos: spec.pos,
            vel: spec.vel,
            size: spec.size,
            owner: spec.owner,
            damage: spec.damage,
            origin: spec.pos,
            ..Self::blank(self.id)
        };
    }

    pub fn id(&self) -> ProjectileId {
        self.id
    }

    pub fn advance(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    /// Turn toward `target` while the homing timer runs; drop homing after
    pub fn steer_toward(&mut self, target: Option<Vec2>, dt: f32) {
        let Some(homing) = &self.homing else {
            return;
        };
        if homing.timer.check_finished() {
            self.homing = None;
            return;
        }
        let Some(target) = target else {
            return;
        };

        let speed = self.vel.length();
        let heading = self.vel.normalize_or_zero();
        let wanted = (target - self.pos).normalize_or_zero();
        if speed <= f32::EPSILON || wanted == Vec2::ZERO {
            return;
        }

        let max_turn = homing.turn_rate * dt;
        let angle = heading.angle_to(wanted).clamp(-max_turn, max_turn);
        self.vel = Vec2::from_angle(angle).rotate(heading) * speed;
        self.rotation = self.vel.y.atan2(self.vel.x);
    }

    /// Lifetime elapsed or range exceeded
    pub fn is_spent(&self) -> bool {
        let timed_out = self
            .lifetime
            .as_ref()
            .is_some_and(|timer| timer.check_finished());
        let out_of_range = self
            .max_range
            .is_some_and(|range| self.pos.distance(self.origin) > range);
        timed_out || out_of_range
    }
}

impl Hitbox for Projectile {
    fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

/// Pool of projectiles shared by players and enemies
#[derive(Debug, Default)]
pub struct ProjectilePool {
    pool: Pool<Projectile>,
    next_id: u32,
}

impl ProjectilePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a projectile configured from `spec`.
    ///
    /// A reused projectile keeps its id; every other field is overwritten and
    /// rotation, homing, lifetime, range and hit record are reset.
    pub fn acquire(&mut self, spec: ProjectileSpec) -> Projectile {
        let next_id = &mut self.next_id;
        let mut projectile = self.pool.take_or_else(|| {
            *next_id += 1;
            Projectile::blank(ProjectileId(*next_id))
        });
        projectile.configure(spec);
        projectile
    }

    pub fn release(&mut self, projectile: Projectile) {
        self.pool.put(projectile);
    }

    pub fn release_all(&mut self, projectiles: impl IntoIterator<Item = Projectile>) {
        for projectile in projectiles {
            self.release(projectile);
        }
    }

    /// Move in-flight projectiles matching `pred` back into the pool
    pub fn reclaim(
        &mut self,
        in_flight: &mut Vec<Projectile>,
        pred: impl FnMut(&Projectile) -> bool,
    ) -> usize {
        self.pool.reclaim_where(in_flight, pred)
    }

    pub fn pooled(&self) -> usize {
        self.pool.pooled()
    }

    pub fn allocated(&self) -> usize {
        self.pool.allocated()
    }
}
