//! Enemy steering and attacks
//!
//! Movement is frame-coupled (scaled by `dt` and the global enemy speed
//! multiplier). Attacks are gated by each enemy's wall-clock cooldown.

use glam::Vec2;

use super::entities::{AttackStyle, Boss, Character, Destructible, Enemy};
use super::projectile::{Homing, Owner, Projectile, ProjectilePool, ProjectileSpec};
use super::timer::TimerFactory;
use crate::clamp_to_arena;
use crate::consts::{ENEMY_SIZE, HOMING_MS, SPAWN_BAND_HEIGHT};

/// Separation was tuned per 60 Hz frame; this converts it to px/s
const SEPARATION_SCALE: f32 = 60.0;
/// Ranged enemies hold position inside `preferred ± this`
const DISTANCE_BUFFER: f32 = 50.0;
const MELEE_LIFETIME_MS: u64 = 500;
const ENEMY_BULLET_SIZE: f32 = 6.0;
const MISSILE_TURN_RATE: f32 = 2.5;

/// Closest living character to `from`; ties go to the lower player id
pub fn nearest_character(from: Vec2, characters: &[Character]) -> Option<&Character> {
    characters
        .iter()
        .filter(|c| c.is_alive())
        .min_by(|a, b| {
            a.pos
                .distance_squared(from)
                .total_cmp(&b.pos.distance_squared(from))
                .then(a.player.cmp(&b.player))
        })
}

/// Desired velocity (px/s) for enemy `index`: seek or hold range toward the
/// target plus separation from the other living enemies.
fn desired_velocity(index: usize, enemies: &[Enemy], target: Option<Vec2>) -> Vec2 {
    let me = &enemies[index];
    let mut vel = Vec2::ZERO;

    if let Some(target) = target {
        let to_target = target - me.pos;
        let dist = to_target.length();
        let dir = to_target.normalize_or_zero();
        match me.ai.style {
            AttackStyle::Melee => vel += dir * me.ai.move_speed,
            AttackStyle::Ranged {
                preferred_distance, ..
            } => {
                if dist > preferred_distance + DISTANCE_BUFFER {
                    vel += dir * me.ai.move_speed;
                } else if dist < preferred_distance - DISTANCE_BUFFER {
                    vel -= dir * me.ai.move_speed;
                }
            }
        }
    }

    let radius = me.ai.separation_radius;
    for (j, other) in enemies.iter().enumerate() {
        if j == index || !other.is_alive() {
            continue;
        }
        let diff = me.pos - other.pos;
        let dist_sq = diff.length_squared();
        if dist_sq > 0.0 && dist_sq < radius * radius {
            let dist = dist_sq.sqrt();
            vel += diff / dist * me.ai.separation_force * (radius / dist) * SEPARATION_SCALE;
        }
    }

    vel
}

/// Move every living enemy one step
pub fn move_enemies(enemies: &mut [Enemy], characters: &[Character], speed_multiplier: f32, dt: f32) {
    for i in 0..enemies.len() {
        if !enemies[i].is_alive() {
            continue;
        }
        let target = nearest_character(enemies[i].pos, characters).map(|c| c.pos);
        let vel = desired_velocity(i, enemies, target);

        let enemy = &mut enemies[i];
        if let Some(target) = target {
            enemy.facing_right = target.x >= enemy.pos.x;
        }
        enemy.pos += vel * speed_multiplier * dt;
        enemy.pos = clamp_to_arena(enemy.pos, enemy.size);
    }
}

/// Attack the nearest character if it is in range and the cooldown allows.
/// Returns the projectile the attack produced.
pub fn try_attack(
    enemy: &mut Enemy,
    characters: &[Character],
    pool: &mut ProjectilePool,
    timers: &TimerFactory,
) -> Option<Projectile> {
    if !enemy.is_alive() {
        return None;
    }
    let target = nearest_character(enemy.pos, characters)?;
    let to_target = target.pos - enemy.pos;
    if to_target.length() > enemy.ai.attack_range || !enemy.attack_timer.check_finished() {
        return None;
    }
    enemy.attack_timer.reset();
    let dir = to_target.normalize_or(Vec2::Y);

    let projectile = match enemy.ai.style {
        AttackStyle::Melee => {
            let mut swing = pool.acquire(ProjectileSpec {
                pos: enemy.pos + dir * ENEMY_SIZE,
                size: Vec2::splat(ENEMY_SIZE * 1.5),
                vel: Vec2::ZERO,
                owner: Owner::Hostile,
                damage: enemy.ai.attack_damage,
            });
            swing.lifetime = Some(timers.started(MELEE_LIFETIME_MS));
            swing.rotation = dir.y.atan2(dir.x);
            swing
        }
        AttackStyle::Ranged { bullet_speed, .. } => {
            let mut bullet = pool.acquire(ProjectileSpec {
                pos: enemy.pos,
                size: Vec2::splat(ENEMY_BULLET_SIZE),
                vel: dir * bullet_speed,
                owner: Owner::Hostile,
                damage: enemy.ai.attack_damage,
            });
            bullet.max_range = Some(enemy.ai.attack_range * 1.5);
            bullet.rotation = dir.y.atan2(dir.x);
            bullet
        }
    };
    log::trace!("enemy {} attacks player {}", enemy.id, target.player.number());
    Some(projectile)
}

/// Boss patterns: a radial burst on its timer and, once enraged, homing
/// missiles at the nearest character.
pub fn boss_attacks(
    boss: &mut Boss,
    characters: &[Character],
    pool: &mut ProjectilePool,
    timers: &TimerFactory,
    out: &mut Vec<Projectile>,
) {
    if !boss.is_alive() {
        return;
    }

    if boss.spread_timer.check_finished() {
        boss.spread_timer.reset();
        let step = std::f32::consts::TAU / Boss::SPREAD_BULLETS as f32;
        for i in 0..Boss::SPREAD_BULLETS {
            let dir = Vec2::from_angle(step * i as f32);
            out.push(pool.acquire(ProjectileSpec {
                pos: boss.pos,
                size: Vec2::splat(ENEMY_BULLET_SIZE),
                vel: dir * Boss::SPREAD_SPEED,
                owner: Owner::Hostile,
                damage: Boss::BULLET_DAMAGE,
            }));
        }
    }

    if boss.is_enraged() && boss.missile_timer.check_finished() {
        let Some(target) = nearest_character(boss.pos, characters) else {
            return;
        };
        boss.missile_timer.reset();
        let dir = (target.pos - boss.pos).normalize_or(Vec2::Y);
        let mut missile = pool.acquire(ProjectileSpec {
            pos: boss.pos + dir * boss.size.y * 0.5,
            size: Vec2::new(ENEMY_BULLET_SIZE, ENEMY_BULLET_SIZE * 2.0),
            vel: dir * Boss::MISSILE_SPEED,
            owner: Owner::Hostile,
            damage: Boss::BULLET_DAMAGE,
        });
        missile.homing = Some(Homing {
            target: target.player,
            turn_rate: MISSILE_TURN_RATE,
            timer: timers.started(HOMING_MS),
        });
        out.push(missile);
    }
}

/// Random spawn point in the upper band of the arena
pub fn spawn_band_point(x01: f32, y01: f32) -> Vec2 {
    let margin = ENEMY_SIZE;
    Vec2::new(
        margin + x01 * (crate::consts::ARENA_WIDTH - 2.0 * margin),
        margin + y01 * (SPAWN_BAND_HEIGHT - margin),
    )
}
