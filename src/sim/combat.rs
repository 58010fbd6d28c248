//! Collision and combat resolution
//!
//! Runs once per tick after everything has moved. Hostile fire is resolved
//! against characters (then pets), player fire against enemies, and every
//! projectile consumed along the way goes back to the pool in one pass at
//! the end, so a projectile is released exactly once.

use glam::Vec2;

use super::collision::{Aabb, Hitbox, overlaps};
use super::effects::EffectKind;
use super::entities::Destructible;
use super::player::PlayerId;
use super::projectile::Owner;
use super::spawn::DropSource;
use super::state::{Achievement, GameEvent, GameState};
use crate::audio::SoundCue;
use crate::tuning::DamageModel;

/// What one resolution pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombatReport {
    /// Projectiles returned to the pool
    pub released: usize,
    pub characters_hit: usize,
    pub shields_used: usize,
    pub pets_hit: usize,
    pub enemies_destroyed: usize,
}

/// Resolve this tick's hits
pub fn resolve(state: &mut GameState, drops: &mut dyn DropSource) -> CombatReport {
    let mut report = CombatReport::default();
    resolve_hostile_fire(state, &mut report);
    resolve_player_fire(state, drops, &mut report);
    report.released = state
        .projectile_pool
        .reclaim(&mut state.projectiles, |p| p.marked);
    report
}

fn resolve_hostile_fire(state: &mut GameState, report: &mut CombatReport) {
    for i in 0..state.projectiles.len() {
        let projectile = &state.projectiles[i];
        if !projectile.owner.is_hostile() || projectile.marked {
            continue;
        }

        let victim = state
            .characters
            .iter()
            .filter(|c| !c.is_invincible())
            .filter(|c| !(projectile.persistent && projectile.hit_players[c.player]))
            .find(|c| overlaps(projectile, *c))
            .map(|c| c.player);

        match victim {
            Some(player) => {
                consume_on_character(state, i, player);
                if state.has_effect(player, EffectKind::Shield) {
                    report.shields_used += 1;
                    state.emit(GameEvent::ShieldBlocked { player });
                    state.emit(GameEvent::Sound(SoundCue::ShieldBlock));
                    log::debug!("Player {} shield absorbed a hit", player.number());
                } else {
                    report.characters_hit += 1;
                    let damage = state.projectiles[i].damage;
                    hit_character(state, player, damage);
                }
            }
            None => {
                if hit_pet(state, i) {
                    report.pets_hit += 1;
                }
            }
        }
    }
}

/// Persistent projectiles remember the victim; anything else is spent
fn consume_on_character(state: &mut GameState, index: usize, player: PlayerId) {
    let projectile = &mut state.projectiles[index];
    if projectile.persistent {
        projectile.hit_players[player] = true;
    } else {
        projectile.marked = true;
    }
}

/// Arcade: every hit costs a life. Health: a life goes only once the hull
/// is spent; lighter hits leave a short invincibility window.
fn hit_character(state: &mut GameState, player: PlayerId, damage: i32) {
    state.run.took_damage = true;
    if state.tuning.damage_model == DamageModel::Health {
        let guard = state.timers.started(state.tuning.hit_guard_ms);
        let Some(character) = state.character_mut(player) else {
            return;
        };
        if !character.take_damage(damage, guard) {
            let health = character.health;
            state.emit(GameEvent::PlayerDamaged { player, health });
            state.emit(GameEvent::Sound(SoundCue::EnemyHit));
            log::debug!("Player {} hit, {health} health left", player.number());
            return;
        }
    }

    let respawn = state.timers.started(state.tuning.respawn_ms);
    if let Some(character) = state.character_mut(player) {
        character.destroy(respawn);
    }
    state.run.dec_life(player);
    state.emit(GameEvent::PlayerHit { player });
    state.emit(GameEvent::Sound(SoundCue::PlayerHit));
    log::info!(
        "Player {} hit, {} lives left",
        player.number(),
        state.run.lives_for(player)
    );
}

fn hit_pet(state: &mut GameState, index: usize) -> bool {
    let aabb = state.projectiles[index].aabb();
    let Some(pet) = state
        .pets
        .iter_mut()
        .find(|pet| pet.is_alive() && pet.aabb().overlaps(&aabb))
    else {
        return false;
    };
    pet.dead = true;
    log::debug!("Pet of player {} took a hit", pet.owner.number());

    let projectile = &mut state.projectiles[index];
    if !projectile.persistent {
        projectile.marked = true;
    }
    true
}

/// First living target under `aabb`: formation enemies in spawn order, then
/// the bonus ship, then the boss
fn find_target<'a>(state: &'a mut GameState, aabb: &Aabb) -> Option<&'a mut dyn Destructible> {
    if let Some(enemy) = state
        .enemies
        .iter_mut()
        .find(|e| e.is_alive() && e.aabb().overlaps(aabb))
    {
        return Some(enemy);
    }
    if let Some(bonus) = state.bonus.as_mut() {
        if bonus.is_alive() && bonus.aabb().overlaps(aabb) {
            return Some(bonus);
        }
    }
    if let Some(boss) = state.boss.as_mut() {
        if boss.is_alive() && boss.aabb().overlaps(aabb) {
            return Some(boss);
        }
    }
    None
}

fn resolve_player_fire(
    state: &mut GameState,
    drops: &mut dyn DropSource,
    report: &mut CombatReport,
) {
    for i in 0..state.projectiles.len() {
        let projectile = &state.projectiles[i];
        let Owner::Player(shooter) = projectile.owner else {
            continue;
        };
        if projectile.marked {
            continue;
        }
        let aabb = projectile.aabb();
        let bonus_damage = state
            .effect_value(shooter, EffectKind::EnemyHpDown)
            .unwrap_or(0);
        let damage = projectile.damage.saturating_add(bonus_damage.max(0));

        let explosion = state.timers.started(state.tuning.explosion_ms);
        let Some(target) = find_target(state, &aabb) else {
            continue;
        };
        let destroyed = target.take_hit(damage, explosion);
        let (points, coins) = target.reward();
        let pos = target.aabb().center;

        state.projectiles[i].marked = true;
        if destroyed {
            report.enemies_destroyed += 1;
            credit_kill(state, drops, shooter, points, coins, pos);
        } else {
            state.emit(GameEvent::Sound(SoundCue::EnemyHit));
        }
    }
}

fn credit_kill(
    state: &mut GameState,
    drops: &mut dyn DropSource,
    shooter: PlayerId,
    points: u64,
    coins: u32,
    pos: Vec2,
) {
    let gained = state.add_score(shooter, points);
    state.run.add_coins(coins);
    state.run.inc_ships_destroyed(shooter);
    state.emit(GameEvent::EnemyDestroyed {
        by: shooter,
        points: gained,
        pos,
    });
    state.emit(GameEvent::Sound(SoundCue::Explosion));
    state.unlock(Achievement::FirstBlood);

    if let Some(def) = drops.roll(pos) {
        log::debug!("Enemy dropped {}", def.id);
        state.spawn_item_drop(def, pos);
    }
}
