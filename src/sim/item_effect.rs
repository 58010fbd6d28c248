//! Item effect handlers
//!
//! One handler per [`ItemKind`]. Each mutates run state, a player's effect
//! ledger, or both, and reports whether it applied. Handlers are safe to
//! call repeatedly.

use super::effects::EffectKind;
use super::items::{ItemDef, ItemKind};
use super::player::PlayerId;
use super::state::GameState;
use crate::consts::HEAL_OVERFLOW_REWARD;
use crate::secs_to_ms;

/// Shortest duration for freeze, slow, dash and pet effects (seconds)
const MIN_TIMED_SECS: f32 = 1.0;

/// Apply `def`'s effect for `player`
pub fn apply(state: &mut GameState, player: PlayerId, def: &ItemDef) -> bool {
    let value = def.effect_value;
    let secs = def.effect_duration;

    let applied = match &def.kind {
        ItemKind::Coin => coin(state, value),
        ItemKind::Heal => heal(state, player, value),
        ItemKind::Score => score(state, player, value),
        ItemKind::ScoreBoost => timed(state, player, EffectKind::ScoreBoost, Some(value), secs),
        ItemKind::TripleShot => timed(state, player, EffectKind::TripleShot, None, secs),
        ItemKind::BulletSpeedUp => {
            timed(state, player, EffectKind::BulletSpeedUp, Some(value), secs)
        }
        ItemKind::MoveSpeedUp => timed(state, player, EffectKind::MoveSpeedUp, Some(value), secs),
        ItemKind::EnemyHpDown => timed(state, player, EffectKind::EnemyHpDown, Some(value), secs),
        ItemKind::Shield => timed(state, player, EffectKind::Shield, None, secs),
        ItemKind::TimeFreeze => time_freeze(state, secs),
        ItemKind::TimeSlow => time_slow(state, player, value, secs),
        ItemKind::Dash => dash(state, player, value, secs),
        ItemKind::PetGun => pet_support(state, player, secs),
        ItemKind::Unknown(tag) => {
            log::warn!("[Item] no effect for type {tag} (item '{}')", def.id);
            false
        }
    };

    if applied {
        log::info!("[Item] player {} applied {}", player.number(), def.kind);
    } else {
        log::info!(
            "[Item] effect for player {} could not be applied, type={}",
            player.number(),
            def.kind
        );
    }
    applied
}

fn coin(state: &mut GameState, amount: i32) -> bool {
    if amount <= 0 {
        return false;
    }
    state.run.add_coins(amount as u32);
    true
}

/// Add lives; past the cap the heal pays out coins and score instead
fn heal(state: &mut GameState, player: PlayerId, amount: i32) -> bool {
    if amount <= 0 {
        return false;
    }
    let amount = amount as u32;
    if state.run.would_exceed_cap(player, amount) {
        let reward = amount.saturating_mul(HEAL_OVERFLOW_REWARD);
        state.run.add_coins(reward);
        state.add_score(player, reward as u64);
        log::debug!("heal over cap converted to {reward} coins and score");
    } else {
        state.run.add_life(player, amount);
    }
    true
}

fn score(state: &mut GameState, player: PlayerId, amount: i32) -> bool {
    if amount <= 0 {
        return false;
    }
    state.add_score(player, amount as u64);
    true
}

fn timed(
    state: &mut GameState,
    player: PlayerId,
    kind: EffectKind,
    magnitude: Option<i32>,
    secs: f32,
) -> bool {
    if secs <= 0.0 {
        return false;
    }
    state.add_effect(player, kind, magnitude, secs);
    true
}

fn time_freeze(state: &mut GameState, secs: f32) -> bool {
    state.apply_global_freeze(secs_to_ms(secs.max(MIN_TIMED_SECS)));
    true
}

fn time_slow(state: &mut GameState, player: PlayerId, percent: i32, secs: f32) -> bool {
    let percent = percent.clamp(0, 100);
    state.add_effect(
        player,
        EffectKind::TimeSlow,
        Some(percent),
        secs.max(MIN_TIMED_SECS),
    );
    true
}

fn dash(state: &mut GameState, player: PlayerId, multiplier: i32, secs: f32) -> bool {
    if state.character(player).is_none_or(|c| !c.is_alive()) {
        return false;
    }
    state.add_effect(
        player,
        EffectKind::Dash,
        Some(multiplier.max(1)),
        secs.max(MIN_TIMED_SECS),
    );
    true
}

fn pet_support(state: &mut GameState, player: PlayerId, secs: f32) -> bool {
    let secs = secs.max(MIN_TIMED_SECS);
    if !state.spawn_pet(player, secs_to_ms(secs)) {
        return false;
    }
    state.add_effect(player, EffectKind::PetSupport, None, secs);
    true
}
