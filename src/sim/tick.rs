//! Fixed timestep simulation tick
//!
//! One call advances a run by `dt` seconds. Motion scales by `dt`; every
//! cooldown, buff and respawn is a wall-clock [`Timer`](super::timer::Timer)
//! read from the state's clock.

use glam::Vec2;

use super::ai::{boss_attacks, move_enemies, try_attack};
use super::collision::{Hitbox, outside_arena};
use super::combat::{self, CombatReport};
use super::effects::EffectKind;
use super::entities::Destructible;
use super::pickup;
use super::player::{PerPlayer, PlayerId};
use super::projectile::{Owner, ProjectileSpec};
use super::spawn::{DropSource, Spawner};
use super::state::{Achievement, GameEvent, GamePhase, GameState, LevelOutcome};
use crate::audio::SoundCue;
use crate::consts::*;

/// Bullets fired before the volume achievement unlocks
const BULLET_ACHIEVEMENT: u32 = 50;

/// What one player wants this tick, already resolved from device input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerIntent {
    /// Movement direction; longer than 1 is clamped
    pub move_dir: Vec2,
    pub fire: bool,
    /// Trigger the active item
    pub use_item: bool,
    /// Trigger the class skill
    pub skill: bool,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub players: PerPlayer<PlayerIntent>,
    /// Pause toggle
    pub pause: bool,
}

/// Host-supplied spawning and loot
pub struct Collaborators<'a> {
    pub spawner: &'a mut dyn Spawner,
    pub drops: &'a mut dyn DropSource,
}

/// Advance the game state by one fixed timestep.
///
/// Returns the combat report for the step, or `None` if nothing was
/// simulated (paused, cleared or over).
pub fn tick(
    state: &mut GameState,
    input: &TickInput,
    dt: f32,
    collab: &mut Collaborators<'_>,
) -> Option<CombatReport> {
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                log::debug!("Paused");
                return None;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                log::debug!("Resumed");
            }
            _ => {}
        }
    }
    if state.phase != GamePhase::Playing {
        return None;
    }

    state.time_ticks += 1;
    state.normalize_order();

    update_characters(state, input, dt);
    fire_weapons(state, input);
    for player in PlayerId::ALL {
        let can_act = state.character(player).is_some_and(|c| c.is_alive());
        if input.players[player].use_item && can_act {
            state.use_active_item(player);
        }
        if input.players[player].skill && can_act {
            state.use_skill(player);
        }
    }

    collab.spawner.update(state);
    update_hostiles(state, dt);
    update_projectiles(state, dt);
    update_lifecycles(state);
    update_items(state, dt);

    let report = combat::resolve(state, collab.drops);
    let collected = pickup::resolve(state);
    if collected > 0 {
        log::trace!("{collected} items collected");
    }
    state.update_effects();

    check_level_end(state);
    Some(report)
}

/// Respawns, mana, dashes and movement
fn update_characters(state: &mut GameState, input: &TickInput, dt: f32) {
    let dash_distance = state.tuning.dash_distance;
    for i in 0..state.characters.len() {
        let player = state.characters[i].player;
        let has_lives = state.run.lives_for(player) > 0;
        let speed_up = state.effect_value(player, EffectKind::MoveSpeedUp);
        let dash = state.effect_value(player, EffectKind::Dash);

        let character = &mut state.characters[i];
        character.update_respawn(has_lives);
        if !character.is_alive() {
            continue;
        }
        character.regen_mana(dt);

        // One burst per activation; re-arms when the effect ends
        match dash {
            Some(multiplier) if !character.dash_spent => {
                character.dash(dash_distance * multiplier.max(1) as f32);
                character.dash_spent = true;
            }
            None => character.dash_spent = false,
            Some(_) => {}
        }

        let speed_multiplier = 1.0 + speed_up.unwrap_or(0).max(0) as f32 / 100.0;
        character.walk(input.players[player].move_dir, speed_multiplier, dt);
    }
}

fn fire_weapons(state: &mut GameState, input: &TickInput) {
    let rates = PerPlayer::from_fn(|p| state.fire_rate(p));
    let mut volleys = Vec::new();
    for character in &mut state.characters {
        let rate = rates[character.player];
        if input.players[character.player].fire && character.ready_to_fire(rate) {
            character.fire_timer.reset();
            volleys.push((character.player, character.muzzle()));
        }
    }

    for (player, muzzle) in volleys {
        let speed_up = state.effect_value(player, EffectKind::BulletSpeedUp).unwrap_or(0);
        let speed = state.tuning.bullet_speed * (1.0 + speed_up.max(0) as f32 / 100.0);
        let damage = state.volley_damage(player);
        let spread = state.tuning.triple_shot_spread;
        let fan = [-spread, 0.0, spread];
        let angles = if state.has_effect(player, EffectKind::TripleShot) {
            &fan[..]
        } else {
            &fan[1..2]
        };

        for angle in angles {
            let vel = Vec2::from_angle(*angle).rotate(Vec2::NEG_Y) * speed;
            let mut bullet = state.projectile_pool.acquire(ProjectileSpec {
                pos: muzzle,
                size: Vec2::new(BULLET_WIDTH, BULLET_HEIGHT),
                vel,
                owner: Owner::Player(player),
                damage,
            });
            bullet.rotation = *angle;
            state.projectiles.push(bullet);
        }

        state.run.inc_bullets_shot(player);
        state.emit(GameEvent::Sound(SoundCue::Shoot));
        if state.run.bullets_shot() >= BULLET_ACHIEVEMENT {
            state.unlock(Achievement::FiftyBullets);
        }
    }
}

/// Enemy, bonus ship and boss movement and attacks. Nothing hostile acts
/// while a freeze is running.
fn update_hostiles(state: &mut GameState, dt: f32) {
    if state.enemies_frozen() {
        return;
    }
    let speed = state.enemy_speed_multiplier();

    move_enemies(&mut state.enemies, &state.characters, speed, dt);
    let mut attacked = false;
    for enemy in &mut state.enemies {
        if let Some(projectile) = try_attack(
            enemy,
            &state.characters,
            &mut state.projectile_pool,
            &state.timers,
        ) {
            state.projectiles.push(projectile);
            attacked = true;
        }
    }

    if let Some(bonus) = &mut state.bonus {
        bonus.advance(dt * speed);
    }

    if let Some(boss) = &mut state.boss {
        boss.advance(dt * speed);
        let before = state.projectiles.len();
        boss_attacks(
            boss,
            &state.characters,
            &mut state.projectile_pool,
            &state.timers,
            &mut state.projectiles,
        );
        attacked |= state.projectiles.len() > before;
    }

    if attacked {
        state.emit(GameEvent::Sound(SoundCue::EnemyAttack));
    }
}

/// Steer, move and cull projectiles
fn update_projectiles(state: &mut GameState, dt: f32) {
    for projectile in &mut state.projectiles {
        if let Some(homing) = &projectile.homing {
            let target = state
                .characters
                .iter()
                .find(|c| c.player == homing.target && c.is_alive())
                .map(|c| c.pos);
            projectile.steer_toward(target, dt);
        }
        projectile.advance(dt);
    }

    let culled = state.projectile_pool.reclaim(&mut state.projectiles, |p| {
        p.is_spent() || outside_arena(&p.aabb(), CULL_MARGIN)
    });
    if culled > 0 {
        log::trace!("{culled} projectiles culled");
    }
}

/// Explosions, departures and pets
fn update_lifecycles(state: &mut GameState) {
    for enemy in &mut state.enemies {
        enemy.lifecycle.update();
    }
    state.enemies.retain(|e| !e.lifecycle.is_gone());

    if let Some(bonus) = &mut state.bonus {
        bonus.lifecycle.update();
        let escaped = bonus.is_alive() && bonus.has_left_arena();
        if escaped {
            log::debug!("Bonus ship escaped");
        }
        if escaped || bonus.lifecycle.is_gone() {
            state.bonus = None;
        }
    }

    if let Some(boss) = &mut state.boss {
        boss.lifecycle.update();
        if boss.lifecycle.is_gone() {
            state.boss = None;
        }
    }

    for pet in &mut state.pets {
        if let Some(owner) = state.characters.iter().find(|c| c.player == pet.owner) {
            pet.follow(owner);
        }
    }
    state.pets.retain(|pet| pet.is_alive());
}

fn update_items(state: &mut GameState, dt: f32) {
    for item in &mut state.items {
        item.advance(dt);
    }
    state.reclaim_items(|item| outside_arena(&item.aabb(), CULL_MARGIN));
}

fn check_level_end(state: &mut GameState) {
    let Some(outcome) = state.level_outcome() else {
        return;
    };
    state.emit(GameEvent::LevelEnded(outcome));
    match outcome {
        LevelOutcome::Cleared => {
            state.phase = GamePhase::LevelCleared;
            state.emit(GameEvent::Sound(SoundCue::LevelClear));
            state.check_clear_achievements();
            log::info!(
                "Level {} cleared, score {}",
                state.run.level,
                state.run.total_score()
            );
        }
        LevelOutcome::Failed => {
            state.phase = GamePhase::GameOver;
            state.emit(GameEvent::Sound(SoundCue::GameOver));
            log::info!(
                "Game over on level {}, score {}",
                state.run.level,
                state.run.total_score()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entities::EnemyKind;
    use crate::sim::items::ItemDb;
    use crate::sim::run::PlayMode;
    use crate::sim::spawn::{NoDrops, NoSpawns, TieredDrops, WaveSpawner};
    use crate::sim::timer::Clock;
    use crate::tuning::Tuning;

    const FRAME_MS: u64 = 16;

    fn state() -> GameState {
        GameState::new(12345, Tuning::default(), Clock::manual())
    }

    /// Tick with no spawns or drops, advancing the clock one frame first
    fn step(state: &mut GameState, input: &TickInput) -> Option<CombatReport> {
        state.clock().advance(FRAME_MS);
        let mut collab = Collaborators {
            spawner: &mut NoSpawns,
            drops: &mut NoDrops,
        };
        tick(state, input, SIM_DT, &mut collab)
    }

    fn firing(player: PlayerId) -> TickInput {
        let mut input = TickInput::default();
        input.players[player].fire = true;
        input
    }

    #[test]
    fn test_tick_pause() {
        let mut state = state();
        state.spawn_enemy(EnemyKind::Brawler, Vec2::new(100.0, 100.0));

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        assert!(step(&mut state, &pause).is_none());
        assert_eq!(state.phase, GamePhase::Paused);

        let before = state.enemies[0].pos;
        assert!(step(&mut state, &TickInput::default()).is_none());
        assert_eq!(state.enemies[0].pos, before);
        assert_eq!(state.time_ticks, 0);

        assert!(step(&mut state, &pause).is_some());
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let mut state = state();
        step(&mut state, &firing(PlayerId::One));
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.projectiles[0].owner, Owner::Player(PlayerId::One));
        assert!(state.projectiles[0].vel.y < 0.0);

        step(&mut state, &firing(PlayerId::One));
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.run.tally(PlayerId::One).bullets_shot, 1);
        assert_eq!(state.run.tally(PlayerId::Two).bullets_shot, 0);
    }

    #[test]
    fn test_triple_shot_and_bullet_speed() {
        let mut state = state();
        state.add_effect(PlayerId::Two, EffectKind::TripleShot, None, 5.0);
        state.add_effect(PlayerId::Two, EffectKind::BulletSpeedUp, Some(50), 5.0);
        step(&mut state, &firing(PlayerId::Two));

        assert_eq!(state.projectiles.len(), 3);
        let expected = state.tuning.bullet_speed * 1.5;
        for bullet in &state.projectiles {
            assert!((bullet.vel.length() - expected).abs() < 0.01);
        }
        assert_eq!(state.run.tally(PlayerId::Two).bullets_shot, 1);
    }

    #[test]
    fn test_skill_button_speeds_up_fire() {
        let mut plain = state();
        let mut boosted = state();
        let mut press = firing(PlayerId::One);
        press.players[PlayerId::One].skill = true;

        step(&mut plain, &firing(PlayerId::One));
        step(&mut boosted, &press);
        assert!(boosted.has_effect(PlayerId::One, EffectKind::RapidFire));
        assert_eq!(boosted.character(PlayerId::One).unwrap().mana, 70);
        assert!(boosted.events.contains(&GameEvent::Sound(SoundCue::Skill)));

        // Two thirds of the cooldown is enough at 1.5x
        let wait = plain.tuning.fire_cooldown_ms * 2 / 3;
        plain.clock().advance(wait);
        boosted.clock().advance(wait);
        step(&mut plain, &firing(PlayerId::One));
        step(&mut boosted, &firing(PlayerId::One));
        assert_eq!(plain.run.tally(PlayerId::One).bullets_shot, 1);
        assert_eq!(boosted.run.tally(PlayerId::One).bullets_shot, 2);
    }

    #[test]
    fn test_mana_regenerates_while_flying() {
        let mut state = state();
        assert!(state.use_skill(PlayerId::One));
        assert_eq!(state.character(PlayerId::One).unwrap().mana, 70);
        for _ in 0..120 {
            step(&mut state, &TickInput::default());
        }
        let mana = state.character(PlayerId::One).unwrap().mana;
        assert!((73..=75).contains(&mana), "mana {mana}");
    }

    #[test]
    fn test_time_slow_halves_enemy_speed() {
        let mut plain = state();
        let mut slowed = state();
        let start = Vec2::new(200.0, 100.0);
        plain.spawn_enemy(EnemyKind::Brawler, start);
        slowed.spawn_enemy(EnemyKind::Brawler, start);

        slowed.add_effect(PlayerId::Two, EffectKind::TimeSlow, Some(50), 5.0);
        assert_eq!(slowed.enemy_speed_multiplier(), 0.5);
        assert_eq!(plain.enemy_speed_multiplier(), 1.0);

        step(&mut plain, &TickInput::default());
        step(&mut slowed, &TickInput::default());
        let full = plain.enemies[0].pos.distance(start);
        let half = slowed.enemies[0].pos.distance(start);
        assert!(full > 0.0);
        assert!((half * 2.0 - full).abs() < 1e-3);
    }

    #[test]
    fn test_freeze_stops_enemies() {
        let mut state = state();
        let start = Vec2::new(200.0, 100.0);
        state.spawn_enemy(EnemyKind::Brawler, start);
        state.apply_global_freeze(1000);
        step(&mut state, &TickInput::default());
        assert_eq!(state.enemies[0].pos, start);
    }

    #[test]
    fn test_dash_fires_once_per_activation() {
        let mut state = state();
        let start = state.character(PlayerId::One).unwrap().pos;
        state.add_effect(PlayerId::One, EffectKind::Dash, Some(2), 1.0);

        step(&mut state, &TickInput::default());
        let dashed = state.character(PlayerId::One).unwrap().pos;
        let expected = state.tuning.dash_distance * 2.0;
        assert!((start.distance(dashed) - expected).abs() < 1e-3);

        step(&mut state, &TickInput::default());
        assert_eq!(state.character(PlayerId::One).unwrap().pos, dashed);
    }

    #[test]
    fn test_kill_target_clears_level() {
        let mut state = state();
        state.run.level_kills = state.kill_target();
        step(&mut state, &TickInput::default());

        assert_eq!(state.phase, GamePhase::LevelCleared);
        assert!(state.achievements.contains(&Achievement::Survivor));
        assert!(state.events.contains(&GameEvent::LevelEnded(LevelOutcome::Cleared)));
        assert!(step(&mut state, &TickInput::default()).is_none());

        state.advance_level();
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_out_of_lives_is_game_over() {
        let tuning = Tuning {
            mode: PlayMode::Solo,
            lives_per_player: 1,
            ..Tuning::default()
        };
        let mut state = GameState::new(3, tuning, Clock::manual());
        let pos = state.character(PlayerId::One).unwrap().pos;
        let shot = state.projectile_pool.acquire(ProjectileSpec {
            pos,
            size: Vec2::splat(6.0),
            vel: Vec2::ZERO,
            owner: Owner::Hostile,
            damage: 10,
        });
        state.projectiles.push(shot);

        let report = step(&mut state, &TickInput::default()).unwrap();
        assert_eq!(report.characters_hit, 1);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.events.contains(&GameEvent::Sound(SoundCue::GameOver)));
    }

    #[test]
    fn test_projectiles_leave_and_return_to_pool() {
        let mut state = state();
        step(&mut state, &firing(PlayerId::One));
        assert_eq!(state.projectiles.len(), 1);

        for _ in 0..120 {
            step(&mut state, &TickInput::default());
        }
        assert!(state.projectiles.is_empty());
        assert_eq!(state.projectile_pool.pooled(), 1);
    }

    #[test]
    fn test_use_item_from_slot() {
        let mut state = state();
        let db = ItemDb::builtin();
        state.assign_active_item(PlayerId::Two, db.get("TIME_FREEZE").unwrap());

        let mut input = TickInput::default();
        input.players[PlayerId::Two].use_item = true;
        step(&mut state, &input);
        assert!(state.enemies_frozen());
        assert!(state.active_item(PlayerId::Two).is_none());
    }

    #[test]
    fn test_determinism() {
        fn run(seed: u64) -> GameState {
            let mut state = GameState::new(seed, Tuning::default(), Clock::manual());
            let mut spawner = WaveSpawner::new(&mut state);
            let mut drops = TieredDrops::new(ItemDb::builtin(), 0.3, seed);

            for frame in 0..600u32 {
                let mut input = TickInput::default();
                for player in PlayerId::ALL {
                    input.players[player] = PlayerIntent {
                        move_dir: Vec2::new(((frame / 40) % 2) as f32 * 2.0 - 1.0, 0.0),
                        fire: true,
                        use_item: frame % 90 == 0,
                        skill: frame % 200 == 0,
                    };
                }
                state.clock().advance(FRAME_MS);
                let mut collab = Collaborators {
                    spawner: &mut spawner,
                    drops: &mut drops,
                };
                tick(&mut state, &input, SIM_DT, &mut collab);
            }
            state
        }

        let a = run(99999);
        let b = run(99999);
        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.phase, b.phase);
        assert_eq!(a.run.total_score(), b.run.total_score());
        assert_eq!(a.run.coins(), b.run.coins());
        let positions = |s: &GameState| s.enemies.iter().map(|e| (e.id, e.pos)).collect::<Vec<_>>();
        assert_eq!(positions(&a), positions(&b));
        assert_eq!(a.projectiles.len(), b.projectiles.len());
        assert_eq!(a.events, b.events);
    }
}
