//! Level and run bookkeeping
//!
//! Lives, score, coins and per-player tallies for one run. In co-op the
//! players draw from one capped pool; otherwise each player has a counter.

use serde::{Deserialize, Serialize};

use super::player::{PerPlayer, PlayerId};
use crate::consts::{LIFE_SCORE, NUM_PLAYERS};

/// How a run is played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayMode {
    /// Player one alone
    Solo,
    /// Two players sharing one life pool
    #[default]
    CoopShared,
    /// Two players, each with their own lives
    CoopSeparate,
}

impl PlayMode {
    pub fn is_coop(self) -> bool {
        !matches!(self, PlayMode::Solo)
    }
}

/// Life representation; fixed for the lifetime of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lives {
    Shared { pool: u32, cap: u32 },
    Separate { lives: PerPlayer<u32>, cap: u32 },
}

/// Per-player tallies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerTally {
    pub score: u64,
    pub bullets_shot: u32,
    pub ships_destroyed: u32,
}

/// Totals handed to persistence once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: PlayMode,
    pub level: u32,
    pub score: u64,
    pub coins: u32,
    pub lives_remaining: u32,
    pub players: PerPlayer<PlayerTally>,
}

impl RunSummary {
    pub fn bullets_shot(&self) -> u32 {
        self.players
            .values()
            .fold(0u32, |total, t| total.saturating_add(t.bullets_shot))
    }

    pub fn ships_destroyed(&self) -> u32 {
        self.players
            .values()
            .fold(0u32, |total, t| total.saturating_add(t.ships_destroyed))
    }

    /// Hits per shot, 0.0 when nothing was fired
    pub fn accuracy(&self) -> f32 {
        let shots = self.bullets_shot();
        if shots == 0 {
            0.0
        } else {
            self.ships_destroyed() as f32 / shots as f32
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub mode: PlayMode,
    pub level: u32,
    lives: Lives,
    tallies: PerPlayer<PlayerTally>,
    coins: u32,
    /// Kills counted toward this level's target
    pub level_kills: u32,
    /// Any character lost a life this level
    pub took_damage: bool,
}

impl RunState {
    pub fn new(mode: PlayMode, lives_per_player: u32, coins: u32) -> Self {
        let lives = match mode {
            PlayMode::CoopShared => {
                let pool = lives_per_player.saturating_mul(NUM_PLAYERS as u32);
                Lives::Shared { pool, cap: pool }
            }
            PlayMode::CoopSeparate => Lives::Separate {
                lives: PerPlayer::splat(lives_per_player),
                cap: lives_per_player,
            },
            PlayMode::Solo => Lives::Separate {
                lives: PerPlayer::from_fn(|p| if p == PlayerId::One { lives_per_player } else { 0 }),
                cap: lives_per_player,
            },
        };
        Self {
            mode,
            level: 1,
            lives,
            tallies: PerPlayer::default(),
            coins,
            level_kills: 0,
            took_damage: false,
        }
    }

    pub fn lives(&self) -> Lives {
        self.lives
    }

    pub fn is_shared(&self) -> bool {
        matches!(self.lives, Lives::Shared { .. })
    }

    /// Whether `player` takes part in this run at all
    pub fn is_playing(&self, player: PlayerId) -> bool {
        self.mode.is_coop() || player == PlayerId::One
    }

    pub fn dec_life(&mut self, player: PlayerId) {
        match &mut self.lives {
            Lives::Shared { pool, .. } => *pool = pool.saturating_sub(1),
            Lives::Separate { lives, .. } => lives[player] = lives[player].saturating_sub(1),
        }
    }

    /// Add lives, clamped to the mode's cap
    pub fn add_life(&mut self, player: PlayerId, n: u32) {
        if let Lives::Separate { lives, cap } = &mut self.lives {
            lives[player] = lives[player].saturating_add(n).min(*cap);
        } else {
            self.add_team_life(n);
        }
    }

    /// Add to the shared pool; ignored outside shared mode
    pub fn add_team_life(&mut self, n: u32) {
        if let Lives::Shared { pool, cap } = &mut self.lives {
            *pool = pool.saturating_add(n).min(*cap);
        }
    }

    /// Whether adding `n` lives for `player` would go past the cap
    pub fn would_exceed_cap(&self, player: PlayerId, n: u32) -> bool {
        match self.lives {
            Lives::Shared { pool, cap } => pool.saturating_add(n) > cap,
            Lives::Separate { lives, cap } => lives[player].saturating_add(n) > cap,
        }
    }

    /// Lives `player` can still draw on
    pub fn lives_for(&self, player: PlayerId) -> u32 {
        match self.lives {
            Lives::Shared { pool, .. } => pool,
            Lives::Separate { lives, .. } => lives[player],
        }
    }

    pub fn lives_remaining(&self) -> u32 {
        match self.lives {
            Lives::Shared { pool, .. } => pool,
            Lives::Separate { lives, .. } => {
                lives.values().fold(0u32, |total, n| total.saturating_add(*n))
            }
        }
    }

    pub fn team_alive(&self) -> bool {
        match self.lives {
            Lives::Shared { pool, .. } => pool > 0,
            Lives::Separate { lives, .. } => lives.values().any(|&n| n > 0),
        }
    }

    /// Advance the level counter and reset per-level bookkeeping
    pub fn next_level(&mut self) {
        self.level += 1;
        self.level_kills = 0;
        self.took_damage = false;
    }

    /// Add score scaled by `multiplier` (the player's score boost, if any)
    pub fn add_score(&mut self, player: PlayerId, delta: u64, multiplier: Option<i32>) -> u64 {
        let gained = match multiplier {
            Some(m) if m > 0 => delta.saturating_mul(m as u64),
            _ => delta,
        };
        self.tallies[player].score = self.tallies[player].score.saturating_add(gained);
        gained
    }

    pub fn inc_bullets_shot(&mut self, player: PlayerId) {
        self.tallies[player].bullets_shot = self.tallies[player].bullets_shot.saturating_add(1);
    }

    pub fn inc_ships_destroyed(&mut self, player: PlayerId) {
        let tally = &mut self.tallies[player];
        tally.ships_destroyed = tally.ships_destroyed.saturating_add(1);
        self.level_kills = self.level_kills.saturating_add(1);
    }

    pub fn tally(&self, player: PlayerId) -> PlayerTally {
        self.tallies[player]
    }

    pub fn score(&self, player: PlayerId) -> u64 {
        self.tallies[player].score
    }

    /// Volleys fired by both players
    pub fn bullets_shot(&self) -> u32 {
        self.tallies
            .values()
            .fold(0u32, |total, t| total.saturating_add(t.bullets_shot))
    }

    /// Kills by both players over the whole run
    pub fn ships_destroyed(&self) -> u32 {
        self.tallies
            .values()
            .fold(0u32, |total, t| total.saturating_add(t.ships_destroyed))
    }

    pub fn total_score(&self) -> u64 {
        self.tallies
            .values()
            .fold(0u64, |total, t| total.saturating_add(t.score))
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn add_coins(&mut self, delta: u32) {
        self.coins = self.coins.saturating_add(delta);
    }

    /// Returns false (and spends nothing) when the purse is short
    pub fn spend_coins(&mut self, amount: u32) -> bool {
        if self.coins < amount {
            return false;
        }
        self.coins -= amount;
        true
    }

    /// Credit the remaining-lives bonus to player one and build the summary
    pub fn finish(&mut self) -> RunSummary {
        let bonus = LIFE_SCORE.saturating_mul(u64::from(self.lives_remaining()));
        let first = &mut self.tallies[PlayerId::One];
        first.score = first.score.saturating_add(bonus);
        log::info!(
            "Run finished at level {} with {} lives left (+{} bonus)",
            self.level,
            self.lives_remaining(),
            bonus
        );
        RunSummary {
            mode: self.mode,
            level: self.level,
            score: self.total_score(),
            coins: self.coins,
            lives_remaining: self.lives_remaining(),
            players: self.tallies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_life_cap() {
        let mut run = RunState::new(PlayMode::CoopShared, 3, 0);
        assert_eq!(run.lives_remaining(), 6);
        run.add_team_life(100);
        assert_eq!(run.lives_remaining(), 6);

        run.dec_life(PlayerId::Two);
        run.add_life(PlayerId::One, 100);
        assert_eq!(run.lives(), Lives::Shared { pool: 6, cap: 6 });
    }

    #[test]
    fn test_huge_life_count_saturates() {
        let run = RunState::new(PlayMode::CoopShared, u32::MAX, 0);
        assert_eq!(run.lives(), Lives::Shared { pool: u32::MAX, cap: u32::MAX });

        let mut run = RunState::new(PlayMode::CoopSeparate, u32::MAX, 0);
        run.add_score(PlayerId::One, u64::MAX, None);
        run.add_score(PlayerId::Two, u64::MAX, None);
        assert_eq!(run.total_score(), u64::MAX);
        assert_eq!(run.finish().score, u64::MAX);
    }

    #[test]
    fn test_shared_pool_drains_from_either_player() {
        let mut run = RunState::new(PlayMode::CoopShared, 1, 0);
        run.dec_life(PlayerId::One);
        assert!(run.team_alive());
        run.dec_life(PlayerId::Two);
        assert!(!run.team_alive());
        run.dec_life(PlayerId::Two);
        assert_eq!(run.lives_remaining(), 0);
    }

    #[test]
    fn test_separate_lives() {
        let mut run = RunState::new(PlayMode::CoopSeparate, 2, 0);
        run.add_team_life(5);
        assert_eq!(run.lives_remaining(), 4);

        run.dec_life(PlayerId::One);
        run.dec_life(PlayerId::One);
        run.dec_life(PlayerId::One);
        assert_eq!(run.lives_for(PlayerId::One), 0);
        assert!(run.team_alive());

        run.add_life(PlayerId::Two, 10);
        assert_eq!(run.lives_for(PlayerId::Two), 2);
        assert!(run.would_exceed_cap(PlayerId::Two, 1));
        assert!(!run.would_exceed_cap(PlayerId::One, 2));
    }

    #[test]
    fn test_solo_only_player_one() {
        let run = RunState::new(PlayMode::Solo, 3, 0);
        assert_eq!(run.lives_for(PlayerId::One), 3);
        assert_eq!(run.lives_for(PlayerId::Two), 0);
        assert!(!run.is_playing(PlayerId::Two));
    }

    #[test]
    fn test_score_boost_multiplies() {
        let mut run = RunState::new(PlayMode::CoopShared, 3, 0);
        assert_eq!(run.add_score(PlayerId::One, 10, None), 10);
        assert_eq!(run.add_score(PlayerId::One, 10, Some(3)), 30);
        assert_eq!(run.score(PlayerId::One), 40);
        assert_eq!(run.score(PlayerId::Two), 0);
    }

    #[test]
    fn test_coins() {
        let mut run = RunState::new(PlayMode::CoopShared, 3, 10);
        assert!(!run.spend_coins(11));
        assert_eq!(run.coins(), 10);
        run.add_coins(5);
        assert!(run.spend_coins(15));
        assert_eq!(run.coins(), 0);
    }

    #[test]
    fn test_next_level_resets_level_flags() {
        let mut run = RunState::new(PlayMode::CoopShared, 3, 0);
        run.inc_ships_destroyed(PlayerId::One);
        run.took_damage = true;
        run.next_level();
        assert_eq!(run.level, 2);
        assert_eq!(run.level_kills, 0);
        assert!(!run.took_damage);
        assert_eq!(run.tally(PlayerId::One).ships_destroyed, 1);
    }

    #[test]
    fn test_finish_awards_life_bonus() {
        let mut run = RunState::new(PlayMode::CoopShared, 2, 7);
        run.add_score(PlayerId::Two, 300, None);
        run.inc_bullets_shot(PlayerId::One);
        run.inc_bullets_shot(PlayerId::One);
        run.inc_ships_destroyed(PlayerId::One);
        let summary = run.finish();
        assert_eq!(summary.lives_remaining, 4);
        assert_eq!(summary.score, 300 + 4 * LIFE_SCORE);
        assert_eq!(summary.players[PlayerId::One].score, 4 * LIFE_SCORE);
        assert_eq!(summary.coins, 7);
        assert!((summary.accuracy() - 0.5).abs() < 1e-6);
    }
}
