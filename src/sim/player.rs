//! Player identity and fixed-size per-player storage

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::consts::NUM_PLAYERS;

/// One of the two local players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; NUM_PLAYERS] = [PlayerId::One, PlayerId::Two];

    /// Zero-based slot index
    pub fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }

    /// One-based number shown to players and used in logs
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Exactly one value per player, indexed by [`PlayerId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerPlayer<T>([T; NUM_PLAYERS]);

impl<T> PerPlayer<T> {
    pub fn from_fn(mut f: impl FnMut(PlayerId) -> T) -> Self {
        Self(std::array::from_fn(|i| f(PlayerId::ALL[i])))
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        PlayerId::ALL.into_iter().zip(self.0.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut T)> {
        PlayerId::ALL.into_iter().zip(self.0.iter_mut())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: Clone> PerPlayer<T> {
    pub fn splat(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl<T> Index<PlayerId> for PerPlayer<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &T {
        &self.0[player.index()]
    }
}

impl<T> IndexMut<PlayerId> for PerPlayer<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.0[player.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexing() {
        let mut scores = PerPlayer::splat(0u64);
        scores[PlayerId::Two] += 5;
        assert_eq!(scores[PlayerId::One], 0);
        assert_eq!(scores[PlayerId::Two], 5);
        assert_eq!(scores.values().sum::<u64>(), 5);
    }

    #[test]
    fn test_player_numbers() {
        assert_eq!(PlayerId::One.number(), 1);
        assert_eq!(PlayerId::Two.number(), 2);
        assert_eq!(PlayerId::from_index(1), Some(PlayerId::Two));
        assert_eq!(PlayerId::from_index(2), None);
    }
}
