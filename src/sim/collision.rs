//! Axis-aligned overlap tests
//!
//! Every hitbox in the game is an AABB described by its center and full
//! size. Overlap uses the center-distance form, which is symmetric and
//! counts coincident centers as a hit for any positive size.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH};

/// Axis-aligned bounding box (center + full size)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    pub fn half_extents(&self) -> Vec2 {
        self.size * 0.5
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents()
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents()
    }

    /// `|dx| < (wa + wb) / 2` and `|dy| < (ha + hb) / 2`
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let delta = (self.center - other.center).abs();
        let reach = (self.size + other.size) * 0.5;
        delta.x < reach.x && delta.y < reach.y
    }
}

/// Anything with a hitbox
pub trait Hitbox {
    fn aabb(&self) -> Aabb;
}

#[inline]
pub fn overlaps(a: &impl Hitbox, b: &impl Hitbox) -> bool {
    a.aabb().overlaps(&b.aabb())
}

/// True when the box is entirely outside the arena grown by `margin`
pub fn outside_arena(aabb: &Aabb, margin: f32) -> bool {
    let min = aabb.min();
    let max = aabb.max();
    max.x < -margin
        || max.y < -margin
        || min.x > ARENA_WIDTH + margin
        || min.y > ARENA_HEIGHT + margin
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_coincident_centers_overlap() {
        let a = Aabb::new(Vec2::new(50.0, 50.0), Vec2::new(1.0, 1.0));
        let b = Aabb::new(Vec2::new(50.0, 50.0), Vec2::new(0.5, 30.0));
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::new(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(!a.overlaps(&b));

        let c = Aabb::new(Vec2::new(9.9, 0.0), Vec2::new(10.0, 10.0));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_separated_on_one_axis() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::new(Vec2::new(2.0, 40.0), Vec2::new(10.0, 10.0));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_outside_arena() {
        let inside = Aabb::new(Vec2::new(100.0, 100.0), Vec2::splat(10.0));
        assert!(!outside_arena(&inside, 0.0));

        let above = Aabb::new(Vec2::new(100.0, -30.0), Vec2::splat(10.0));
        assert!(outside_arena(&above, 0.0));
        assert!(!outside_arena(&above, 40.0));

        let right = Aabb::new(Vec2::new(ARENA_WIDTH + 20.0, 10.0), Vec2::splat(10.0));
        assert!(outside_arena(&right, 0.0));
    }

    fn arb_aabb() -> impl Strategy<Value = Aabb> {
        (
            -500.0f32..500.0,
            -500.0f32..500.0,
            0.1f32..200.0,
            0.1f32..200.0,
        )
            .prop_map(|(x, y, w, h)| Aabb::new(Vec2::new(x, y), Vec2::new(w, h)))
    }

    proptest! {
        #[test]
        fn prop_overlap_is_symmetric(a in arb_aabb(), b in arb_aabb()) {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn prop_box_overlaps_itself(a in arb_aabb()) {
            prop_assert!(a.overlaps(&a));
        }
    }
}
