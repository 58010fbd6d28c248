//! Deterministic simulation module
//!
//! All gameplay logic lives here. Given the same seed, tuning, inputs and
//! clock readings, a run plays out identically:
//! - Fixed timestep for motion, clock-driven timers for everything else
//! - Seeded RNG only
//! - Stable iteration order (players by id, enemies by spawn order)
//! - No rendering or platform dependencies

pub mod ai;
pub mod class;
pub mod collision;
pub mod combat;
pub mod effects;
pub mod entities;
pub mod inventory;
pub mod item_effect;
pub mod items;
pub mod pickup;
pub mod player;
pub mod pool;
pub mod projectile;
pub mod run;
pub mod skill;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod timer;

pub use class::{CharacterClass, ClassStats};
pub use collision::{Aabb, Hitbox, overlaps};
pub use combat::CombatReport;
pub use effects::{EffectKind, EffectLedger};
pub use entities::{BonusEnemy, Boss, Character, Destructible, Enemy, EnemyKind, ItemDrop, Pet};
pub use inventory::{ActiveItem, Charges, Inventory};
pub use items::{ActivationType, DropTier, ItemDb, ItemDef, ItemKind};
pub use player::{PerPlayer, PlayerId};
pub use projectile::{Owner, Projectile, ProjectileId, ProjectilePool, ProjectileSpec};
pub use run::{Lives, PlayMode, PlayerTally, RunState, RunSummary};
pub use skill::{Skill, SkillKind};
pub use spawn::{DropSource, NoDrops, NoSpawns, Spawner, TieredDrops, WaveSpawner};
pub use state::{Achievement, GameEvent, GamePhase, GameState, LevelOutcome};
pub use tick::{Collaborators, PlayerIntent, TickInput, tick};
pub use timer::{Clock, Timer, TimerFactory};
