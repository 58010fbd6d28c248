//! Item pickup resolution

use std::rc::Rc;

use super::collision::overlaps;
use super::item_effect;
use super::items::{ActivationType, ItemDef};
use super::player::PlayerId;
use super::state::{GameEvent, GameState};
use crate::audio::SoundCue;

/// Where a collected item ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Effect applied on the spot
    Applied,
    /// Put in the active slot for later use
    Held,
    /// Added to the passive list
    Passive,
}

fn delivery_for(def: &ItemDef) -> Delivery {
    match def.activation {
        ActivationType::Passive => Delivery::Passive,
        ActivationType::ActiveOnKey => Delivery::Held,
        ActivationType::InstantOnPickup | ActivationType::TemporaryBuff => {
            if def.auto_use {
                Delivery::Applied
            } else {
                Delivery::Held
            }
        }
    }
}

/// Hand `def` to `player` according to its activation policy
pub fn deliver(state: &mut GameState, player: PlayerId, def: Rc<ItemDef>) -> Delivery {
    let delivery = delivery_for(&def);
    match delivery {
        Delivery::Applied => {
            // The drop is consumed either way
            if !item_effect::apply(state, player, &def) {
                log::debug!(
                    "Player {} picked up {} with no effect",
                    player.number(),
                    def.id
                );
            }
        }
        Delivery::Held => state.assign_active_item(player, def),
        Delivery::Passive => state.add_passive_item(player, def),
    }
    delivery
}

/// Collect every drop touching a living character. Each drop goes to the
/// first character (in player order) that overlaps it. Returns how many
/// were collected.
pub fn resolve(state: &mut GameState) -> usize {
    let mut collected = Vec::new();
    for item in &state.items {
        let picker = state
            .characters
            .iter()
            .filter(|c| c.is_alive())
            .find(|c| overlaps(item, *c))
            .map(|c| c.player);
        if let Some(player) = picker {
            collected.push((item.id, player, Rc::clone(&item.def)));
        }
    }
    if collected.is_empty() {
        return 0;
    }

    for (_, player, def) in &collected {
        let delivery = deliver(state, *player, Rc::clone(def));
        log::debug!(
            "Player {} picked up {} ({delivery:?})",
            player.number(),
            def.id
        );
        state.emit(GameEvent::Sound(SoundCue::Pickup));
        state.emit(GameEvent::ItemCollected {
            player: *player,
            item: def.id.clone(),
        });
    }

    state.reclaim_items(|item| collected.iter().any(|(id, _, _)| *id == item.id))
}
