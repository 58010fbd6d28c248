//! Per-player item slots
//!
//! A player holds at most one key-triggered item plus an ordered list of
//! passive items. Assigning a new active item discards the old one.

use std::rc::Rc;

use super::items::ItemDef;
use super::timer::{Timer, TimerFactory};
use crate::secs_to_ms;

/// Uses left on an active item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charges {
    Infinite,
    Finite(u32),
}

impl Charges {
    fn for_def(def: &ItemDef) -> Self {
        if def.max_charges <= 0 {
            Charges::Infinite
        } else {
            Charges::Finite(def.max_charges as u32)
        }
    }
}

/// The held key-triggered item
#[derive(Debug, Clone)]
pub struct ActiveItem {
    pub def: Rc<ItemDef>,
    pub charges: Charges,
    cooldown: Option<Timer>,
}

impl ActiveItem {
    pub fn on_cooldown(&self) -> bool {
        self.cooldown.as_ref().is_some_and(|t| !t.check_finished())
    }

    pub fn cooldown_remaining_ms(&self) -> u64 {
        self.cooldown.as_ref().map(Timer::remaining).unwrap_or(0)
    }
}

/// What happened to the slot after a successful use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAfterUse {
    /// Last charge spent, slot emptied
    Emptied,
    /// Charges remain, cooldown restarted
    CoolingDown,
}

#[derive(Debug, Clone)]
pub struct Inventory {
    active: Option<ActiveItem>,
    passives: Vec<Rc<ItemDef>>,
    timers: TimerFactory,
}

impl Inventory {
    pub fn new(timers: TimerFactory) -> Self {
        Self {
            active: None,
            passives: Vec::new(),
            timers,
        }
    }

    /// Put an item in the active slot, replacing whatever was there
    pub fn assign(&mut self, def: Rc<ItemDef>) {
        if let Some(old) = &self.active {
            log::debug!("active item {} replaced by {}", old.def.id, def.id);
        }
        self.active = Some(ActiveItem {
            charges: Charges::for_def(&def),
            def,
            cooldown: None,
        });
    }

    pub fn active(&self) -> Option<&ActiveItem> {
        self.active.as_ref()
    }

    pub fn active_def(&self) -> Option<Rc<ItemDef>> {
        self.active.as_ref().map(|item| Rc::clone(&item.def))
    }

    /// The held item if it exists and is off cooldown
    pub fn ready(&self) -> Option<Rc<ItemDef>> {
        self.active
            .as_ref()
            .filter(|item| !item.on_cooldown())
            .map(|item| Rc::clone(&item.def))
    }

    /// Spend one charge after the item's effect was applied
    pub fn consume_charge(&mut self) -> Option<SlotAfterUse> {
        let item = self.active.as_mut()?;
        if let Charges::Finite(n) = &mut item.charges {
            *n = n.saturating_sub(1);
            if *n == 0 {
                log::debug!("active item {} used up", item.def.id);
                self.active = None;
                return Some(SlotAfterUse::Emptied);
            }
        }

        let ms = secs_to_ms(item.def.cooldown_secs);
        item.cooldown = if ms > 0 {
            Some(self.timers.started(ms))
        } else {
            None
        };
        Some(SlotAfterUse::CoolingDown)
    }

    /// Drop finished cooldown timers
    pub fn update_cooldowns(&mut self) {
        if let Some(item) = &mut self.active {
            if item.cooldown.as_ref().is_some_and(Timer::check_finished) {
                item.cooldown = None;
            }
        }
    }

    pub fn add_passive(&mut self, def: Rc<ItemDef>) {
        self.passives.push(def);
    }

    pub fn passives(&self) -> &[Rc<ItemDef>] {
        &self.passives
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.passives.clear();
    }
}
