//! Inventory partitions and delta merging.
//!
//! The inventory is split into four partitions: item stacks, creatures,
//! eggs and the player stats record. A creature record lives in exactly one
//! of `pokemon` or `eggs`, and its id is unique across both.

use serde::{Deserialize, Serialize};

use crate::{CreatureId, ItemId, SpeciesId};

// ============================================================================
// Records
// ============================================================================

/// Count of one item kind held by the player.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemStack {
    pub item_id: ItemId,
    pub count: i32,
    pub unseen: bool,
}

/// A creature record. Eggs are creature records with `is_egg` set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Creature {
    pub id: CreatureId,
    pub pokemon_id: SpeciesId,
    pub cp: i32,
    pub is_egg: bool,
    pub egg_km_walked_target: f64,
    /// Id of the incubator holding this egg, empty when not incubating.
    pub egg_incubator_id: String,
}

/// Level and experience record carried in the inventory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub level: u32,
    pub experience: i64,
    pub next_level_xp: i64,
    pub km_walked: f64,
}

/// Incubator slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EggIncubator {
    pub id: String,
    pub item_id: ItemId,
    /// Remaining uses. Ignored for the unlimited incubator.
    pub uses_remaining: i32,
    /// Egg currently incubating, 0 when idle.
    pub pokemon_id: CreatureId,
    pub target_km_walked: f64,
}

/// Item id of the incubator that never runs out.
pub const UNLIMITED_INCUBATOR: ItemId = 901;

impl EggIncubator {
    /// True when the slot can take an egg right now.
    pub fn is_available(&self) -> bool {
        self.pokemon_id == 0 && (self.item_id == UNLIMITED_INCUBATOR || self.uses_remaining > 0)
    }
}

/// An item award from a stop spin or level-up reward.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemAward {
    pub item_id: ItemId,
    pub item_count: i32,
}

/// A combined inventory list already split by record type.
///
/// `pokemon` still mixes creatures and eggs; routing happens on merge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InventorySplit {
    pub items: Vec<ItemStack>,
    pub pokemon: Vec<Creature>,
    pub player: Option<PlayerStats>,
    pub incubators: Option<Vec<EggIncubator>>,
}

impl InventorySplit {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
            && self.pokemon.is_empty()
            && self.player.is_none()
            && self.incubators.is_none()
    }
}

// ============================================================================
// Inventory
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    pub items: Vec<ItemStack>,
    pub pokemon: Vec<Creature>,
    pub eggs: Vec<Creature>,
    pub player: Option<PlayerStats>,
    pub incubators: Vec<EggIncubator>,
}

impl Inventory {
    /// Build the inventory from the first full listing.
    pub fn bootstrap(split: InventorySplit) -> Self {
        let mut inventory = Self {
            items: split.items,
            player: split.player,
            incubators: split.incubators.unwrap_or_default(),
            ..Default::default()
        };
        for creature in split.pokemon {
            inventory.upsert_creature(creature);
        }

        debug_assert!(inventory.is_partitioned());
        inventory
    }

    /// Merge a non-empty delta.
    ///
    /// Item stacks are updated in place or appended. Creature records replace
    /// any record with the same id and are routed by their egg flag.
    pub fn apply_delta(&mut self, split: InventorySplit) {
        if let Some(player) = split.player {
            self.player = Some(player);
        }
        if let Some(incubators) = split.incubators {
            self.incubators = incubators;
        }

        for stack in split.items {
            match self.items.iter_mut().find(|i| i.item_id == stack.item_id) {
                Some(existing) => {
                    existing.count = stack.count;
                    existing.unseen = stack.unseen;
                }
                None => self.items.push(stack),
            }
        }

        for creature in split.pokemon {
            self.upsert_creature(creature);
        }

        debug_assert!(self.is_partitioned());
    }

    /// Add awarded counts to stacks already tracked. Unknown ids are ignored.
    ///
    /// This increments; applying the same award twice counts it twice.
    pub fn award_items(&mut self, awards: &[ItemAward]) {
        for award in awards {
            if let Some(stack) = self.items.iter_mut().find(|i| i.item_id == award.item_id) {
                stack.count = stack.count.saturating_add(award.item_count);
            }
        }
    }

    /// Track an egg handed out by a stop spin.
    pub fn add_egg(&mut self, mut egg: Creature) {
        egg.is_egg = true;
        self.upsert_creature(egg);
    }

    /// Count held for an item, 0 when untracked.
    pub fn item_count(&self, item_id: ItemId) -> i32 {
        self.items
            .iter()
            .find(|i| i.item_id == item_id)
            .map_or(0, |i| i.count)
    }

    /// Find a creature or egg by id.
    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.pokemon.iter().chain(self.eggs.iter()).find(|c| c.id == id)
    }

    /// Check the partition invariant: no id in both partitions, no duplicates,
    /// and every record sits in the partition its egg flag names.
    pub fn is_partitioned(&self) -> bool {
        let mut ids: Vec<CreatureId> = self
            .pokemon
            .iter()
            .chain(self.eggs.iter())
            .map(|c| c.id)
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();

        ids.len() == total
            && self.pokemon.iter().all(|c| !c.is_egg)
            && self.eggs.iter().all(|c| c.is_egg)
    }

    /// Remove-then-append into the partition named by the egg flag.
    fn upsert_creature(&mut self, creature: Creature) {
        self.pokemon.retain(|c| c.id != creature.id);
        self.eggs.retain(|c| c.id != creature.id);
        if creature.is_egg {
            self.eggs.push(creature);
        } else {
            self.pokemon.push(creature);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
