//! Typed payload shapes, one per response kind.
//!
//! Every struct uses `#[serde(default)]`: the transport decodes messages with
//! default values filled in, and a missing field must never abort a batch.

use roamer_state::{
    CatchableCreature, Creature, CreatureId, DownloadSettings, EggIncubator, Fort, InventorySplit,
    ItemAward, ItemStack, MapSnapshot, NearbyCreature, PlayerProfile, PlayerStats, TimestampMs,
    WildCreature,
};
use serde::Deserialize;
use serde_json::Value;

// ============================================================================
// Handshake / Companion Payloads
// ============================================================================

/// Player call. The ban flags sit next to the profile, not inside it.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PlayerDataPayload {
    pub success: bool,
    pub player_data: PlayerProfile,
    pub banned: bool,
    pub warn: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct HatchedEggsPayload {
    pub success: bool,
    pub pokemon_id: Vec<CreatureId>,
    pub experience_awarded: Vec<i64>,
    pub candy_awarded: Vec<i32>,
    pub stardust_awarded: Vec<i32>,
    pub egg_km_walked: Vec<f64>,
}

impl HatchedEggsPayload {
    pub fn has_rewards(&self) -> bool {
        !(self.pokemon_id.is_empty()
            && self.experience_awarded.is_empty()
            && self.candy_awarded.is_empty()
            && self.stardust_awarded.is_empty()
            && self.egg_km_walked.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct InventoryDeltaPayload {
    pub success: bool,
    pub inventory_delta: InventoryDelta,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct InventoryDelta {
    pub original_timestamp_ms: TimestampMs,
    pub new_timestamp_ms: TimestampMs,
    pub inventory_items: Vec<InventoryItem>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct InventoryItem {
    pub modified_timestamp_ms: TimestampMs,
    pub inventory_item_data: InventoryItemData,
}

/// One entry of the combined inventory list. At most one field is set.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct InventoryItemData {
    pub pokemon_data: Option<Creature>,
    pub item: Option<ItemStack>,
    pub player_stats: Option<PlayerStats>,
    pub egg_incubators: Option<EggIncubators>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct EggIncubators {
    pub egg_incubator: Vec<EggIncubator>,
}

impl InventoryDelta {
    pub fn is_empty(&self) -> bool {
        self.inventory_items.is_empty()
    }

    /// Split the combined list by record type, keeping list order.
    pub fn into_split(self) -> InventorySplit {
        let mut split = InventorySplit::default();
        for entry in self.inventory_items {
            let data = entry.inventory_item_data;
            if let Some(creature) = data.pokemon_data {
                split.pokemon.push(creature);
            }
            if let Some(item) = data.item {
                split.items.push(item);
            }
            if let Some(stats) = data.player_stats {
                split.player = Some(stats);
            }
            if let Some(incubators) = data.egg_incubators {
                split
                    .incubators
                    .get_or_insert_with(Vec::new)
                    .extend(incubators.egg_incubator);
            }
        }
        split
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AwardedBadgesPayload {
    pub success: bool,
    pub awarded_badges: Vec<i32>,
    pub awarded_badge_levels: Vec<i32>,
}

impl AwardedBadgesPayload {
    pub fn is_empty(&self) -> bool {
        self.awarded_badges.is_empty() && self.awarded_badge_levels.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DownloadSettingsPayload {
    pub hash: String,
    pub settings: Option<DownloadSettings>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct RemoteConfigVersionPayload {
    pub result: i32,
    pub item_templates_timestamp_ms: TimestampMs,
    pub asset_digest_timestamp_ms: TimestampMs,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct CheckChallengePayload {
    pub show_challenge: bool,
    pub challenge_url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AssetDigestPayload {
    pub digest: Vec<Value>,
    pub timestamp_ms: TimestampMs,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ItemTemplatesPayload {
    pub success: bool,
    pub item_templates: Vec<Value>,
    pub timestamp_ms: TimestampMs,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct BuddyWalkedPayload {
    pub success: bool,
    pub family_candy_id: i32,
    pub candy_earned_count: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PlayerProfilePayload {
    pub result: i32,
    pub start_time: TimestampMs,
    pub badges: Vec<Value>,
}

// ============================================================================
// Action Payloads
// ============================================================================

/// Stop spin.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct FortSearchPayload {
    pub result: i32,
    pub items_awarded: Vec<ItemAward>,
    pub gems_awarded: i32,
    pub pokemon_data_egg: Option<Creature>,
    pub experience_awarded: i64,
    pub cooldown_complete_timestamp_ms: TimestampMs,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct LevelUpRewardsPayload {
    pub result: i32,
    pub items_awarded: Vec<ItemAward>,
    pub items_unlocked: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct VerifyChallengePayload {
    pub success: bool,
}

/// Result-code-only reply (evolve, release, incubator).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ActionResultPayload {
    pub result: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct RecycleItemPayload {
    pub result: i32,
    pub new_count: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct EncounterPayload {
    pub status: i32,
    pub wild_pokemon: Option<WildCreature>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct CatchCreaturePayload {
    pub status: i32,
    pub captured_pokemon_id: CreatureId,
}

// ============================================================================
// Map Payload
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct MapObjectsPayload {
    pub status: i32,
    pub map_cells: Vec<MapCell>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct MapCell {
    pub s2_cell_id: u64,
    pub forts: Vec<Fort>,
    pub wild_pokemons: Vec<WildCreature>,
    pub catchable_pokemons: Vec<CatchableCreature>,
    pub nearby_pokemons: Vec<NearbyCreature>,
}

impl MapObjectsPayload {
    /// Flatten every cell into one snapshot.
    pub fn into_snapshot(self) -> MapSnapshot {
        let mut forts = Vec::new();
        let mut wild = Vec::new();
        let mut catchable = Vec::new();
        let mut nearby = Vec::new();

        for cell in self.map_cells {
            forts.extend(cell.forts);
            wild.extend(cell.wild_pokemons);
            catchable.extend(cell.catchable_pokemons);
            nearby.extend(cell.nearby_pokemons);
        }

        MapSnapshot::new(forts, wild, catchable, nearby)
    }
}
