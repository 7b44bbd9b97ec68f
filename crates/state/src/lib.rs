//! Roamer Session State
//!
//! This crate holds the single mutable aggregate that every other part of the
//! agent reads and writes: position, player profile, inventory, the last map
//! snapshot, protocol bookkeeping and the pending action queue.
//!
//! # Architecture Constraints
//!
//! The state crate MUST NOT:
//! - Perform I/O operations (file, network, etc.)
//! - Talk to the remote service
//! - Own any lifecycle beyond construction
//!
//! Responses are folded in by the reconciler in `roamer-agent`; snapshots are
//! written by `roamer-journal`.

#![deny(unsafe_code)]

pub mod inventory;
pub mod map;

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use inventory::{
    Creature, EggIncubator, Inventory, InventorySplit, ItemAward, ItemStack, PlayerStats,
};
pub use map::{
    CatchableCreature, CreatureData, Fort, FortKind, MapSnapshot, NearbyCreature, WildCreature,
};

// ============================================================================
// Type Aliases
// ============================================================================

/// Item identifier (poke ball, potion, incubator, ...).
pub type ItemId = i32;

/// Unique identifier of a creature record (caught creature or egg).
pub type CreatureId = u64;

/// Species number of a creature.
pub type SpeciesId = i32;

/// Server timestamp in milliseconds since the Unix epoch.
pub type TimestampMs = i64;

/// Mean Earth radius used for great-circle distances.
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

// ============================================================================
// Position
// ============================================================================

/// A point on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub altitude: f64,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            altitude: 0.0,
        }
    }

    /// Great-circle (haversine) distance in meters. Altitude is ignored.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

// ============================================================================
// Player Profile
// ============================================================================

/// Currency balance carried by the player record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Currency {
    pub name: String,
    pub amount: i64,
}

/// Player profile as returned by the player call, plus the ban flags that
/// travel next to it in the response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProfile {
    pub username: String,
    pub team: i32,
    pub experience: i64,
    pub level: u32,
    pub currencies: Vec<Currency>,
    pub tutorial_state: Vec<i32>,
    /// Set from the response envelope. A true value halts all protocol activity.
    pub banned: bool,
    pub warn: bool,
}

// ============================================================================
// Server Settings
// ============================================================================

/// Map refresh tunables advertised by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub get_map_objects_min_refresh_seconds: f64,
    pub get_map_objects_max_refresh_seconds: f64,
    pub get_map_objects_min_distance_meters: f64,
    pub google_maps_api_key: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            get_map_objects_min_refresh_seconds: 10.0,
            get_map_objects_max_refresh_seconds: 30.0,
            get_map_objects_min_distance_meters: 10.0,
            google_maps_api_key: String::new(),
        }
    }
}

/// Server-supplied settings from the settings call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    pub minimum_client_version: String,
    pub map_settings: MapSettings,
}

// ============================================================================
// Protocol Bookkeeping
// ============================================================================

/// Watermarks, hashes and refresh markers echoed back to the server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiState {
    /// Last applied inventory delta watermark. Never decreases.
    pub inventory_timestamp: TimestampMs,
    /// Opaque settings token, echoed on the next settings request.
    pub settings_hash: Option<String>,
    pub item_templates_timestamp: TimestampMs,
    /// When the last map fetch was issued.
    pub last_gmo: Option<DateTime<Utc>>,
    /// Where the last map fetch was issued.
    pub last_pos: Option<Position>,
    pub map_provider_key: Option<String>,
    /// Bulk reference data, excluded from persisted snapshots.
    pub item_templates: Vec<serde_json::Value>,
    /// Bulk reference data, excluded from persisted snapshots.
    pub asset_digest: Vec<serde_json::Value>,
}

impl ApiState {
    /// Advance the inventory watermark. Returns false if `reported` would move
    /// it backwards, in which case nothing changes.
    pub fn advance_inventory_timestamp(&mut self, reported: TimestampMs) -> bool {
        if reported < self.inventory_timestamp {
            return false;
        }
        self.inventory_timestamp = reported;
        true
    }
}

// ============================================================================
// Pending Actions
// ============================================================================

/// User-requested action, consumed one per position update cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum TodoAction {
    LevelUp,
    #[serde(rename = "release_pokemon")]
    ReleaseCreatures { ids: Vec<CreatureId> },
    #[serde(rename = "evolve_pokemon")]
    EvolveCreature { id: CreatureId },
    #[serde(rename = "drop_items")]
    RecycleItems { item_id: ItemId, count: i32 },
}

impl TodoAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LevelUp => "level_up",
            Self::ReleaseCreatures { .. } => "release_pokemon",
            Self::EvolveCreature { .. } => "evolve_pokemon",
            Self::RecycleItems { .. } => "drop_items",
        }
    }
}

/// Walking path bookkeeping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathState {
    pub visited_stops: Vec<String>,
    pub waypoints: Vec<Position>,
}

// ============================================================================
// Session State
// ============================================================================

/// The session aggregate.
///
/// Created empty at start-up and populated as responses arrive. There are no
/// transactional boundaries: every mutation is visible to the next read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub position: Position,
    pub player: PlayerProfile,
    /// `None` until the first inventory payload bootstraps it.
    pub inventory: Option<Inventory>,
    pub api: ApiState,
    /// Last fetched map, replaced wholesale on each refresh.
    pub map: Option<MapSnapshot>,
    pub download_settings: Option<DownloadSettings>,
    pub todo: VecDeque<TodoAction>,
    pub path: PathState,
    /// Encounter ids already attempted.
    pub encountered: Vec<u64>,
}

impl SessionState {
    /// Create an empty session at the given starting position.
    pub fn new(position: Position) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Player level, preferring the inventory stats record.
    pub fn level(&self) -> u32 {
        self.inventory
            .as_ref()
            .and_then(|inv| inv.player.as_ref())
            .map(|stats| stats.level)
            .filter(|&level| level > 0)
            .unwrap_or(self.player.level.max(1))
    }

    /// Map tunables, or the protocol defaults before the first settings reply.
    pub fn map_settings(&self) -> MapSettings {
        self.download_settings
            .as_ref()
            .map(|s| s.map_settings.clone())
            .unwrap_or_default()
    }

    /// Queue a user-requested action.
    pub fn enqueue(&mut self, action: TodoAction) {
        self.todo.push_back(action);
    }
}

// ============================================================================
// Tests
// ============================================================================
