//! Request batches.
//!
//! A `Batch` is an ordered list of named sub-calls sent in one round trip.
//! The transport answers with one raw response per call, in the same order.
//! Encoding the calls is the transport's business; this module only names
//! them and their arguments.

use roamer_state::{CreatureId, ItemId, TimestampMs};

/// Client platform reported to the remote config and asset digest calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
}

/// A single sub-request.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetPlayer {
        country: String,
        language: String,
        timezone: String,
    },
    CheckChallenge,
    GetHatchedEggs,
    GetInventory {
        last_timestamp_ms: TimestampMs,
    },
    CheckAwardedBadges,
    DownloadSettings {
        hash: Option<String>,
    },
    GetBuddyWalked,
    DownloadRemoteConfigVersion {
        platform: Platform,
        app_version: u32,
    },
    GetAssetDigest {
        platform: Platform,
        app_version: u32,
    },
    DownloadItemTemplates,
    MarkTutorialComplete {
        steps: Vec<i32>,
    },
    GetPlayerProfile,
    LevelUpRewards {
        level: u32,
    },
    GetStoreItems,
    GetMapObjects {
        cell_ids: Vec<u64>,
        since_timestamps_ms: Vec<TimestampMs>,
    },
    FortSearch {
        fort_id: String,
        latitude: f64,
        longitude: f64,
    },
    ReleaseCreatures {
        ids: Vec<CreatureId>,
    },
    EvolveCreature {
        id: CreatureId,
    },
    RecycleItem {
        item_id: ItemId,
        count: i32,
    },
    Encounter {
        encounter_id: u64,
        spawn_point_id: String,
    },
    CatchCreature {
        encounter_id: u64,
        spawn_point_id: String,
        ball: ItemId,
    },
    UseIncubator {
        incubator_id: String,
        egg_id: CreatureId,
    },
    VerifyChallenge {
        token: String,
    },
}

impl Call {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetPlayer { .. } => "getPlayer",
            Self::CheckChallenge => "checkChallenge",
            Self::GetHatchedEggs => "getHatchedEggs",
            Self::GetInventory { .. } => "getInventory",
            Self::CheckAwardedBadges => "checkAwardedBadges",
            Self::DownloadSettings { .. } => "downloadSettings",
            Self::GetBuddyWalked => "getBuddyWalked",
            Self::DownloadRemoteConfigVersion { .. } => "downloadRemoteConfigVersion",
            Self::GetAssetDigest { .. } => "getAssetDigest",
            Self::DownloadItemTemplates => "downloadItemTemplates",
            Self::MarkTutorialComplete { .. } => "markTutorialComplete",
            Self::GetPlayerProfile => "getPlayerProfile",
            Self::LevelUpRewards { .. } => "levelUpRewards",
            Self::GetStoreItems => "getStoreItems",
            Self::GetMapObjects { .. } => "getMapObjects",
            Self::FortSearch { .. } => "fortSearch",
            Self::ReleaseCreatures { .. } => "releasePokemon",
            Self::EvolveCreature { .. } => "evolvePokemon",
            Self::RecycleItem { .. } => "recycleInventoryItem",
            Self::Encounter { .. } => "encounter",
            Self::CatchCreature { .. } => "catchPokemon",
            Self::UseIncubator { .. } => "useItemEggIncubator",
            Self::VerifyChallenge { .. } => "verifyChallenge",
        }
    }
}

/// Chainable batch builder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    calls: Vec<Call>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, call: Call) -> Self {
        self.calls.push(call);
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<Call> {
        self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Call names in order, for logging.
    pub fn names(&self) -> Vec<&'static str> {
        self.calls.iter().map(Call::name).collect()
    }

    // ------------------------------------------------------------------------
    // Named calls
    // ------------------------------------------------------------------------

    pub fn get_player(self, country: &str, language: &str, timezone: &str) -> Self {
        self.push(Call::GetPlayer {
            country: country.to_string(),
            language: language.to_string(),
            timezone: timezone.to_string(),
        })
    }

    pub fn check_challenge(self) -> Self {
        self.push(Call::CheckChallenge)
    }

    pub fn get_hatched_eggs(self) -> Self {
        self.push(Call::GetHatchedEggs)
    }

    pub fn get_inventory(self, last_timestamp_ms: TimestampMs) -> Self {
        self.push(Call::GetInventory { last_timestamp_ms })
    }

    pub fn check_awarded_badges(self) -> Self {
        self.push(Call::CheckAwardedBadges)
    }

    pub fn download_settings(self, hash: Option<String>) -> Self {
        self.push(Call::DownloadSettings { hash })
    }

    pub fn get_buddy_walked(self) -> Self {
        self.push(Call::GetBuddyWalked)
    }

    pub fn download_remote_config_version(self, platform: Platform, app_version: u32) -> Self {
        self.push(Call::DownloadRemoteConfigVersion {
            platform,
            app_version,
        })
    }

    pub fn get_asset_digest(self, platform: Platform, app_version: u32) -> Self {
        self.push(Call::GetAssetDigest {
            platform,
            app_version,
        })
    }

    pub fn download_item_templates(self) -> Self {
        self.push(Call::DownloadItemTemplates)
    }

    pub fn mark_tutorial_complete(self, steps: Vec<i32>) -> Self {
        self.push(Call::MarkTutorialComplete { steps })
    }

    pub fn get_player_profile(self) -> Self {
        self.push(Call::GetPlayerProfile)
    }

    pub fn level_up_rewards(self, level: u32) -> Self {
        self.push(Call::LevelUpRewards { level })
    }

    pub fn get_store_items(self) -> Self {
        self.push(Call::GetStoreItems)
    }

    /// Map fetch for the given cells; every cell asks for everything.
    pub fn get_map_objects(self, cell_ids: Vec<u64>) -> Self {
        let since_timestamps_ms = vec![0; cell_ids.len()];
        self.push(Call::GetMapObjects {
            cell_ids,
            since_timestamps_ms,
        })
    }

    pub fn fort_search(self, fort_id: &str, latitude: f64, longitude: f64) -> Self {
        self.push(Call::FortSearch {
            fort_id: fort_id.to_string(),
            latitude,
            longitude,
        })
    }

    pub fn release_creatures(self, ids: Vec<CreatureId>) -> Self {
        self.push(Call::ReleaseCreatures { ids })
    }

    pub fn evolve_creature(self, id: CreatureId) -> Self {
        self.push(Call::EvolveCreature { id })
    }

    pub fn recycle_item(self, item_id: ItemId, count: i32) -> Self {
        self.push(Call::RecycleItem { item_id, count })
    }

    pub fn encounter(self, encounter_id: u64, spawn_point_id: &str) -> Self {
        self.push(Call::Encounter {
            encounter_id,
            spawn_point_id: spawn_point_id.to_string(),
        })
    }

    pub fn catch_creature(self, encounter_id: u64, spawn_point_id: &str, ball: ItemId) -> Self {
        self.push(Call::CatchCreature {
            encounter_id,
            spawn_point_id: spawn_point_id.to_string(),
            ball,
        })
    }

    pub fn use_incubator(self, incubator_id: &str, egg_id: CreatureId) -> Self {
        self.push(Call::UseIncubator {
            incubator_id: incubator_id.to_string(),
            egg_id,
        })
    }

    pub fn verify_challenge(self, token: &str) -> Self {
        self.push(Call::VerifyChallenge {
            token: token.to_string(),
        })
    }
}
