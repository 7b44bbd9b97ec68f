//! Roamer Wire Types
//!
//! Decoded server responses arrive untagged: a batch answer is a list of
//! loosely typed objects, one per sub-call. This crate names every response
//! shape the agent understands, classifies raw objects by probing for
//! distinguishing fields in a fixed order, and decodes them into typed
//! payloads.
//!
//! # Classification Order
//!
//! Probes are tried top to bottom and the first match wins. The order is part
//! of the protocol contract: several shapes share fields (a spin reply also
//! carries `items_awarded`, an evolve reply also carries `candy_awarded`), so
//! reordering changes which kind an ambiguous object resolves to.
//!
//! | # | Kind                  | Probe                                     |
//! |---|-----------------------|-------------------------------------------|
//! | 1 | `PlayerData`          | `player_data` truthy                      |
//! | 2 | `HatchedEggs`         | `egg_km_walked` truthy                    |
//! | 3 | `InventoryDelta`      | `inventory_delta` truthy                  |
//! | 4 | `AwardedBadges`       | `awarded_badges` truthy                   |
//! | 5 | `DownloadSettings`    | `hash` truthy                             |
//! | 6 | `RemoteConfigVersion` | `item_templates_timestamp_ms` truthy      |
//! | 7 | `CheckChallenge`      | `show_challenge` key present              |
//! | 8 | `AssetDigest`         | `digest` key present                      |
//! | 9 | `ItemTemplates`       | `item_templates` truthy                   |
//! |10 | `FortSearch`          | `cooldown_complete_timestamp_ms` present  |
//! |11 | `LevelUpRewards`      | `items_awarded` truthy                    |
//! |12 | `BuddyWalked`         | `candy_earned_count` key present          |
//! |13 | `PlayerProfile`       | `badges` truthy                           |
//! |14 | `MapObjects`          | `map_cells` truthy                        |
//! |15 | `VerifyChallenge`     | `success` is the only key                 |
//! |16 | `EvolveCreature`      | `evolved_pokemon_data` truthy             |
//! |17 | `RecycleItem`         | `new_count` key present                   |
//! |18 | `ReleaseCreature`     | `candy_awarded` and `result` present      |
//! |19 | `Encounter`           | `wild_pokemon` truthy                     |
//! |20 | `CatchCreature`       | `captured_pokemon_id` key present         |
//! |21 | `UseIncubator`        | `egg_incubator` truthy                    |
//!
//! Anything else is `Unhandled`.
//!
//! "Truthy" follows the decoded-object conventions: null, false, 0 and the
//! empty string are falsy; arrays and objects are truthy even when empty.

#![deny(unsafe_code)]

pub mod batch;
pub mod payload;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use batch::{Batch, Call, Platform};
pub use payload::*;

/// Result code the server uses for a successful action.
pub const RESULT_SUCCESS: i32 = 1;

// ============================================================================
// Raw Response
// ============================================================================

/// One decoded, untagged response object.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse(Value);

impl RawResponse {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Key exists, whatever its value.
    pub fn has_key(&self, key: &str) -> bool {
        self.0.as_object().is_some_and(|o| o.contains_key(key))
    }

    /// Key exists and its value is truthy.
    pub fn is_truthy(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(truthy)
    }

    fn key_count(&self) -> usize {
        self.0.as_object().map_or(0, |o| o.len())
    }
}

impl From<Value> for RawResponse {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Every response shape the agent recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    PlayerData,
    HatchedEggs,
    InventoryDelta,
    AwardedBadges,
    DownloadSettings,
    RemoteConfigVersion,
    CheckChallenge,
    AssetDigest,
    ItemTemplates,
    FortSearch,
    LevelUpRewards,
    BuddyWalked,
    PlayerProfile,
    MapObjects,
    VerifyChallenge,
    EvolveCreature,
    RecycleItem,
    ReleaseCreature,
    Encounter,
    CatchCreature,
    UseIncubator,
    Unhandled,
}

/// A structural test on a raw response.
#[derive(Debug, Clone, Copy)]
enum Probe {
    Truthy(&'static str),
    HasKey(&'static str),
    OnlyKey(&'static str),
    BothKeys(&'static str, &'static str),
}

impl Probe {
    fn matches(self, raw: &RawResponse) -> bool {
        match self {
            Self::Truthy(key) => raw.is_truthy(key),
            Self::HasKey(key) => raw.has_key(key),
            Self::OnlyKey(key) => raw.has_key(key) && raw.key_count() == 1,
            Self::BothKeys(a, b) => raw.has_key(a) && raw.has_key(b),
        }
    }
}

/// Probe table in priority order. See the crate docs.
const CLASSIFIERS: &[(ResponseKind, Probe)] = &[
    (ResponseKind::PlayerData, Probe::Truthy("player_data")),
    (ResponseKind::HatchedEggs, Probe::Truthy("egg_km_walked")),
    (ResponseKind::InventoryDelta, Probe::Truthy("inventory_delta")),
    (ResponseKind::AwardedBadges, Probe::Truthy("awarded_badges")),
    (ResponseKind::DownloadSettings, Probe::Truthy("hash")),
    (
        ResponseKind::RemoteConfigVersion,
        Probe::Truthy("item_templates_timestamp_ms"),
    ),
    (ResponseKind::CheckChallenge, Probe::HasKey("show_challenge")),
    (ResponseKind::AssetDigest, Probe::HasKey("digest")),
    (ResponseKind::ItemTemplates, Probe::Truthy("item_templates")),
    (
        ResponseKind::FortSearch,
        Probe::HasKey("cooldown_complete_timestamp_ms"),
    ),
    (ResponseKind::LevelUpRewards, Probe::Truthy("items_awarded")),
    (ResponseKind::BuddyWalked, Probe::HasKey("candy_earned_count")),
    (ResponseKind::PlayerProfile, Probe::Truthy("badges")),
    (ResponseKind::MapObjects, Probe::Truthy("map_cells")),
    (ResponseKind::VerifyChallenge, Probe::OnlyKey("success")),
    (
        ResponseKind::EvolveCreature,
        Probe::Truthy("evolved_pokemon_data"),
    ),
    (ResponseKind::RecycleItem, Probe::HasKey("new_count")),
    (
        ResponseKind::ReleaseCreature,
        Probe::BothKeys("candy_awarded", "result"),
    ),
    (ResponseKind::Encounter, Probe::Truthy("wild_pokemon")),
    (ResponseKind::CatchCreature, Probe::HasKey("captured_pokemon_id")),
    (ResponseKind::UseIncubator, Probe::Truthy("egg_incubator")),
];

/// Classify a raw response. The first matching probe wins.
pub fn classify(raw: &RawResponse) -> ResponseKind {
    CLASSIFIERS
        .iter()
        .find(|(_, probe)| probe.matches(raw))
        .map_or(ResponseKind::Unhandled, |(kind, _)| *kind)
}

// ============================================================================
// Decoding
// ============================================================================

/// A classified object whose fields do not fit the typed shape.
#[derive(Debug, Error)]
#[error("malformed {kind:?} payload: {source}")]
pub struct DecodeError {
    pub kind: ResponseKind,
    #[source]
    pub source: serde_json::Error,
}

/// A classified, typed response.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    PlayerData(PlayerDataPayload),
    HatchedEggs(HatchedEggsPayload),
    InventoryDelta(InventoryDeltaPayload),
    AwardedBadges(AwardedBadgesPayload),
    DownloadSettings(DownloadSettingsPayload),
    RemoteConfigVersion(RemoteConfigVersionPayload),
    CheckChallenge(CheckChallengePayload),
    AssetDigest(AssetDigestPayload),
    ItemTemplates(ItemTemplatesPayload),
    FortSearch(FortSearchPayload),
    LevelUpRewards(LevelUpRewardsPayload),
    BuddyWalked(BuddyWalkedPayload),
    PlayerProfile(PlayerProfilePayload),
    MapObjects(MapObjectsPayload),
    VerifyChallenge(VerifyChallengePayload),
    EvolveCreature(ActionResultPayload),
    RecycleItem(RecycleItemPayload),
    ReleaseCreature(ActionResultPayload),
    Encounter(EncounterPayload),
    CatchCreature(CatchCreaturePayload),
    UseIncubator(ActionResultPayload),
    Unhandled(RawResponse),
}

impl Response {
    pub fn kind(&self) -> ResponseKind {
        match self {
            Self::PlayerData(_) => ResponseKind::PlayerData,
            Self::HatchedEggs(_) => ResponseKind::HatchedEggs,
            Self::InventoryDelta(_) => ResponseKind::InventoryDelta,
            Self::AwardedBadges(_) => ResponseKind::AwardedBadges,
            Self::DownloadSettings(_) => ResponseKind::DownloadSettings,
            Self::RemoteConfigVersion(_) => ResponseKind::RemoteConfigVersion,
            Self::CheckChallenge(_) => ResponseKind::CheckChallenge,
            Self::AssetDigest(_) => ResponseKind::AssetDigest,
            Self::ItemTemplates(_) => ResponseKind::ItemTemplates,
            Self::FortSearch(_) => ResponseKind::FortSearch,
            Self::LevelUpRewards(_) => ResponseKind::LevelUpRewards,
            Self::BuddyWalked(_) => ResponseKind::BuddyWalked,
            Self::PlayerProfile(_) => ResponseKind::PlayerProfile,
            Self::MapObjects(_) => ResponseKind::MapObjects,
            Self::VerifyChallenge(_) => ResponseKind::VerifyChallenge,
            Self::EvolveCreature(_) => ResponseKind::EvolveCreature,
            Self::RecycleItem(_) => ResponseKind::RecycleItem,
            Self::ReleaseCreature(_) => ResponseKind::ReleaseCreature,
            Self::Encounter(_) => ResponseKind::Encounter,
            Self::CatchCreature(_) => ResponseKind::CatchCreature,
            Self::UseIncubator(_) => ResponseKind::UseIncubator,
            Self::Unhandled(_) => ResponseKind::Unhandled,
        }
    }
}

/// Classify and decode a raw response.
pub fn decode(raw: RawResponse) -> Result<Response, DecodeError> {
    let kind = classify(&raw);
    let response = match kind {
        ResponseKind::PlayerData => Response::PlayerData(typed(kind, raw)?),
        ResponseKind::HatchedEggs => Response::HatchedEggs(typed(kind, raw)?),
        ResponseKind::InventoryDelta => Response::InventoryDelta(typed(kind, raw)?),
        ResponseKind::AwardedBadges => Response::AwardedBadges(typed(kind, raw)?),
        ResponseKind::DownloadSettings => Response::DownloadSettings(typed(kind, raw)?),
        ResponseKind::RemoteConfigVersion => Response::RemoteConfigVersion(typed(kind, raw)?),
        ResponseKind::CheckChallenge => Response::CheckChallenge(typed(kind, raw)?),
        ResponseKind::AssetDigest => Response::AssetDigest(typed(kind, raw)?),
        ResponseKind::ItemTemplates => Response::ItemTemplates(typed(kind, raw)?),
        ResponseKind::FortSearch => Response::FortSearch(typed(kind, raw)?),
        ResponseKind::LevelUpRewards => Response::LevelUpRewards(typed(kind, raw)?),
        ResponseKind::BuddyWalked => Response::BuddyWalked(typed(kind, raw)?),
        ResponseKind::PlayerProfile => Response::PlayerProfile(typed(kind, raw)?),
        ResponseKind::MapObjects => Response::MapObjects(typed(kind, raw)?),
        ResponseKind::VerifyChallenge => Response::VerifyChallenge(typed(kind, raw)?),
        ResponseKind::EvolveCreature => Response::EvolveCreature(typed(kind, raw)?),
        ResponseKind::RecycleItem => Response::RecycleItem(typed(kind, raw)?),
        ResponseKind::ReleaseCreature => Response::ReleaseCreature(typed(kind, raw)?),
        ResponseKind::Encounter => Response::Encounter(typed(kind, raw)?),
        ResponseKind::CatchCreature => Response::CatchCreature(typed(kind, raw)?),
        ResponseKind::UseIncubator => Response::UseIncubator(typed(kind, raw)?),
        ResponseKind::Unhandled => Response::Unhandled(raw),
    };
    Ok(response)
}

fn typed<T: DeserializeOwned>(kind: ResponseKind, raw: RawResponse) -> Result<T, DecodeError> {
    serde_json::from_value(raw.into_value()).map_err(|source| DecodeError { kind, source })
}

// ============================================================================
// Tests
// ============================================================================
