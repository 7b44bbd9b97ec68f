//! Map snapshot: nearby stops, gyms and creatures.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Position, SpeciesId, TimestampMs};

/// Fort type discriminant as sent by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FortKind {
    Stop,
    Gym,
}

impl FortKind {
    /// Map the wire discriminant. Unknown values yield `None` and are dropped.
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Stop),
            2 => Some(Self::Gym),
            _ => None,
        }
    }
}

/// A stop or gym.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fort {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "type")]
    pub fort_type: i32,
    pub enabled: bool,
    /// Spin cooldown end, 0 when never spun.
    pub cooldown_complete_timestamp_ms: TimestampMs,
}

impl Fort {
    pub fn kind(&self) -> Option<FortKind> {
        FortKind::from_wire(self.fort_type)
    }

    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }

    /// True once the spin cooldown has passed.
    pub fn is_cooled_down(&self, now_ms: TimestampMs) -> bool {
        self.cooldown_complete_timestamp_ms <= now_ms
    }
}

/// Species data embedded in a wild creature record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureData {
    pub pokemon_id: SpeciesId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WildCreature {
    pub encounter_id: u64,
    pub spawn_point_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub pokemon_data: CreatureData,
    pub time_till_hidden_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatchableCreature {
    pub encounter_id: u64,
    pub spawn_point_id: String,
    pub pokemon_id: SpeciesId,
    pub latitude: f64,
    pub longitude: f64,
    pub expiration_timestamp_ms: TimestampMs,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NearbyCreature {
    pub encounter_id: u64,
    pub pokemon_id: SpeciesId,
    pub distance_in_meters: f64,
}

/// Last fetched map. Never merged: each refresh replaces it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSnapshot {
    pub pokestops: Vec<Fort>,
    pub gyms: Vec<Fort>,
    pub wild_pokemons: Vec<WildCreature>,
    pub catchable_pokemons: Vec<CatchableCreature>,
    pub nearby_pokemons: Vec<NearbyCreature>,
}

impl MapSnapshot {
    /// Build a snapshot from flattened cell contents, splitting forts by kind.
    pub fn new(
        forts: Vec<Fort>,
        wild_pokemons: Vec<WildCreature>,
        catchable_pokemons: Vec<CatchableCreature>,
        nearby_pokemons: Vec<NearbyCreature>,
    ) -> Self {
        let (pokestops, rest): (Vec<_>, Vec<_>) = forts
            .into_iter()
            .partition(|f| f.kind() == Some(FortKind::Stop));
        let gyms = rest
            .into_iter()
            .filter(|f| f.kind() == Some(FortKind::Gym))
            .collect();

        Self {
            pokestops,
            gyms,
            wild_pokemons,
            catchable_pokemons,
            nearby_pokemons,
        }
    }

    pub fn stop_mut(&mut self, id: &str) -> Option<&mut Fort> {
        self.pokestops.iter_mut().find(|s| s.id == id)
    }

    /// Species visible in the wild, catchable and nearby lists.
    pub fn distinct_species(&self) -> BTreeSet<SpeciesId> {
        self.wild_pokemons
            .iter()
            .map(|w| w.pokemon_data.pokemon_id)
            .chain(self.catchable_pokemons.iter().map(|c| c.pokemon_id))
            .chain(self.nearby_pokemons.iter().map(|n| n.pokemon_id))
            .collect()
    }
}
