//! Roamer Journal
//!
//! Best-effort persistence for the agent: a human-readable snapshot of the
//! session state and a cache of the item templates keyed by their server
//! watermark.
//!
//! # Architecture Constraints
//!
//! - Snapshots are a debugging aid, never a recovery source. Nothing here
//!   reads a snapshot back.
//! - Write failures are logged and swallowed; callers never see them.
//! - Bulk reference data (item templates, asset digest) stays out of the
//!   snapshot. Templates live in their own cache file.

#![deny(unsafe_code)]

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use roamer_state::{
    DownloadSettings, Inventory, MapSnapshot, PathState, PlayerProfile, Position, SessionState,
    TimestampMs, TodoAction,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Snapshot file name inside the data directory.
pub const STATE_FILE: &str = "state.json";

/// Item template cache file name inside the data directory.
pub const ITEM_TEMPLATES_FILE: &str = "item_templates.json";

// ============================================================================
// Snapshot Views
// ============================================================================

/// Protocol bookkeeping as written to disk, without the bulk reference data.
#[derive(Debug, Serialize)]
pub struct ApiSnapshot<'a> {
    pub inventory_timestamp: TimestampMs,
    pub settings_hash: Option<&'a str>,
    pub item_templates_timestamp: TimestampMs,
    pub last_gmo: Option<String>,
    pub last_pos: Option<&'a Position>,
    pub map_provider_key: Option<&'a str>,
}

/// Borrowed view of the session written as the state document.
#[derive(Debug, Serialize)]
pub struct StateSnapshot<'a> {
    pub position: &'a Position,
    pub player: &'a PlayerProfile,
    pub inventory: Option<&'a Inventory>,
    pub api: ApiSnapshot<'a>,
    pub map: Option<&'a MapSnapshot>,
    pub download_settings: Option<&'a DownloadSettings>,
    pub todo: &'a VecDeque<TodoAction>,
    pub path: &'a PathState,
    pub encountered: &'a [u64],
}

impl<'a> From<&'a SessionState> for StateSnapshot<'a> {
    fn from(state: &'a SessionState) -> Self {
        let api = &state.api;
        Self {
            position: &state.position,
            player: &state.player,
            inventory: state.inventory.as_ref(),
            api: ApiSnapshot {
                inventory_timestamp: api.inventory_timestamp,
                settings_hash: api.settings_hash.as_deref(),
                item_templates_timestamp: api.item_templates_timestamp,
                last_gmo: api.last_gmo.map(|t| t.to_rfc3339()),
                last_pos: api.last_pos.as_ref(),
                map_provider_key: api.map_provider_key.as_deref(),
            },
            map: state.map.as_ref(),
            download_settings: state.download_settings.as_ref(),
            todo: &state.todo,
            path: &state.path,
            encountered: &state.encountered,
        }
    }
}

/// Cached item templates and the server watermark they were fetched at.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTemplateCache {
    pub timestamp_ms: TimestampMs,
    pub item_templates: Vec<Value>,
}

impl ItemTemplateCache {
    /// True when the server reports nothing newer than the cache.
    pub fn is_fresh(&self, server_timestamp_ms: TimestampMs) -> bool {
        !self.item_templates.is_empty() && self.timestamp_ms >= server_timestamp_ms
    }
}

// ============================================================================
// Store Trait
// ============================================================================

/// Persistence collaborator. Every method is best-effort.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Write a snapshot of the session.
    async fn save_state(&self, state: &SessionState);

    /// Load the cached item templates, if any.
    async fn load_item_templates(&self) -> Option<ItemTemplateCache>;

    /// Replace the cached item templates.
    async fn save_item_templates(&self, cache: &ItemTemplateCache);
}

// ============================================================================
// JSON File Store
// ============================================================================

/// Store writing pretty JSON documents into a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE)
    }

    pub fn item_templates_path(&self) -> PathBuf {
        self.data_dir.join(ITEM_TEMPLATES_FILE)
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn save_state(&self, state: &SessionState) {
        let path = self.state_path();
        if let Err(e) = write_json(&path, &StateSnapshot::from(state)).await {
            debug!(path = %path.display(), error = %e, "Unable to save state");
        }
    }

    async fn load_item_templates(&self) -> Option<ItemTemplateCache> {
        let path = self.item_templates_path();
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Unable to read item templates");
                return None;
            }
        };

        match serde_json::from_slice(&data) {
            Ok(cache) => Some(cache),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Ignoring corrupt item templates");
                None
            }
        }
    }

    async fn save_item_templates(&self, cache: &ItemTemplateCache) {
        let path = self.item_templates_path();
        if let Err(e) = write_json(&path, cache).await {
            debug!(path = %path.display(), error = %e, "Unable to save item templates");
        }
    }
}

/// Serialize `value` as JSON indented by four spaces and write it to `path`,
/// creating parent directories as needed.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut encoded = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut encoded, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    tokio::fs::write(path, encoded).await
}

// ============================================================================
// Tests
// ============================================================================
