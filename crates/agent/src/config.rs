//! Agent configuration, loaded from a TOML file.
//!
//! Every section has defaults; a missing file yields a default config that
//! still fails validation because it has no user name.

use std::path::Path;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub auth_type: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            auth_type: "ptc".to_string(),
        }
    }
}

/// Starting position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PosConfig {
    pub lat: f64,
    pub lng: f64,
}

impl Default for PosConfig {
    fn default() -> Self {
        Self {
            lat: 48.8456222,
            lng: 2.3364526,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// 32 hex digits. Generated when empty.
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// App version number sent with the remote config and asset calls.
    pub version: u32,
    /// Client version compared against the server minimum.
    pub client_version: String,
    pub check_version: bool,
    pub country: String,
    pub language: String,
    pub timezone: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: 4500,
            client_version: "0.45.0".to_string(),
            check_version: true,
            country: "US".to_string(),
            language: "en".to_string(),
            timezone: "Europe/Paris".to_string(),
        }
    }
}

/// Pauses in seconds. Each pause is jittered by a factor in [0.9, 1.1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    pub walk: f64,
    pub spin: f64,
    pub encounter: f64,
    pub catch: f64,
    pub level_up: f64,
    pub release: f64,
    pub evolve: f64,
    pub recycle: f64,
    pub incubator: f64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            walk: 1.0,
            spin: 1.5,
            encounter: 1.5,
            catch: 3.0,
            level_up: 1.0,
            release: 1.0,
            evolve: 3.0,
            recycle: 1.0,
            incubator: 1.0,
        }
    }
}

impl DelayConfig {
    /// All pauses set to zero.
    pub fn none() -> Self {
        Self {
            walk: 0.0,
            spin: 0.0,
            encounter: 0.0,
            catch: 0.0,
            level_up: 0.0,
            release: 0.0,
            evolve: 0.0,
            recycle: 0.0,
            incubator: 0.0,
        }
    }
}

/// Scale `seconds` by a uniform factor in [0.9, 1.1].
pub fn jittered<R: Rng + ?Sized>(seconds: f64, rng: &mut R) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(seconds * rng.gen_range(0.9..=1.1))
}

// ============================================================================
// Agent Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub credentials: Credentials,
    pub pos: PosConfig,
    pub device: DeviceConfig,
    pub api: ApiConfig,
    pub delay: DelayConfig,
    pub loglevel: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            pos: PosConfig::default(),
            device: DeviceConfig::default(),
            api: ApiConfig::default(),
            delay: DelayConfig::default(),
            loglevel: "info".to_string(),
        }
    }
}

impl AgentConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Fill in a random device id if none is configured.
    pub fn ensure_device_id<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.device.id.is_empty() {
            const HEX: &[u8] = b"0123456789abcdef";
            self.device.id = (0..32)
                .map(|_| char::from(HEX[rng.gen_range(0..HEX.len())]))
                .collect();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.credentials.user.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(())
    }
}
