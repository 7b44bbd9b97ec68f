//! Response reconciliation.
//!
//! Folds one decoded response batch into the session state, in batch order,
//! and collects the per-call results the controller needs right away
//! (cooldowns, result codes, challenge verification).
//!
//! Ban, challenge and version conditions abort the batch: payloads after the
//! offending one are not applied.

use roamer_state::{CreatureId, Inventory, SessionState, TimestampMs};
use roamer_wire::{
    FortSearchPayload, InventoryDeltaPayload, LevelUpRewardsPayload, PlayerDataPayload,
    RESULT_SUCCESS, RawResponse, Response, ResponseKind, classify, decode,
};
use semver::Version;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::ApiConfig;
use crate::error::ReconcileError;

/// Results surfaced from one batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallOutcome {
    /// Spin cooldown end, set on a successful spin.
    pub cooldown_complete_ms: Option<TimestampMs>,
    pub challenge_verified: Option<bool>,
    /// Result code of the last action reply (spin, level-up, evolve,
    /// release, recycle, incubator).
    pub result: Option<i32>,
    pub encounter_status: Option<i32>,
    pub catch_status: Option<i32>,
    pub captured: Option<CreatureId>,
    /// Kinds applied, in batch order.
    pub kinds: Vec<ResponseKind>,
    /// Payloads that were unclassified or malformed.
    pub unhandled: usize,
}

impl CallOutcome {
    pub fn saw(&self, kind: ResponseKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// Applies response batches to the session state.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    /// Running client version. `None` disables the minimum version gate.
    client_version: Option<String>,
}

impl Reconciler {
    pub fn new(client_version: Option<String>) -> Self {
        Self { client_version }
    }

    pub fn from_config(api: &ApiConfig) -> Self {
        Self::new(api.check_version.then(|| api.client_version.clone()))
    }

    /// Apply every response in order.
    pub fn apply(
        &self,
        state: &mut SessionState,
        responses: Vec<RawResponse>,
    ) -> Result<CallOutcome, ReconcileError> {
        let mut outcome = CallOutcome::default();

        for raw in responses {
            let halt = Halt::read(&raw);
            match decode(raw) {
                Ok(Response::Unhandled(raw)) => {
                    warn!(payload = %raw.as_value(), "unhandled");
                    outcome.unhandled += 1;
                }
                Ok(response) => {
                    let kind = response.kind();
                    self.apply_one(state, response, &mut outcome)?;
                    outcome.kinds.push(kind);
                }
                Err(e) => {
                    warn!(kind = ?e.kind, error = %e, "Skipping malformed payload");
                    outcome.unhandled += 1;
                    if let Some(halt) = halt {
                        self.enforce(state, halt)?;
                    }
                }
            }
        }

        Ok(outcome)
    }

    fn apply_one(
        &self,
        state: &mut SessionState,
        response: Response,
        outcome: &mut CallOutcome,
    ) -> Result<(), ReconcileError> {
        match response {
            Response::PlayerData(payload) => apply_player(state, payload)?,

            Response::HatchedEggs(payload) => {
                if payload.has_rewards() {
                    info!(
                        hatched = ?payload.pokemon_id,
                        stardust = ?payload.stardust_awarded,
                        candy = ?payload.candy_awarded,
                        experience = ?payload.experience_awarded,
                        "Eggs hatched"
                    );
                }
            }

            Response::InventoryDelta(payload) => apply_inventory(state, payload),

            Response::AwardedBadges(payload) => {
                if !payload.is_empty() {
                    info!(
                        badges = ?payload.awarded_badges,
                        levels = ?payload.awarded_badge_levels,
                        "Badges awarded"
                    );
                }
            }

            Response::DownloadSettings(payload) => {
                state.api.settings_hash = Some(payload.hash);
                if let Some(settings) = payload.settings {
                    self.check_version(&settings.minimum_client_version)?;
                    let key = &settings.map_settings.google_maps_api_key;
                    if !key.is_empty() {
                        state.api.map_provider_key = Some(key.clone());
                    }
                    state.download_settings = Some(settings);
                }
            }

            Response::RemoteConfigVersion(payload) => {
                state.api.item_templates_timestamp = payload.item_templates_timestamp_ms;
            }

            Response::CheckChallenge(payload) => {
                if payload.show_challenge {
                    error!(challenge_url = %payload.challenge_url, "Challenge!");
                    return Err(ReconcileError::ChallengeRequired {
                        url: payload.challenge_url,
                    });
                }
            }

            Response::AssetDigest(payload) => {
                if !payload.digest.is_empty() {
                    state.api.asset_digest = payload.digest;
                }
            }

            Response::ItemTemplates(payload) => {
                if !payload.item_templates.is_empty() {
                    state.api.item_templates = payload.item_templates;
                }
            }

            Response::FortSearch(payload) => {
                outcome.result = Some(payload.result);
                apply_spin(state, payload, outcome);
            }

            Response::LevelUpRewards(payload) => {
                outcome.result = Some(payload.result);
                apply_level_up(state, payload);
            }

            Response::BuddyWalked(payload) => {
                if payload.family_candy_id != 0 || payload.candy_earned_count != 0 {
                    info!(
                        family = payload.family_candy_id,
                        candy = payload.candy_earned_count,
                        "Buddy candy earned"
                    );
                }
            }

            Response::PlayerProfile(payload) => {
                debug!(badges = payload.badges.len(), "Player profile");
            }

            Response::MapObjects(payload) => {
                state.map = Some(payload.into_snapshot());
            }

            Response::VerifyChallenge(payload) => {
                outcome.challenge_verified = Some(payload.success);
            }

            Response::EvolveCreature(payload)
            | Response::ReleaseCreature(payload)
            | Response::UseIncubator(payload) => {
                outcome.result = Some(payload.result);
            }

            Response::RecycleItem(payload) => {
                outcome.result = Some(payload.result);
            }

            Response::Encounter(payload) => {
                outcome.encounter_status = Some(payload.status);
            }

            Response::CatchCreature(payload) => {
                outcome.catch_status = Some(payload.status);
                if payload.captured_pokemon_id != 0 {
                    outcome.captured = Some(payload.captured_pokemon_id);
                }
            }

            // Handled by the caller.
            Response::Unhandled(_) => {}
        }

        Ok(())
    }

    /// Fail when the server requires a newer client than the one running.
    fn check_version(&self, minimum: &str) -> Result<(), ReconcileError> {
        let Some(current) = &self.client_version else {
            return Ok(());
        };
        if minimum.is_empty() {
            return Ok(());
        }

        match (parse_version(current), parse_version(minimum)) {
            (Some(running), Some(required)) if running < required => {
                Err(ReconcileError::UnsupportedVersion {
                    minimum: minimum.to_string(),
                    current: current.clone(),
                })
            }
            (Some(_), Some(_)) => Ok(()),
            _ => {
                warn!(%current, %minimum, "Unparsable client version, skipping version check");
                Ok(())
            }
        }
    }
}

/// Batch-halting flags, read from the raw object so that a malformed
/// sibling field cannot hide them.
#[derive(Debug, Clone, PartialEq)]
enum Halt {
    Banned,
    Challenge { url: String },
    MinimumVersion(String),
}

impl Halt {
    fn read(raw: &RawResponse) -> Option<Self> {
        let value = raw.as_value();
        match classify(raw) {
            ResponseKind::PlayerData => raw.is_truthy("banned").then_some(Self::Banned),
            ResponseKind::CheckChallenge => raw.is_truthy("show_challenge").then(|| {
                let url = value.get("challenge_url").and_then(Value::as_str);
                Self::Challenge {
                    url: url.unwrap_or_default().to_string(),
                }
            }),
            ResponseKind::DownloadSettings => value
                .pointer("/settings/minimum_client_version")
                .and_then(Value::as_str)
                .filter(|v| !v.is_empty())
                .map(|v| Self::MinimumVersion(v.to_string())),
            _ => None,
        }
    }
}

impl Reconciler {
    /// Raise the halting condition of a payload that failed to decode.
    fn enforce(&self, state: &mut SessionState, halt: Halt) -> Result<(), ReconcileError> {
        match halt {
            Halt::Banned => {
                state.player.banned = true;
                error!("Account Banned");
                Err(ReconcileError::AccountBanned)
            }
            Halt::Challenge { url } => {
                error!(challenge_url = %url, "Challenge!");
                Err(ReconcileError::ChallengeRequired { url })
            }
            Halt::MinimumVersion(minimum) => self.check_version(&minimum),
        }
    }
}

fn apply_player(state: &mut SessionState, payload: PlayerDataPayload) -> Result<(), ReconcileError> {
    state.player = payload.player_data;
    state.player.banned = payload.banned;
    state.player.warn = payload.warn;

    if payload.banned {
        error!(user = %state.player.username, "Account Banned");
        return Err(ReconcileError::AccountBanned);
    }
    if payload.warn {
        error!("Ban warning.");
    }
    Ok(())
}

fn apply_inventory(state: &mut SessionState, payload: InventoryDeltaPayload) {
    let delta = payload.inventory_delta;

    if !state.api.advance_inventory_timestamp(delta.new_timestamp_ms) {
        warn!(
            current = state.api.inventory_timestamp,
            reported = delta.new_timestamp_ms,
            "Inventory watermark went backwards, keeping current"
        );
    }

    if state.inventory.is_none() {
        state.inventory = Some(Inventory::bootstrap(delta.into_split()));
        return;
    }
    if delta.is_empty() {
        return;
    }

    let split = delta.into_split();
    debug!(
        items = split.items.len(),
        pokemon = split.pokemon.len(),
        "Inventory delta"
    );
    if let Some(inventory) = state.inventory.as_mut() {
        inventory.apply_delta(split);
    }
}

fn apply_spin(state: &mut SessionState, payload: FortSearchPayload, outcome: &mut CallOutcome) {
    if payload.result != RESULT_SUCCESS {
        warn!("fortSearch() returned {}", payload.result);
        return;
    }

    match state.inventory.as_mut() {
        Some(inventory) => {
            inventory.award_items(&payload.items_awarded);
            if let Some(egg) = payload.pokemon_data_egg {
                inventory.add_egg(egg);
            }
        }
        None => warn!(
            items = payload.items_awarded.len(),
            egg = payload.pokemon_data_egg.is_some(),
            "Spin rewards before inventory bootstrap, not tracked"
        ),
    }
    state.player.experience = state
        .player
        .experience
        .saturating_add(payload.experience_awarded);
    outcome.cooldown_complete_ms = Some(payload.cooldown_complete_timestamp_ms);
}

fn apply_level_up(state: &mut SessionState, payload: LevelUpRewardsPayload) {
    if payload.result != RESULT_SUCCESS {
        debug!(result = payload.result, "Level up rewards not granted");
        return;
    }

    info!(items = payload.items_awarded.len(), "Level up rewards");
    if let Some(inventory) = state.inventory.as_mut() {
        inventory.award_items(&payload.items_awarded);
    }
}

/// Parse a version, padding missing components with zeros (`0.45` → `0.45.0`).
fn parse_version(text: &str) -> Option<Version> {
    let mut parts: Vec<&str> = text.trim().split('.').take(3).collect();
    while parts.len() < 3 {
        parts.push("0");
    }
    Version::parse(&parts.join(".")).ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use roamer_state::ItemStack;
    use serde_json::{Value, json};

    fn raw(values: Vec<Value>) -> Vec<RawResponse> {
        values.into_iter().map(RawResponse::from).collect()
    }

    fn reconciler() -> Reconciler {
        Reconciler::new(Some("0.45.0".to_string()))
    }

    fn inventory_payload(ts: i64, items: Vec<Value>) -> Value {
        json!({
            "success": true,
            "inventory_delta": {
                "new_timestamp_ms": ts,
                "inventory_items": items,
            }
        })
    }

    fn item(item_id: i32, count: i32) -> Value {
        json!({ "inventory_item_data": { "item": { "item_id": item_id, "count": count } } })
    }

    fn creature(id: u64, is_egg: bool) -> Value {
        json!({ "inventory_item_data": { "pokemon_data": { "id": id, "is_egg": is_egg } } })
    }

    fn state_with_item(item_id: i32, count: i32) -> SessionState {
        let mut state = SessionState::default();
        state.inventory = Some(Inventory {
            items: vec![ItemStack {
                item_id,
                count,
                unseen: false,
            }],
            ..Default::default()
        });
        state
    }

    /// A ban stops the batch: later payloads are not applied.
    #[test]
    fn test_ban_fails_fast() {
        let mut state = SessionState::default();
        let result = reconciler().apply(
            &mut state,
            raw(vec![
                json!({"success": true, "player_data": {"username": "walker"}, "banned": true}),
                json!({"item_templates_timestamp_ms": 99}),
            ]),
        );

        assert_eq!(result, Err(ReconcileError::AccountBanned));
        assert!(state.player.banned);
        assert_eq!(state.player.username, "walker");
        assert_eq!(state.api.item_templates_timestamp, 0, "Later payload skipped");
    }

    #[test]
    fn test_ban_survives_malformed_player_record() {
        let mut state = SessionState::default();
        let result = reconciler().apply(
            &mut state,
            raw(vec![
                json!({"player_data": {"username": "walker", "level": -1}, "banned": true}),
                json!({"item_templates_timestamp_ms": 99}),
            ]),
        );

        assert_eq!(result, Err(ReconcileError::AccountBanned));
        assert!(state.player.banned);
        assert_eq!(state.api.item_templates_timestamp, 0, "Later payload skipped");
    }

    #[test]
    fn test_challenge_survives_malformed_payload() {
        let mut state = SessionState::default();
        let result = reconciler().apply(
            &mut state,
            raw(vec![
                json!({"show_challenge": true, "challenge_url": null}),
                json!({"item_templates_timestamp_ms": 99}),
            ]),
        );

        assert_eq!(
            result,
            Err(ReconcileError::ChallengeRequired { url: String::new() })
        );
        assert_eq!(state.api.item_templates_timestamp, 0);
    }

    #[test]
    fn test_version_gate_survives_malformed_settings() {
        let mut state = SessionState::default();
        let result = reconciler().apply(
            &mut state,
            raw(vec![json!({
                "hash": "h1",
                "settings": {
                    "minimum_client_version": "0.47.1",
                    "map_settings": "unexpected"
                }
            })]),
        );

        assert!(matches!(
            result,
            Err(ReconcileError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_malformed_payload_without_flags_is_skipped() {
        let mut state = SessionState::default();
        let outcome = reconciler()
            .apply(
                &mut state,
                raw(vec![json!({"player_data": {"level": -1}, "banned": false})]),
            )
            .unwrap();
        assert_eq!(outcome.unhandled, 1);
        assert!(!state.player.banned);
    }

    #[test]
    fn test_spin_before_inventory_bootstrap() {
        let mut state = SessionState::default();
        let outcome = reconciler()
            .apply(
                &mut state,
                raw(vec![json!({
                    "result": 1,
                    "items_awarded": [{"item_id": 1, "item_count": 3}],
                    "pokemon_data_egg": {"id": 77},
                    "experience_awarded": 50,
                    "cooldown_complete_timestamp_ms": 1234
                })]),
            )
            .unwrap();

        assert!(state.inventory.is_none(), "Rewards are not tracked yet");
        assert_eq!(state.player.experience, 50);
        assert_eq!(outcome.cooldown_complete_ms, Some(1234));
    }

    #[test]
    fn test_spin_experience_saturates() {
        let mut state = state_with_item(1, 0);
        state.player.experience = i64::MAX - 1;
        reconciler()
            .apply(
                &mut state,
                raw(vec![json!({
                    "result": 1,
                    "experience_awarded": 10,
                    "cooldown_complete_timestamp_ms": 1
                })]),
            )
            .unwrap();
        assert_eq!(state.player.experience, i64::MAX);
    }

    #[test]
    fn test_warn_flag_is_not_fatal() {
        let mut state = SessionState::default();
        reconciler()
            .apply(
                &mut state,
                raw(vec![json!({"player_data": {"level": 3}, "warn": true})]),
            )
            .unwrap();
        assert!(state.player.warn);
        assert!(!state.player.banned);
    }

    #[test]
    fn test_version_gate_rejects_newer_minimum() {
        let mut state = SessionState::default();
        let result = reconciler().apply(
            &mut state,
            raw(vec![json!({
                "hash": "h1",
                "settings": { "minimum_client_version": "0.47.1" }
            })]),
        );

        assert_eq!(
            result,
            Err(ReconcileError::UnsupportedVersion {
                minimum: "0.47.1".to_string(),
                current: "0.45.0".to_string(),
            })
        );
        assert_eq!(state.api.settings_hash.as_deref(), Some("h1"), "Hash stored first");
        assert!(state.download_settings.is_none());
    }

    #[test]
    fn test_version_gate_accepts_equal_or_lower_minimum() {
        for minimum in ["0.45.0", "0.45", "0.43.3"] {
            let mut state = SessionState::default();
            reconciler()
                .apply(
                    &mut state,
                    raw(vec![json!({
                        "hash": "h2",
                        "settings": {
                            "minimum_client_version": minimum,
                            "map_settings": {
                                "get_map_objects_min_refresh_seconds": 5.0,
                                "get_map_objects_max_refresh_seconds": 60.0,
                                "get_map_objects_min_distance_meters": 20.0,
                                "google_maps_api_key": "gkey"
                            }
                        }
                    })]),
                )
                .unwrap();

            let settings = state.map_settings();
            assert_eq!(settings.get_map_objects_max_refresh_seconds, 60.0, "minimum {minimum}");
            assert_eq!(state.api.map_provider_key.as_deref(), Some("gkey"));
        }
    }

    #[test]
    fn test_version_gate_disabled_or_unparsable() {
        let payload = json!({ "hash": "h", "settings": { "minimum_client_version": "9.0.0" } });

        let mut state = SessionState::default();
        Reconciler::new(None)
            .apply(&mut state, raw(vec![payload.clone()]))
            .unwrap();
        assert!(state.download_settings.is_some());

        let mut state = SessionState::default();
        Reconciler::new(Some("dev-build".to_string()))
            .apply(&mut state, raw(vec![payload]))
            .unwrap();
        assert!(state.download_settings.is_some());
    }

    #[test]
    fn test_challenge_interrupts_batch() {
        let mut state = SessionState::default();
        let result = reconciler().apply(
            &mut state,
            raw(vec![
                json!({"show_challenge": true, "challenge_url": "https://challenge"}),
                json!({"hash": "never"}),
            ]),
        );

        assert_eq!(
            result,
            Err(ReconcileError::ChallengeRequired {
                url: "https://challenge".to_string()
            })
        );
        assert!(state.api.settings_hash.is_none());
    }

    #[test]
    fn test_inventory_bootstrap_then_delta() {
        let mut state = SessionState::default();
        let r = reconciler();

        r.apply(
            &mut state,
            raw(vec![inventory_payload(100, vec![item(1, 5), creature(10, false)])]),
        )
        .unwrap();
        r.apply(
            &mut state,
            raw(vec![inventory_payload(200, vec![item(1, 7), creature(10, true)])]),
        )
        .unwrap();

        let inventory = state.inventory.as_ref().unwrap();
        assert_eq!(inventory.item_count(1), 7);
        assert!(inventory.pokemon.is_empty());
        assert_eq!(inventory.eggs.len(), 1);
        assert_eq!(inventory.eggs[0].id, 10);
        assert_eq!(state.api.inventory_timestamp, 200);
    }

    /// An empty delta changes nothing but still moves the watermark.
    #[test]
    fn test_empty_delta_advances_watermark() {
        let mut state = state_with_item(1, 5);
        reconciler()
            .apply(&mut state, raw(vec![inventory_payload(300, vec![])]))
            .unwrap();

        assert_eq!(state.api.inventory_timestamp, 300);
        assert_eq!(state.inventory.as_ref().unwrap().item_count(1), 5);
    }

    #[test]
    fn test_watermark_is_monotonic() {
        let mut state = state_with_item(1, 5);
        let r = reconciler();
        for ts in [10, 20, 15, 30] {
            r.apply(&mut state, raw(vec![inventory_payload(ts, vec![])]))
                .unwrap();
        }
        assert_eq!(state.api.inventory_timestamp, 30);
    }

    #[test]
    fn test_spin_success_awards_items() {
        let mut state = state_with_item(1, 7);
        state.player.experience = 100;

        let outcome = reconciler()
            .apply(
                &mut state,
                raw(vec![json!({
                    "result": 1,
                    "items_awarded": [{"item_id": 1, "item_count": 3}],
                    "experience_awarded": 50,
                    "pokemon_data_egg": {"id": 77, "egg_km_walked_target": 5.0},
                    "cooldown_complete_timestamp_ms": 123_456
                })]),
            )
            .unwrap();

        let inventory = state.inventory.as_ref().unwrap();
        assert_eq!(inventory.item_count(1), 10);
        assert_eq!(inventory.eggs.len(), 1);
        assert!(inventory.eggs[0].is_egg);
        assert_eq!(state.player.experience, 150);
        assert_eq!(outcome.cooldown_complete_ms, Some(123_456));
        assert_eq!(outcome.result, Some(RESULT_SUCCESS));
    }

    #[test]
    fn test_spin_failure_leaves_state_untouched() {
        let mut state = state_with_item(1, 7);
        let before = state.clone();

        let outcome = reconciler()
            .apply(
                &mut state,
                raw(vec![json!({
                    "result": 0,
                    "items_awarded": [{"item_id": 1, "item_count": 3}],
                    "cooldown_complete_timestamp_ms": 0
                })]),
            )
            .unwrap();

        assert_eq!(state, before);
        assert_eq!(outcome.result, Some(0));
        assert_eq!(outcome.cooldown_complete_ms, None);
    }

    #[test]
    fn test_level_up_rewards_increment() {
        let mut state = state_with_item(2, 1);
        reconciler()
            .apply(
                &mut state,
                raw(vec![json!({
                    "result": 1,
                    "items_awarded": [{"item_id": 2, "item_count": 10}]
                })]),
            )
            .unwrap();
        assert_eq!(state.inventory.as_ref().unwrap().item_count(2), 11);
    }

    #[test]
    fn test_map_is_replaced_not_merged() {
        let mut state = SessionState::default();
        let r = reconciler();

        r.apply(
            &mut state,
            raw(vec![json!({"map_cells": [{"forts": [{"id": "a", "type": 1}, {"id": "b", "type": 1}]}]})]),
        )
        .unwrap();
        r.apply(
            &mut state,
            raw(vec![json!({"map_cells": [{"forts": [{"id": "c", "type": 2}]}]})]),
        )
        .unwrap();

        let map = state.map.as_ref().unwrap();
        assert!(map.pokestops.is_empty());
        assert_eq!(map.gyms.len(), 1);
    }

    #[test]
    fn test_unhandled_payload_is_counted_and_harmless() {
        let mut state = SessionState::default();
        let before = state.clone();

        let outcome = reconciler()
            .apply(&mut state, raw(vec![json!({"items": [], "player_currencies": []})]))
            .unwrap();

        assert_eq!(outcome.unhandled, 1);
        assert!(outcome.kinds.is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_malformed_payload_is_skipped() {
        let mut state = SessionState::default();
        let outcome = reconciler()
            .apply(
                &mut state,
                raw(vec![
                    json!({"hash": "h", "settings": 42}),
                    json!({"item_templates_timestamp_ms": 5}),
                ]),
            )
            .unwrap();

        assert_eq!(outcome.unhandled, 1);
        assert_eq!(state.api.item_templates_timestamp, 5);
    }

    #[test]
    fn test_action_outcomes() {
        let mut state = SessionState::default();
        let r = reconciler();

        let outcome = r
            .apply(&mut state, raw(vec![json!({"success": true})]))
            .unwrap();
        assert_eq!(outcome.challenge_verified, Some(true));

        let outcome = r
            .apply(
                &mut state,
                raw(vec![json!({"status": 1, "captured_pokemon_id": 555})]),
            )
            .unwrap();
        assert_eq!(outcome.catch_status, Some(1));
        assert_eq!(outcome.captured, Some(555));

        let outcome = r
            .apply(&mut state, raw(vec![json!({"result": 3, "new_count": 0})]))
            .unwrap();
        assert_eq!(outcome.result, Some(3));
        assert!(outcome.saw(ResponseKind::RecycleItem));
    }

    #[test]
    fn test_bulk_reference_data_kept_when_non_empty() {
        let mut state = SessionState::default();
        let r = reconciler();

        r.apply(
            &mut state,
            raw(vec![
                json!({"digest": [{"asset_id": "a"}], "timestamp_ms": 1}),
                json!({"success": true, "item_templates": [{"template_id": "t"}]}),
            ]),
        )
        .unwrap();
        r.apply(&mut state, raw(vec![json!({"digest": []})])).unwrap();

        assert_eq!(state.api.asset_digest.len(), 1, "Empty digest ignored");
        assert_eq!(state.api.item_templates.len(), 1);
    }

    #[test]
    fn test_parse_version_pads_components() {
        assert_eq!(parse_version("0.45"), Some(Version::new(0, 45, 0)));
        assert_eq!(parse_version(" 1.2.3 "), Some(Version::new(1, 2, 3)));
        assert_eq!(parse_version("0.45.0.1"), Some(Version::new(0, 45, 0)));
        assert_eq!(parse_version("abc"), None);
    }
}
