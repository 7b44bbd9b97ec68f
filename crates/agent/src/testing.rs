//! Scripted collaborator doubles for controller tests.
//!
//! Every double reports what it was asked to do into a shared `Recorder`, so
//! tests can assert on the exact call sequence.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use roamer_journal::{ItemTemplateCache, StateStore};
use roamer_state::{CatchableCreature, Fort, Position, SessionState, SpeciesId};
use roamer_wire::{Batch, RawResponse};
use serde_json::{Value, json};

use crate::config::{AgentConfig, Credentials, DelayConfig};
use crate::controller::{Companions, Controller};
use crate::error::TransportError;
use crate::services::{
    AssetFetcher, ChallengeResolver, ProxyValidator, Services, Transport, UiBroadcaster, Walker,
};

// ============================================================================
// Recorder
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Batches sent, as comma-joined call names.
    pub fn batches(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("batch:").map(str::to_string))
            .collect()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }

    pub fn position_of(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

// ============================================================================
// Doubles
// ============================================================================

pub struct ScriptedTransport {
    script: VecDeque<Result<Vec<Value>, TransportError>>,
    auth: Result<String, TransportError>,
    recorder: Recorder,
}

impl ScriptedTransport {
    pub fn new(recorder: &Recorder) -> Self {
        Self {
            script: VecDeque::new(),
            auth: Ok("token-1".to_string()),
            recorder: recorder.clone(),
        }
    }

    pub fn reply(mut self, responses: Vec<Value>) -> Self {
        self.script.push_back(Ok(responses));
        self
    }

    pub fn fail(mut self, error: TransportError) -> Self {
        self.script.push_back(Err(error));
        self
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn authenticate(&mut self, _credentials: &Credentials) -> Result<String, TransportError> {
        self.recorder.push("authenticate");
        self.auth.clone()
    }

    async fn init(&mut self, token: &str) -> Result<(), TransportError> {
        self.recorder.push(format!("init:{token}"));
        Ok(())
    }

    fn set_position(&mut self, position: &Position) {
        self.recorder.push(format!("position:{}", position.altitude));
    }

    fn cell_ids(&self, _position: &Position) -> Vec<u64> {
        vec![1, 2, 3]
    }

    async fn batch_call(&mut self, batch: Batch) -> Result<Vec<RawResponse>, TransportError> {
        self.recorder
            .push(format!("batch:{}", batch.names().join(",")));
        match self.script.pop_front() {
            Some(Ok(values)) => Ok(values.into_iter().map(RawResponse::from).collect()),
            Some(Err(e)) => Err(e),
            None => Err(TransportError::new("script exhausted")),
        }
    }
}

/// Moves north by `step` degrees per walk.
pub struct StepWalker {
    pub step: f64,
    recorder: Recorder,
}

#[async_trait]
impl Walker for StepWalker {
    async fn check_path(&mut self, _state: &mut SessionState) -> Option<Vec<Position>> {
        None
    }

    async fn walk(&mut self, state: &mut SessionState) {
        state.position.lat += self.step;
        self.recorder.push("walk");
    }

    fn fuzzed_location(&mut self, position: &Position) -> Position {
        *position
    }

    async fn altitude(&mut self, _position: &Position) -> f64 {
        35.0
    }
}

pub struct StubProxy {
    pub configured: bool,
    pub valid: bool,
    recorder: Recorder,
}

impl StubProxy {
    pub fn new(recorder: &Recorder, configured: bool, valid: bool) -> Self {
        Self {
            configured,
            valid,
            recorder: recorder.clone(),
        }
    }
}

#[async_trait]
impl ProxyValidator for StubProxy {
    async fn check_proxy(&mut self) -> bool {
        self.valid
    }

    fn bad_proxy(&mut self) {
        self.recorder.push("bad_proxy");
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

pub struct RecordingUi(Recorder);

impl UiBroadcaster for RecordingUi {
    fn ready(&self) {
        self.0.push("ui:ready");
    }

    fn send_position(&self, _position: &Position) {
        self.0.push("ui:position");
    }

    fn send_stops(&self, stops: &[Fort]) {
        self.0.push(format!("ui:stops:{}", stops.len()));
    }

    fn send_route(&self, _waypoints: &[Position]) {
        self.0.push("ui:route");
    }

    fn send_visited_stop(&self, stop: &Fort) {
        self.0.push(format!("ui:visited:{}", stop.id));
    }

    fn send_creature_caught(&self, creature: &CatchableCreature) {
        self.0.push(format!("ui:caught:{}", creature.encounter_id));
    }
}

pub struct StubResolver {
    pub token: Option<String>,
    recorder: Recorder,
}

impl StubResolver {
    pub fn new(recorder: &Recorder, token: Option<&str>) -> Self {
        Self {
            token: token.map(str::to_string),
            recorder: recorder.clone(),
        }
    }
}

#[async_trait]
impl ChallengeResolver for StubResolver {
    async fn solve_manual(&mut self, url: &str) -> Option<String> {
        self.recorder.push(format!("challenge:{url}"));
        self.token.clone()
    }
}

pub struct RecordingAssets(Recorder);

#[async_trait]
impl AssetFetcher for RecordingAssets {
    async fn prefetch_for_species(&mut self, species: &BTreeSet<SpeciesId>) {
        self.0.push(format!("prefetch:{}", species.len()));
    }
}

pub struct MemoryStore {
    templates: Mutex<Option<ItemTemplateCache>>,
    recorder: Recorder,
}

impl MemoryStore {
    pub fn new(recorder: &Recorder, templates: Option<ItemTemplateCache>) -> Self {
        Self {
            templates: Mutex::new(templates),
            recorder: recorder.clone(),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn save_state(&self, _state: &SessionState) {
        self.recorder.push("save_state");
    }

    async fn load_item_templates(&self) -> Option<ItemTemplateCache> {
        self.templates.lock().unwrap().clone()
    }

    async fn save_item_templates(&self, cache: &ItemTemplateCache) {
        self.recorder
            .push(format!("save_templates:{}", cache.timestamp_ms));
        *self.templates.lock().unwrap() = Some(cache.clone());
    }
}

// ============================================================================
// Assembly
// ============================================================================

pub fn test_config() -> AgentConfig {
    AgentConfig {
        credentials: Credentials {
            user: "tester".to_string(),
            password: "secret".to_string(),
            ..Default::default()
        },
        delay: DelayConfig::none(),
        ..Default::default()
    }
}

/// Default doubles: no proxy, walker standing still, resolver answering
/// `captcha-token`, empty template cache.
pub fn services(transport: ScriptedTransport, recorder: &Recorder) -> Services {
    Services {
        transport: Box::new(transport),
        walker: Box::new(StepWalker {
            step: 0.0,
            recorder: recorder.clone(),
        }),
        proxy: Box::new(StubProxy::new(recorder, false, true)),
        ui: Box::new(RecordingUi(recorder.clone())),
        challenge: Box::new(StubResolver::new(recorder, Some("captcha-token"))),
        assets: Box::new(RecordingAssets(recorder.clone())),
        store: Box::new(MemoryStore::new(recorder, None)),
    }
}

pub fn controller(transport: ScriptedTransport, recorder: &Recorder) -> Controller {
    controller_with(test_config(), services(transport, recorder))
}

pub fn controller_with(config: AgentConfig, services: Services) -> Controller {
    Controller::with_rng(config, services, StdRng::seed_from_u64(42))
}

// ============================================================================
// Response Fixtures
// ============================================================================

pub fn item(item_id: i32, count: i32) -> Value {
    json!({ "inventory_item_data": { "item": { "item_id": item_id, "count": count } } })
}

pub fn player_stats(level: u32) -> Value {
    json!({ "inventory_item_data": { "player_stats": { "level": level } } })
}

pub fn inventory_reply(timestamp_ms: i64, items: Vec<Value>) -> Value {
    json!({
        "success": true,
        "inventory_delta": { "new_timestamp_ms": timestamp_ms, "inventory_items": items }
    })
}

/// Companion replies in request order, with `inventory` as the inventory
/// delta.
pub fn companion_replies(companions: Companions, inventory: Value) -> Vec<Value> {
    let mut replies = vec![
        json!({ "show_challenge": false, "challenge_url": "" }),
        json!({ "success": true, "egg_km_walked": [] }),
        inventory,
        json!({ "success": true, "awarded_badges": [] }),
        json!({ "hash": "settings-hash", "settings": { "minimum_client_version": "0.45.0" } }),
    ];
    if companions == Companions::Full {
        replies.push(json!({ "success": true, "candy_earned_count": 0 }));
    }
    replies
}

/// `primary` followed by companions with an empty inventory delta.
pub fn with_companions(primary: Value, companions: Companions) -> Vec<Value> {
    let mut replies = vec![primary];
    replies.extend(companion_replies(companions, inventory_reply(2000, vec![])));
    replies
}

pub fn player_reply(tutorial_state: Vec<i32>) -> Value {
    json!({
        "success": true,
        "player_data": {
            "username": "tester",
            "level": 1,
            "tutorial_state": tutorial_state
        }
    })
}

/// Replies for the whole login and bootstrap sequence.
pub struct LoginScript {
    pub player: Value,
    pub download_templates: bool,
}

impl Default for LoginScript {
    fn default() -> Self {
        Self {
            player: player_reply(vec![0, 1, 3, 4, 7]),
            download_templates: true,
        }
    }
}

impl LoginScript {
    pub fn apply(self, transport: ScriptedTransport) -> ScriptedTransport {
        let mut remote_config = vec![json!({ "result": 1, "item_templates_timestamp_ms": 100 })];
        remote_config.extend(companion_replies(
            Companions::Handshake,
            inventory_reply(1000, vec![item(1, 10), player_stats(5)]),
        ));

        let mut transport = transport
            .reply(vec![])
            .reply(vec![self.player])
            .reply(remote_config)
            .reply(with_companions(
                json!({ "digest": [{ "asset_id": "a" }], "timestamp_ms": 5 }),
                Companions::Handshake,
            ));

        if self.download_templates {
            transport = transport.reply(with_companions(
                json!({ "success": true, "item_templates": [{ "template_id": "T" }], "timestamp_ms": 100 }),
                Companions::Handshake,
            ));
        }

        transport
            .reply(with_companions(
                json!({ "result": 1, "badges": [{ "badge_type": 1 }] }),
                Companions::Full,
            ))
            .reply(with_companions(
                json!({ "result": 1, "items_awarded": [] }),
                Companions::Full,
            ))
            .reply(vec![json!({ "items": [] })])
    }
}
