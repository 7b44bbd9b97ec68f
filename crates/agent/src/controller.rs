//! Call-sequencing controller.
//!
//! Drives the agent through its phases:
//! - `Login`: proxy check, authentication, first position push, empty call
//! - `Bootstrap`: player, remote config, asset digest, item templates,
//!   tutorial or profile, level-up rewards, store
//! - `SteadyState`: the position update cycle, refreshing the map when the
//!   refresh policy says so and acting on what the map shows
//!
//! Every batch goes out alone and is reconciled before the next one is built.
//! Spins, encounters and incubator calls are serial with a pause in between.

use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use roamer_journal::ItemTemplateCache;
use roamer_state::{
    ApiState, CatchableCreature, CreatureId, Fort, Inventory, ItemId, MapSettings, MapSnapshot,
    Position, SessionState, TimestampMs, TodoAction,
};
use roamer_wire::{Batch, Platform, RESULT_SUCCESS};
use tracing::{debug, error, info, warn};

use crate::config::{AgentConfig, jittered};
use crate::error::AgentError;
use crate::reconcile::{CallOutcome, Reconciler};
use crate::recovery::{self, RecoveryAction};
use crate::services::Services;

// ============================================================================
// Parameters
// ============================================================================

/// Stops closer than this can be spun.
pub const SPIN_RANGE_METERS: f64 = 40.0;

/// Chance per map refresh of dispatching eggs to incubators.
pub const INCUBATOR_PROBABILITY: f64 = 0.3;

/// Tutorial steps the server expects to be marked complete.
pub const TUTORIAL_REQUIRED_STEPS: [i32; 5] = [0, 1, 3, 4, 7];

/// Ball item ids, cheapest first.
pub const BALLS: [ItemId; 4] = [1, 2, 3, 4];

// ============================================================================
// Phases
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Login,
    Bootstrap,
    SteadyState,
    Stopped,
}

/// Why `Controller::run` returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shutdown {
    Fatal { reason: String },
    /// The egress point was marked bad. A restart picks a new one.
    NetworkRotated,
    /// A challenge token was submitted. Restart required.
    ChallengeSubmitted { verified: bool },
}

// ============================================================================
// Companion Calls
// ============================================================================

/// Calls the server expects alongside the primary call of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Companions {
    /// Challenge, hatched eggs, inventory, badges, settings.
    Handshake,
    /// Handshake plus the buddy walk check.
    Full,
}

impl Companions {
    pub fn append(self, batch: Batch, api: &ApiState) -> Batch {
        let batch = batch
            .check_challenge()
            .get_hatched_eggs()
            .get_inventory(api.inventory_timestamp)
            .check_awarded_badges()
            .download_settings(api.settings_hash.clone());

        match self {
            Self::Handshake => batch,
            Self::Full => batch.get_buddy_walked(),
        }
    }
}

// ============================================================================
// Map Refresh Policy
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    NeverFetched,
    MaxIntervalElapsed,
    MovedPastThreshold,
}

/// Decide whether the map needs a refresh.
///
/// Always refresh when there was no previous fetch or the maximum interval
/// has passed. Between the minimum and maximum interval, refresh only after
/// moving farther than the minimum distance.
pub fn map_refresh_due(
    elapsed: Option<Duration>,
    distance_m: f64,
    settings: &MapSettings,
) -> Option<RefreshTrigger> {
    let Some(elapsed) = elapsed else {
        return Some(RefreshTrigger::NeverFetched);
    };
    let seconds = elapsed.as_secs_f64();

    if seconds > settings.get_map_objects_max_refresh_seconds {
        Some(RefreshTrigger::MaxIntervalElapsed)
    } else if seconds > settings.get_map_objects_min_refresh_seconds
        && distance_m > settings.get_map_objects_min_distance_meters
    {
        Some(RefreshTrigger::MovedPastThreshold)
    } else {
        None
    }
}

// ============================================================================
// Map Helpers
// ============================================================================

/// Enabled stops within range whose cooldown has expired.
pub fn spinnable_stops(map: &MapSnapshot, position: &Position, now_ms: TimestampMs) -> Vec<Fort> {
    map.pokestops
        .iter()
        .filter(|stop| stop.enabled && stop.is_cooled_down(now_ms))
        .filter(|stop| position.distance_to(&stop.position()) <= SPIN_RANGE_METERS)
        .cloned()
        .collect()
}

/// Cheapest ball the inventory holds.
pub fn pick_ball(inventory: &Inventory) -> Option<ItemId> {
    BALLS
        .iter()
        .copied()
        .find(|&ball| inventory.item_count(ball) > 0)
}

/// Pair idle incubators with waiting eggs, shortest walk first.
pub fn incubation_plan(inventory: &Inventory) -> Vec<(String, CreatureId)> {
    let mut eggs: Vec<_> = inventory
        .eggs
        .iter()
        .filter(|egg| egg.egg_incubator_id.is_empty())
        .collect();
    eggs.sort_by(|a, b| a.egg_km_walked_target.total_cmp(&b.egg_km_walked_target));

    inventory
        .incubators
        .iter()
        .filter(|incubator| incubator.is_available())
        .zip(eggs)
        .map(|(incubator, egg)| (incubator.id.clone(), egg.id))
        .collect()
}

pub fn missing_tutorial_steps(done: &[i32]) -> Vec<i32> {
    TUTORIAL_REQUIRED_STEPS
        .iter()
        .copied()
        .filter(|step| !done.contains(step))
        .collect()
}

// ============================================================================
// Controller
// ============================================================================

pub struct Controller {
    config: AgentConfig,
    state: SessionState,
    services: Services,
    reconciler: Reconciler,
    phase: Phase,
    rng: StdRng,
}

impl Controller {
    pub fn new(config: AgentConfig, services: Services) -> Self {
        Self::with_rng(config, services, StdRng::from_entropy())
    }

    pub fn with_rng(mut config: AgentConfig, services: Services, mut rng: StdRng) -> Self {
        config.ensure_device_id(&mut rng);
        let state = SessionState::new(Position::new(config.pos.lat, config.pos.lng));
        let reconciler = Reconciler::from_config(&config.api);

        Self {
            config,
            state,
            services,
            reconciler,
            phase: Phase::Login,
            rng,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run until a failure ends the session.
    pub async fn run(&mut self) -> Shutdown {
        if let Err(err) = self.start().await {
            if let Some(shutdown) = self.escalate(err).await {
                return self.stop(shutdown);
            }
        }

        self.phase = Phase::SteadyState;
        loop {
            if let Err(err) = self.position_update_cycle().await {
                if let Some(shutdown) = self.escalate(err).await {
                    return self.stop(shutdown);
                }
                self.pause(self.config.delay.walk).await;
            }
        }
    }

    /// Login, bootstrap and the first map refresh.
    pub async fn start(&mut self) -> Result<(), AgentError> {
        self.config.validate()?;

        self.phase = Phase::Login;
        self.login_flow().await?;

        self.phase = Phase::Bootstrap;
        self.bootstrap().await?;
        info!("Initial flow done.");
        self.services.store.save_state(&self.state).await;
        self.services.ui.ready();

        self.phase = Phase::SteadyState;
        self.pause(self.config.delay.walk).await;
        self.map_refresh().await?;
        self.pause(self.config.delay.walk).await;
        Ok(())
    }

    fn stop(&mut self, shutdown: Shutdown) -> Shutdown {
        self.phase = Phase::Stopped;
        info!(?shutdown, "Exiting.");
        shutdown
    }

    // ------------------------------------------------------------------------
    // Batches
    // ------------------------------------------------------------------------

    async fn call(&mut self, batch: Batch) -> Result<CallOutcome, AgentError> {
        debug!(calls = ?batch.names(), "Batch call");
        let responses = self.services.transport.batch_call(batch).await?;
        Ok(self.reconciler.apply(&mut self.state, responses)?)
    }

    async fn call_with(
        &mut self,
        batch: Batch,
        companions: Companions,
    ) -> Result<CallOutcome, AgentError> {
        let batch = companions.append(batch, &self.state.api);
        self.call(batch).await
    }

    fn batch(&self) -> Batch {
        self.services.transport.batch_start()
    }

    async fn pause(&mut self, seconds: f64) {
        let delay = jittered(seconds, &mut self.rng);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Report the current position, with altitude and a little jitter.
    async fn push_position(&mut self) {
        let altitude = self.services.walker.altitude(&self.state.position).await;
        self.state.position.altitude = altitude;

        let mut reported = self.services.walker.fuzzed_location(&self.state.position);
        reported.altitude = altitude;
        self.services.transport.set_position(&reported);
    }

    // ------------------------------------------------------------------------
    // Login / Bootstrap
    // ------------------------------------------------------------------------

    pub async fn login_flow(&mut self) -> Result<(), AgentError> {
        info!("App starting...");

        let valid = self.services.proxy.check_proxy().await;
        if self.services.proxy.is_configured() && !valid {
            return Err(AgentError::InvalidProxy);
        }

        info!("Login...");
        let token = self
            .services
            .transport
            .authenticate(&self.config.credentials)
            .await?;

        self.push_position().await;

        info!("Init api...");
        self.services.transport.init(&token).await?;

        debug!("First empty request.");
        self.call(self.batch()).await?;
        info!("Logged In.");
        Ok(())
    }

    pub async fn bootstrap(&mut self) -> Result<(), AgentError> {
        info!("Starting initial flow...");
        let api = self.config.api.clone();

        debug!("Get player info...");
        let batch = self.batch().get_player(&api.country, &api.language, &api.timezone);
        self.call(batch).await?;

        debug!("Download remote config...");
        let batch = self
            .batch()
            .download_remote_config_version(Platform::Ios, api.version);
        self.call_with(batch, Companions::Handshake).await?;

        debug!("Get asset digest...");
        let batch = self.batch().get_asset_digest(Platform::Ios, api.version);
        self.call_with(batch, Companions::Handshake).await?;

        self.item_templates().await?;

        debug!("Checking tutorial state...");
        let missing = missing_tutorial_steps(&self.state.player.tutorial_state);
        let batch = if missing.is_empty() {
            self.batch().get_player_profile()
        } else {
            info!(steps = ?missing, "Completing tutorial");
            self.batch().mark_tutorial_complete(missing)
        };
        self.call_with(batch, Companions::Full).await?;

        debug!("Level up rewards...");
        let batch = self.batch().level_up_rewards(self.state.level());
        self.call_with(batch, Companions::Full).await?;

        debug!("Get store...");
        let batch = self.batch().get_store_items();
        self.services.transport.batch_call(batch).await?;
        Ok(())
    }

    /// Load templates from the cache, or download them when the server has
    /// newer ones.
    async fn item_templates(&mut self) -> Result<(), AgentError> {
        let server_timestamp = self.state.api.item_templates_timestamp;

        match self.services.store.load_item_templates().await {
            Some(cache) if cache.is_fresh(server_timestamp) => {
                debug!(timestamp = cache.timestamp_ms, "Using cached item templates");
                self.state.api.item_templates = cache.item_templates;
            }
            _ => {
                debug!("Download item templates...");
                let batch = self.batch().download_item_templates();
                self.call_with(batch, Companions::Handshake).await?;

                let cache = ItemTemplateCache {
                    timestamp_ms: server_timestamp,
                    item_templates: self.state.api.item_templates.clone(),
                };
                self.services.store.save_item_templates(&cache).await;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Steady State
    // ------------------------------------------------------------------------

    /// Walk, report the new position, run at most one queued action and
    /// refresh the map if due.
    pub async fn position_update_cycle(&mut self) -> Result<(), AgentError> {
        if let Some(waypoints) = self.services.walker.check_path(&mut self.state).await {
            self.services.ui.send_route(&waypoints);
        }
        self.services.walker.walk(&mut self.state).await;
        self.push_position().await;
        self.services.ui.send_position(&self.state.position);

        if let Some(action) = self.state.todo.pop_front() {
            if let Err(err) = self.perform_todo(action).await {
                absorb(err)?;
            }
        }

        let distance = self.state.api.last_pos.map_or(0.0, |last| {
            self.services.walker.distance(&self.state.position, &last)
        });
        let settings = self.state.map_settings();
        if let Some(trigger) = map_refresh_due(self.since_last_map(), distance, &settings) {
            debug!(?trigger, distance, "Map refresh due");
            self.map_refresh().await?;
        }

        self.pause(self.config.delay.walk).await;
        Ok(())
    }

    fn since_last_map(&self) -> Option<Duration> {
        self.state
            .api
            .last_gmo
            .map(|at| (Utc::now() - at).to_std().unwrap_or(Duration::ZERO))
    }

    /// Run one queued action. A failed action is dropped, not requeued.
    async fn perform_todo(&mut self, action: TodoAction) -> Result<(), AgentError> {
        debug!(action = action.name(), "Performing requested action");
        let delays = self.config.delay.clone();

        let (batch, delay) = match &action {
            TodoAction::LevelUp => (
                self.batch().level_up_rewards(self.state.level()),
                delays.level_up,
            ),
            TodoAction::ReleaseCreatures { ids } => {
                (self.batch().release_creatures(ids.clone()), delays.release)
            }
            TodoAction::EvolveCreature { id } => (self.batch().evolve_creature(*id), delays.evolve),
            TodoAction::RecycleItems { item_id, count } => {
                (self.batch().recycle_item(*item_id, *count), delays.recycle)
            }
        };

        let outcome = self.call_with(batch, Companions::Full).await?;
        self.pause(delay).await;

        if action == TodoAction::LevelUp {
            return Ok(());
        }
        expect_success(action.name(), &outcome)?;
        info!(action = action.name(), "Action done");
        Ok(())
    }

    /// Fetch the map around the current position and act on it.
    pub async fn map_refresh(&mut self) -> Result<(), AgentError> {
        let position = self.state.position;
        info!(lat = position.lat, lng = position.lng, "Map Refresh");

        let cell_ids = self.services.transport.cell_ids(&position);
        self.state.api.last_gmo = Some(Utc::now());
        self.state.api.last_pos = Some(position);

        let batch = self.batch().get_map_objects(cell_ids);
        self.call_with(batch, Companions::Full).await?;
        self.shadow_ban_checkpoint();
        self.services.store.save_state(&self.state).await;

        let Some(map) = self.state.map.as_ref() else {
            warn!("No map objects in refresh");
            return Ok(());
        };
        let species = map.distinct_species();
        let stops = spinnable_stops(map, &self.state.position, Utc::now().timestamp_millis());
        self.services.assets.prefetch_for_species(&species).await;
        self.services.ui.send_stops(&map.pokestops);

        self.spin_stops(stops).await?;
        self.encounter_creatures().await?;

        if self.rng.gen_bool(INCUBATOR_PROBABILITY) {
            debug!("Dispatch incubators...");
            self.dispatch_incubators().await?;
        }

        self.services.store.save_state(&self.state).await;
        Ok(())
    }

    fn shadow_ban_checkpoint(&self) {
        let species = self
            .state
            .map
            .as_ref()
            .map_or(0, |map| map.distinct_species().len());
        debug!(species, "Shadow-ban check point");
    }

    async fn spin_stops(&mut self, stops: Vec<Fort>) -> Result<(), AgentError> {
        for stop in stops {
            debug!(stop = %stop.id, "spin");
            let batch = self
                .batch()
                .fort_search(&stop.id, stop.latitude, stop.longitude);
            let outcome = self.call_with(batch, Companions::Full).await?;

            if let Some(cooldown) = outcome.cooldown_complete_ms {
                self.record_spin(&stop.id, cooldown);
            }
            self.pause(self.config.delay.spin).await;
        }
        Ok(())
    }

    fn record_spin(&mut self, stop_id: &str, cooldown: TimestampMs) {
        if let Some(stop) = self.state.map.as_mut().and_then(|map| map.stop_mut(stop_id)) {
            stop.cooldown_complete_timestamp_ms = cooldown;
            self.services.ui.send_visited_stop(stop);
        }

        let visited = &mut self.state.path.visited_stops;
        if !visited.iter().any(|id| id == stop_id) {
            visited.push(stop_id.to_string());
        }
    }

    async fn encounter_creatures(&mut self) -> Result<(), AgentError> {
        let targets: Vec<CatchableCreature> = match &self.state.map {
            Some(map) => map
                .catchable_pokemons
                .iter()
                .filter(|c| !self.state.encountered.contains(&c.encounter_id))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        for creature in targets {
            debug!(
                encounter = creature.encounter_id,
                species = creature.pokemon_id,
                "Encounter"
            );
            let batch = self
                .batch()
                .encounter(creature.encounter_id, &creature.spawn_point_id);
            let outcome = self.call_with(batch, Companions::Full).await?;
            self.state.encountered.push(creature.encounter_id);
            self.pause(self.config.delay.encounter).await;

            if outcome.encounter_status != Some(RESULT_SUCCESS) {
                warn!(status = ?outcome.encounter_status, "Encounter failed");
                continue;
            }
            let Some(ball) = self.state.inventory.as_ref().and_then(pick_ball) else {
                warn!("No ball left");
                continue;
            };

            let batch =
                self.batch()
                    .catch_creature(creature.encounter_id, &creature.spawn_point_id, ball);
            let outcome = self.call_with(batch, Companions::Full).await?;
            if outcome.catch_status == Some(RESULT_SUCCESS) {
                info!(
                    species = creature.pokemon_id,
                    id = ?outcome.captured,
                    "Pokemon caught"
                );
                self.services.ui.send_creature_caught(&creature);
            } else {
                warn!(status = ?outcome.catch_status, "Catch failed");
            }
            self.pause(self.config.delay.catch).await;
        }
        Ok(())
    }

    pub async fn dispatch_incubators(&mut self) -> Result<(), AgentError> {
        let plan = self
            .state
            .inventory
            .as_ref()
            .map(incubation_plan)
            .unwrap_or_default();

        for (incubator, egg) in plan {
            let batch = self.batch().use_incubator(&incubator, egg);
            let outcome = self.call_with(batch, Companions::Full).await?;
            match expect_success("useItemEggIncubator", &outcome) {
                Ok(()) => debug!(%incubator, egg, "Egg incubating"),
                Err(err) => warn!(error = %err, "Incubator not started"),
            }
            self.pause(self.config.delay.incubator).await;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------------------

    /// Apply the recovery policy. `None` means keep going.
    pub async fn escalate(&mut self, err: AgentError) -> Option<Shutdown> {
        let action = match self.phase {
            Phase::SteadyState => recovery::classify_in_steady_state(&err),
            _ => recovery::classify(&err),
        };
        match action {
            RecoveryAction::LogAndContinue => {
                warn!(error = %err, "Soft failure");
                None
            }
            RecoveryAction::Fatal => {
                error!(error = %err, "Fatal error");
                Some(Shutdown::Fatal {
                    reason: err.to_string(),
                })
            }
            RecoveryAction::NetworkRotate => {
                error!(error = %err, "Network failure, rotating proxy");
                self.services.proxy.bad_proxy();
                Some(Shutdown::NetworkRotated)
            }
            RecoveryAction::ChallengeEscalate { url } => {
                let verified = self.resolve_challenge(&url).await;
                warn!("Captcha response sent. Please restart.");
                Some(Shutdown::ChallengeSubmitted { verified })
            }
        }
    }

    /// Hand the challenge to the resolver and submit its token once.
    pub async fn resolve_challenge(&mut self, url: &str) -> bool {
        let Some(token) = self.services.challenge.solve_manual(url).await else {
            error!("Token is null");
            return false;
        };

        let batch = self.batch().verify_challenge(&token);
        match self.call_with(batch, Companions::Full).await {
            Ok(outcome) if outcome.challenge_verified == Some(true) => true,
            Ok(_) => {
                error!("Incorrect captcha token sent.");
                false
            }
            Err(err) => {
                error!(error = %err, "Challenge verification failed");
                false
            }
        }
    }
}

fn expect_success(action: &'static str, outcome: &CallOutcome) -> Result<(), AgentError> {
    match outcome.result {
        Some(RESULT_SUCCESS) => Ok(()),
        other => Err(AgentError::SoftAction {
            action,
            result: other.unwrap_or_default(),
        }),
    }
}

/// Swallow failures the policy says to continue past.
fn absorb(err: AgentError) -> Result<(), AgentError> {
    match recovery::classify_in_steady_state(&err) {
        RecoveryAction::LogAndContinue => {
            warn!(error = %err, "Action failed, dropping it");
            Ok(())
        }
        _ => Err(err),
    }
}

// ============================================================================
// Tests
// ============================================================================
