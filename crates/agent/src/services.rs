//! Collaborator interfaces.
//!
//! Everything the controller talks to besides the session state: the RPC
//! transport, the path walker, proxy handling, the UI push channel, manual
//! challenge solving, asset prefetching and persistence.

use std::collections::BTreeSet;

use async_trait::async_trait;
use roamer_journal::StateStore;
use roamer_state::{CatchableCreature, Fort, Position, SessionState, SpeciesId};
use roamer_wire::{Batch, RawResponse};

use crate::config::Credentials;
use crate::error::TransportError;

/// Batched RPC client. Encodes calls, signs requests and decodes responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Log in and return an auth token.
    async fn authenticate(&mut self, credentials: &Credentials) -> Result<String, TransportError>;

    /// Attach the token and prepare the session. Issues no calls.
    async fn init(&mut self, token: &str) -> Result<(), TransportError>;

    /// Position reported with every following request.
    fn set_position(&mut self, position: &Position);

    /// Map cells covering `position`.
    fn cell_ids(&self, position: &Position) -> Vec<u64>;

    /// Send a batch and return one decoded response per call, in order.
    async fn batch_call(&mut self, batch: Batch) -> Result<Vec<RawResponse>, TransportError>;

    fn batch_start(&self) -> Batch {
        Batch::new()
    }
}

/// Path simulation.
#[async_trait]
pub trait Walker: Send + Sync {
    /// Plan a new route if needed and return its waypoints.
    async fn check_path(&mut self, state: &mut SessionState) -> Option<Vec<Position>>;

    /// Advance `state.position` along the route.
    async fn walk(&mut self, state: &mut SessionState);

    /// Meters between two points.
    fn distance(&self, from: &Position, to: &Position) -> f64 {
        from.distance_to(to)
    }

    /// Slightly jittered copy of `position`.
    fn fuzzed_location(&mut self, position: &Position) -> Position;

    /// Ground altitude at `position`.
    async fn altitude(&mut self, position: &Position) -> f64;
}

#[async_trait]
pub trait ProxyValidator: Send + Sync {
    /// True when the current egress point works, or when none is configured.
    async fn check_proxy(&mut self) -> bool;

    /// Mark the current egress point as unusable.
    fn bad_proxy(&mut self);

    fn is_configured(&self) -> bool;
}

/// Fire-and-forget UI pushes.
pub trait UiBroadcaster: Send + Sync {
    fn ready(&self);
    fn send_position(&self, position: &Position);
    fn send_stops(&self, stops: &[Fort]);
    fn send_route(&self, waypoints: &[Position]);
    fn send_visited_stop(&self, stop: &Fort);
    fn send_creature_caught(&self, creature: &CatchableCreature);
}

#[async_trait]
pub trait ChallengeResolver: Send + Sync {
    /// Let an operator solve the challenge at `url`. `None` when abandoned.
    async fn solve_manual(&mut self, url: &str) -> Option<String>;
}

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn prefetch_for_species(&mut self, species: &BTreeSet<SpeciesId>);
}

/// Every collaborator the controller owns.
pub struct Services {
    pub transport: Box<dyn Transport>,
    pub walker: Box<dyn Walker>,
    pub proxy: Box<dyn ProxyValidator>,
    pub ui: Box<dyn UiBroadcaster>,
    pub challenge: Box<dyn ChallengeResolver>,
    pub assets: Box<dyn AssetFetcher>,
    pub store: Box<dyn StateStore>,
}
