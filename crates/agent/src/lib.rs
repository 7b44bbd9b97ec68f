//! Roamer Agent
//!
//! The protocol-driven core of the agent:
//! - `reconcile`: folds decoded response batches into the session state
//! - `controller`: builds request batches, injects companion calls, drives
//!   the login, bootstrap and steady-state phases
//! - `recovery`: maps failures to recovery actions
//!
//! # Architecture Constraints
//!
//! - One request batch in flight at a time. The controller owns the session
//!   state and every collaborator, so `&mut self` enforces single-flight.
//! - Every batch is reconciled before the next one is built.
//! - Transport encoding, path simulation, proxy selection, UI sockets and
//!   challenge solving live behind the traits in `services`.
//! - `Fatal`, `NetworkRotate` and `ChallengeEscalate` end `Controller::run`;
//!   the embedding binary decides what to do with the returned `Shutdown`.

#![deny(unsafe_code)]

pub mod config;
pub mod controller;
pub mod error;
pub mod reconcile;
pub mod recovery;
pub mod services;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use config::AgentConfig;
pub use controller::{Companions, Controller, Phase, RefreshTrigger, Shutdown, map_refresh_due};
pub use error::{AgentError, ConfigError, ReconcileError, TransportError};
pub use reconcile::{CallOutcome, Reconciler};
pub use recovery::RecoveryAction;
pub use services::{
    AssetFetcher, ChallengeResolver, ProxyValidator, Services, Transport, UiBroadcaster, Walker,
};
