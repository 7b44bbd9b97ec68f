//! Failure classification.
//!
//! A pure mapping from an `AgentError` to what the controller does next. The
//! network marker table is matched by substring against transport messages
//! and must stay exactly as listed.

use crate::error::{AgentError, ReconcileError, TransportError};

/// What to do about a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Stop the agent.
    Fatal,
    /// Mark the egress point bad so a new one is picked, then stop.
    NetworkRotate,
    /// Hand the challenge to an operator, verify once, then stop.
    ChallengeEscalate { url: String },
    /// Log and keep going.
    LogAndContinue,
}

/// Transport message fragments that mean the egress point is unusable.
pub const NETWORK_ROTATE_MARKERS: &[&str] = &[
    // no connection
    "tunneling socket could not be established",
    // proxy blocked by the login server
    "Unexpected response received from PTC login",
    // ip probably banned
    "Status code 403",
    "socket hang up",
    "ECONNRESET",
    // trailing space is significant
    "ECONNREFUSED ",
];

/// Error code that always means a reset connection.
pub const CONNECTION_RESET_CODE: &str = "ECONNRESET";

pub fn classify(error: &AgentError) -> RecoveryAction {
    match error {
        AgentError::Reconcile(ReconcileError::AccountBanned) => RecoveryAction::Fatal,
        AgentError::Reconcile(ReconcileError::UnsupportedVersion { .. }) => RecoveryAction::Fatal,
        AgentError::Reconcile(ReconcileError::ChallengeRequired { url }) => {
            RecoveryAction::ChallengeEscalate { url: url.clone() }
        }
        AgentError::Transport(e) if is_network_failure(e) => RecoveryAction::NetworkRotate,
        AgentError::Transport(_) => RecoveryAction::Fatal,
        AgentError::InvalidProxy => RecoveryAction::NetworkRotate,
        AgentError::Config(_) => RecoveryAction::Fatal,
        AgentError::SoftAction { .. } => RecoveryAction::LogAndContinue,
    }
}

/// Classification once the agent is walking. Transport failures that match
/// no network marker are logged and the walk goes on; everything else is
/// classified as during login.
pub fn classify_in_steady_state(error: &AgentError) -> RecoveryAction {
    match error {
        AgentError::Transport(e) if !is_network_failure(e) => RecoveryAction::LogAndContinue,
        _ => classify(error),
    }
}

pub fn is_network_failure(error: &TransportError) -> bool {
    error.code.as_deref() == Some(CONNECTION_RESET_CODE) || matches_network_marker(&error.message)
}

/// True when `message` carries one of the network markers.
pub fn matches_network_marker(message: &str) -> bool {
    NETWORK_ROTATE_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
