//! Reconciliation actions and pass results

use serde::Serialize;

use super::invitation::InvitationOutcome;
use crate::domain::project::MaintainerId;

/// Severity of a reconciliation action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    fn marker(&self) -> &'static str {
        match self {
            Self::Ok => "✅",
            Self::Warning => "⚠️",
            Self::Error => "❌",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a pass's action log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationAction {
    pub severity: Severity,
    pub message: String,
}

impl ReconciliationAction {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Ok,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ReconciliationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.severity.marker(), self.message)
    }
}

/// How far a pass got
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    /// Every step ran; individual steps may still have reported warnings
    Completed,
    /// The remote team could not be created, so nothing after the team step ran
    TeamProvisioningFailed,
}

impl PassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::TeamProvisioningFailed => "team_provisioning_failed",
        }
    }
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationPass {
    pub actions: Vec<ReconciliationAction>,
    pub status: PassStatus,
    /// Typed invitation results in maintainer order; empty when the team
    /// step failed
    #[serde(skip)]
    pub invitations: Vec<(MaintainerId, InvitationOutcome)>,
}

impl ReconciliationPass {
    /// Render the action log as report lines, in order
    pub fn report(&self) -> Vec<String> {
        self.actions.iter().map(ToString::to_string).collect()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.actions.iter().filter(|a| a.severity == severity).count()
    }

    /// Maintainers who already belong to the service and can be added to
    /// the project team directly
    pub fn existing_members(&self) -> Vec<MaintainerId> {
        self.invitations
            .iter()
            .filter(|(_, outcome)| *outcome == InvitationOutcome::AlreadyMember)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Maintainers whose invitation could not be sent
    pub fn failed_invitations(&self) -> Vec<MaintainerId> {
        self.invitations
            .iter()
            .filter(|(_, outcome)| !outcome.is_success())
            .map(|(id, _)| *id)
            .collect()
    }
}
