//! Onboarding domain module
//!
//! Reconciles a project's state on a remote compliance service against the
//! local store and produces an ordered action log.

mod action;
mod invitation;
mod reconciler;
mod runner;
mod service_client;

pub use action::{PassStatus, ReconciliationAction, ReconciliationPass, Severity};
pub use invitation::{InvitationError, InvitationOutcome};
pub use reconciler::{
    DEFAULT_INVITATION_CONCURRENCY, INVITATION_WINDOW_HOURS, MAX_LISTED_REPOS, Reconciler,
};
pub use runner::Runner;
pub use service_client::{ImportedRepos, ServiceClient, ServiceError};

#[cfg(test)]
pub use service_client::MockServiceClient;
