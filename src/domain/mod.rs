//! Domain layer - Core business logic and entities

pub mod error;
pub mod onboarding;
pub mod project;

pub use error::DomainError;
pub use onboarding::{
    ImportedRepos, InvitationError, InvitationOutcome, PassStatus, ReconciliationAction,
    ReconciliationPass, Reconciler, Runner, ServiceClient, ServiceError, Severity,
};
pub use project::{
    Maintainer, MaintainerId, NewServiceTeam, Project, ProjectId, ProjectRepository, RemoteTeam,
    RemoteTeamId, Service, ServiceId, ServiceTeam,
};
