//! Project domain module
//!
//! Projects, their maintainers and the per-service team mappings form the
//! local source of truth that onboarding reconciles against.

mod entity;
mod repository;

pub use entity::{
    Maintainer, MaintainerId, NewServiceTeam, Project, ProjectId, RemoteTeam, RemoteTeamId,
    Service, ServiceId, ServiceTeam,
};
pub use repository::ProjectRepository;

#[cfg(test)]
pub use repository::mock::MockProjectRepository;
