//! Project repository trait

use async_trait::async_trait;

use super::entity::{Maintainer, NewServiceTeam, Project, ProjectId, Service, ServiceId, ServiceTeam};
use crate::domain::DomainError;

/// Read/write access to the local source of truth for project identity
#[async_trait]
pub trait ProjectRepository: Send + Sync + std::fmt::Debug {
    /// Get a project by its exact name, failing with `NotFound` if absent
    async fn get_project_by_name(&self, name: &str) -> Result<Project, DomainError>;

    /// Number of projects in the store
    async fn count_projects(&self) -> Result<usize, DomainError>;

    /// Maintainers of a project, in a stable order
    async fn get_maintainers_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Maintainer>, DomainError>;

    /// Look up a service by name (case-insensitive)
    async fn get_service_by_name(&self, name: &str) -> Result<Option<Service>, DomainError>;

    /// Get the team mapping for a project on a service, if one was recorded
    async fn get_service_team_by_project(
        &self,
        project_id: ProjectId,
        service_id: ServiceId,
    ) -> Result<Option<ServiceTeam>, DomainError>;

    /// Record a newly provisioned remote team
    async fn create_service_team(&self, team: NewServiceTeam) -> Result<ServiceTeam, DomainError>;
}
