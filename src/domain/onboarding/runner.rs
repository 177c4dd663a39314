//! Onboarding runner
//!
//! Loads a project's state from the repository, runs the reconciler and
//! renders the result as report lines.

use std::sync::Arc;

use tracing::{info, instrument};

use super::reconciler::Reconciler;
use crate::domain::DomainError;
use crate::domain::project::ProjectRepository;

/// Drives a reconciliation pass for a named project
#[derive(Debug)]
pub struct Runner {
    repository: Arc<dyn ProjectRepository>,
    reconciler: Reconciler,
    service_name: String,
}

impl Runner {
    pub fn new(
        repository: Arc<dyn ProjectRepository>,
        reconciler: Reconciler,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            reconciler,
            service_name: service_name.into(),
        }
    }

    /// Run one pass and return its report
    ///
    /// Local precondition failures (unknown project or service, no
    /// maintainers, unreadable store) are returned as errors with no report.
    /// Everything that goes wrong on the remote side is part of the report.
    #[instrument(skip(self), fields(service = %self.service_name))]
    pub async fn run(&self, project_name: &str) -> Result<Vec<String>, DomainError> {
        let project_count = self.repository.count_projects().await?;
        info!(project_count, "Loaded project list");

        let project = self.repository.get_project_by_name(project_name).await?;

        let service = self
            .repository
            .get_service_by_name(&self.service_name)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("Service '{}' not found", self.service_name))
            })?;

        let maintainers = self
            .repository
            .get_maintainers_by_project(project.id())
            .await?;
        info!(maintainers = maintainers.len(), "Loaded maintainers");

        let existing_team = self
            .repository
            .get_service_team_by_project(project.id(), service.id())
            .await?;

        info!(
            project = %project.name(),
            team_exists = existing_team.is_some(),
            "Onboarding project"
        );

        let pass = self
            .reconciler
            .reconcile(&service, &project, &maintainers, existing_team)
            .await?;

        info!(status = pass.status.as_str(), actions = pass.actions.len(), "Reconciliation finished");

        Ok(pass.report())
    }
}
