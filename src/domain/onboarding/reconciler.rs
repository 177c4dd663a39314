//! Onboarding reconciler
//!
//! Given one project's local state, brings the project's representation on the
//! remote service in line with it: provision the team if needed, invite every
//! maintainer, then report what the team has imported so far.

use std::sync::Arc;

use futures::{StreamExt, stream};
use metrics::counter;
use tracing::{debug, info, instrument, warn};

use super::action::{PassStatus, ReconciliationAction, ReconciliationPass};
use super::invitation::InvitationOutcome;
use super::service_client::{ImportedRepos, ServiceClient};
use crate::domain::DomainError;
use crate::domain::project::{
    Maintainer, MaintainerId, NewServiceTeam, Project, ProjectRepository, RemoteTeam, Service,
    ServiceTeam,
};

/// Hours a maintainer has to accept a service invitation
pub const INVITATION_WINDOW_HOURS: u32 = 48;

/// Maximum number of repository links listed in a report line
pub const MAX_LISTED_REPOS: usize = 10;

pub const DEFAULT_INVITATION_CONCURRENCY: usize = 4;

/// Decides and performs the remote operations for one reconciliation pass
pub struct Reconciler {
    client: Arc<dyn ServiceClient>,
    repository: Arc<dyn ProjectRepository>,
    invitation_concurrency: usize,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("repository", &self.repository)
            .field("invitation_concurrency", &self.invitation_concurrency)
            .finish()
    }
}

impl Reconciler {
    pub fn new(client: Arc<dyn ServiceClient>, repository: Arc<dyn ProjectRepository>) -> Self {
        Self {
            client,
            repository,
            invitation_concurrency: DEFAULT_INVITATION_CONCURRENCY,
        }
    }

    /// Bound the number of invitations in flight at once (minimum 1)
    pub fn with_invitation_concurrency(mut self, concurrency: usize) -> Self {
        self.invitation_concurrency = concurrency.max(1);
        self
    }

    /// Run one pass for `project` on `service`
    ///
    /// `maintainers` must be in a deterministic order; invitation actions
    /// follow it exactly. Fails only when there is nobody to invite, in which
    /// case no remote call is made.
    #[instrument(skip_all, fields(project = %project.name(), service = %service.name()))]
    pub async fn reconcile(
        &self,
        service: &Service,
        project: &Project,
        maintainers: &[Maintainer],
        existing_team: Option<ServiceTeam>,
    ) -> Result<ReconciliationPass, DomainError> {
        if maintainers.is_empty() {
            return Err(DomainError::no_maintainers(project.name()));
        }

        let mut actions = Vec::new();

        let team = match existing_team {
            Some(existing) => {
                let team = existing.remote_team().clone();
                debug!(team_id = %team.id, "Team already provisioned");
                actions.push(ReconciliationAction::ok(format!(
                    "[{} team]({}) was already in {}",
                    project.name(),
                    self.client.team_url(team.id),
                    service.name()
                )));
                team
            }
            None => match self.provision_team(service, project, &mut actions).await {
                Some(team) => team,
                None => {
                    return Ok(finish(
                        actions,
                        PassStatus::TeamProvisioningFailed,
                        Vec::new(),
                    ));
                }
            },
        };

        let outcomes = self.invite_maintainers(maintainers).await;
        actions.extend(
            maintainers
                .iter()
                .zip(&outcomes)
                .map(|(maintainer, (_, outcome))| invitation_action(service, maintainer, outcome)),
        );
        actions.push(self.imported_repos_status(service, project, &team).await);

        Ok(finish(actions, PassStatus::Completed, outcomes))
    }

    /// Create the remote team and record it locally
    ///
    /// Returns `None` when the remote call failed; the error action has
    /// already been appended.
    async fn provision_team(
        &self,
        service: &Service,
        project: &Project,
        actions: &mut Vec<ReconciliationAction>,
    ) -> Option<RemoteTeam> {
        let team = match self.client.create_team(project.name()).await {
            Ok(team) => team,
            Err(e) => {
                warn!(error = %e, "Failed to create team");
                actions.push(ReconciliationAction::error(format!(
                    "Problem creating team on {} for {}: {}",
                    service.name(),
                    project.name(),
                    e
                )));
                return None;
            }
        };

        info!(team_id = %team.id, team_name = %team.name, "Team created");
        actions.push(ReconciliationAction::ok(format!(
            "[{} team]({}) has been created in {}",
            team.name,
            self.client.team_url(team.id),
            service.name()
        )));

        let mapping = NewServiceTeam {
            project_id: project.id(),
            project_name: project.name().to_string(),
            service_id: service.id(),
            remote_team: team.clone(),
        };

        // The remote team exists from here on, whatever the local write does.
        if let Err(e) = self.repository.create_service_team(mapping).await {
            warn!(team_id = %team.id, error = %e, "Team created remotely but not recorded locally");
            actions.push(ReconciliationAction::warning(format!(
                "{} team '{}' ({}) was created but could not be recorded locally: {}. \
                 Local records are out of sync and need manual reconciliation",
                service.name(),
                team.name,
                team.id,
                e
            )));
        }

        Some(team)
    }

    async fn invite_maintainers(
        &self,
        maintainers: &[Maintainer],
    ) -> Vec<(MaintainerId, InvitationOutcome)> {
        // `buffered` yields in input order regardless of completion order.
        let outcomes: Vec<(MaintainerId, InvitationOutcome)> = stream::iter(maintainers)
            .map(|maintainer| async move {
                let result = self.client.send_invitation(maintainer.email()).await;
                (maintainer.id(), InvitationOutcome::from(result))
            })
            .buffered(self.invitation_concurrency)
            .collect()
            .await;

        let delivered = outcomes.iter().filter(|(_, o)| o.is_success()).count();
        info!(
            delivered,
            failed = outcomes.len() - delivered,
            "Invitations processed"
        );

        outcomes
    }

    async fn imported_repos_status(
        &self,
        service: &Service,
        project: &Project,
        team: &RemoteTeam,
    ) -> ReconciliationAction {
        match self.client.fetch_imported_repos(team.id).await {
            Ok(repos) if repos.is_empty() => ReconciliationAction::ok(format!(
                "The {} project has not yet imported repos into {}",
                project.name(),
                service.name()
            )),
            Ok(repos) => ReconciliationAction::ok(format!(
                "The {} project team has imported {} repo(s): {}",
                project.name(),
                repos.count,
                list_repos(&repos)
            )),
            Err(e) => {
                warn!(team_id = %team.id, error = %e, "Failed to fetch imported repos");
                ReconciliationAction::warning(format!(
                    "Could not check imported repos on {} for {}: {}",
                    service.name(),
                    project.name(),
                    e
                ))
            }
        }
    }
}

fn invitation_action(
    service: &Service,
    maintainer: &Maintainer,
    outcome: &InvitationOutcome,
) -> ReconciliationAction {
    let handle = maintainer.handle();

    match outcome {
        InvitationOutcome::Sent => ReconciliationAction::ok(format!(
            "{}: you have been invited to join {}. Please check your registered email and \
             accept the invitation within {} hours.",
            handle,
            service.name(),
            INVITATION_WINDOW_HOURS
        )),
        InvitationOutcome::AlreadyPending => ReconciliationAction::ok(format!(
            "{}: you have a pending invitation to join {}. Please check your registered email \
             and accept the invitation within {} hours.",
            handle,
            service.name(),
            INVITATION_WINDOW_HOURS
        )),
        InvitationOutcome::AlreadyMember => {
            debug!(maintainer = %handle, "Maintainer is already a member");
            ReconciliationAction::ok(format!(
                "{}: you are already a {} user",
                handle,
                service.name()
            ))
        }
        InvitationOutcome::Failed(e) => {
            warn!(maintainer = %handle, error = %e, "Failed to send invitation");
            ReconciliationAction::warning(format!(
                "{}: there was a problem sending a {} invitation to you: {}",
                handle,
                service.name(),
                e
            ))
        }
    }
}

fn list_repos(repos: &ImportedRepos) -> String {
    let listed: Vec<&str> = repos
        .links
        .iter()
        .take(MAX_LISTED_REPOS)
        .map(String::as_str)
        .collect();
    let remaining = repos.count.saturating_sub(listed.len());

    match (listed.is_empty(), remaining) {
        (_, 0) => listed.join(", "),
        (true, remaining) => format!("{} more", remaining),
        (false, remaining) => format!("{} and {} more", listed.join(", "), remaining),
    }
}

fn finish(
    actions: Vec<ReconciliationAction>,
    status: PassStatus,
    invitations: Vec<(MaintainerId, InvitationOutcome)>,
) -> ReconciliationPass {
    for action in &actions {
        counter!("onboarding_actions_total", "severity" => action.severity.as_str()).increment(1);
    }
    counter!("onboarding_passes_total", "status" => status.as_str()).increment(1);

    ReconciliationPass {
        actions,
        status,
        invitations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::onboarding::action::Severity;
    use crate::domain::onboarding::invitation::InvitationError;
    use crate::domain::onboarding::service_client::{MockServiceClient, ServiceError};
    use crate::domain::project::{
        MaintainerId, MockProjectRepository, ProjectId, RemoteTeamId, ServiceId,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;

    fn fossa() -> Service {
        Service::new(ServiceId::new(1), "FOSSA")
    }

    fn project() -> Project {
        Project::new(ProjectId::new(10), "envoy")
    }

    fn maintainer(id: i64, handle: &str) -> Maintainer {
        Maintainer::new(
            MaintainerId::new(id),
            ProjectId::new(10),
            handle.to_uppercase(),
            format!("{}@example.org", handle),
            handle,
        )
    }

    fn existing_team() -> ServiceTeam {
        ServiceTeam::new(
            ProjectId::new(10),
            "envoy",
            ServiceId::new(1),
            RemoteTeam::new(RemoteTeamId::new(42), "envoy"),
            Utc::now(),
        )
    }

    fn client() -> MockServiceClient {
        let mut client = MockServiceClient::new();
        client
            .expect_team_url()
            .returning(|id| format!("https://app.fossa.com/teams/{}", id));
        client
    }

    fn reconciler(client: MockServiceClient, repository: Arc<MockProjectRepository>) -> Reconciler {
        Reconciler::new(Arc::new(client), repository)
    }

    #[tokio::test]
    async fn test_no_maintainers_makes_no_remote_calls() {
        let mut client = MockServiceClient::new();
        client.expect_create_team().never();
        client.expect_send_invitation().never();
        client.expect_fetch_imported_repos().never();
        client.expect_team_url().never();

        let repository = Arc::new(MockProjectRepository::new());
        let reconciler = reconciler(client, repository.clone());

        let err = reconciler
            .reconcile(&fossa(), &project(), &[], None)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NoMaintainers { .. }));
        assert_eq!(repository.service_team_writes(), 0);
    }

    #[tokio::test]
    async fn test_existing_team_is_not_recreated() {
        let mut client = client();
        client.expect_create_team().never();
        client.expect_send_invitation().times(1).returning(|_| Ok(()));
        client
            .expect_fetch_imported_repos()
            .times(1)
            .returning(|_| Ok(ImportedRepos::default()));

        let repository = Arc::new(MockProjectRepository::new());
        let reconciler = reconciler(client, repository.clone());

        let pass = reconciler
            .reconcile(&fossa(), &project(), &[maintainer(1, "ay")], Some(existing_team()))
            .await
            .unwrap();

        assert_eq!(pass.status, PassStatus::Completed);
        assert!(pass.actions[0].message.contains("was already in FOSSA"));
        assert!(pass.actions[0].message.contains("/teams/42"));
        assert_eq!(repository.service_team_writes(), 0);
    }

    #[tokio::test]
    async fn test_missing_team_is_created_and_recorded_once() {
        let mut client = client();
        client
            .expect_create_team()
            .times(1)
            .returning(|name| Ok(RemoteTeam::new(RemoteTeamId::new(77), name)));
        client.expect_send_invitation().returning(|_| Ok(()));
        client
            .expect_fetch_imported_repos()
            .withf(|id| *id == RemoteTeamId::new(77))
            .returning(|_| Ok(ImportedRepos::default()));

        let repository = Arc::new(MockProjectRepository::new());
        let reconciler = reconciler(client, repository.clone());

        let pass = reconciler
            .reconcile(&fossa(), &project(), &[maintainer(1, "ay")], None)
            .await
            .unwrap();

        assert_eq!(repository.service_team_writes(), 1);
        assert_eq!(pass.actions.len(), 3);
        assert_eq!(pass.actions[0].severity, Severity::Ok);
        assert!(pass.actions[0].message.contains("has been created in FOSSA"));

        let recorded = repository
            .get_service_team_by_project(ProjectId::new(10), ServiceId::new(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(recorded.remote_team().id, RemoteTeamId::new(77));
    }

    #[tokio::test]
    async fn test_local_write_failure_reports_drift_and_continues() {
        let mut client = client();
        client
            .expect_create_team()
            .times(1)
            .returning(|name| Ok(RemoteTeam::new(RemoteTeamId::new(77), name)));
        client.expect_send_invitation().times(1).returning(|_| Ok(()));
        client
            .expect_fetch_imported_repos()
            .times(1)
            .returning(|_| Ok(ImportedRepos::default()));

        let repository = Arc::new(MockProjectRepository::new().failing_service_team_writes());
        let reconciler = reconciler(client, repository.clone());

        let pass = reconciler
            .reconcile(&fossa(), &project(), &[maintainer(1, "ay")], None)
            .await
            .unwrap();

        assert_eq!(pass.status, PassStatus::Completed);
        assert_eq!(pass.actions.len(), 4);
        assert_eq!(pass.actions[1].severity, Severity::Warning);
        assert!(pass.actions[1].message.contains("could not be recorded locally"));
        assert!(pass.actions[1].message.contains("database is locked"));
        assert_eq!(repository.service_team_writes(), 1);
    }

    #[tokio::test]
    async fn test_team_creation_failure_stops_the_pass() {
        let mut client = client();
        client
            .expect_create_team()
            .times(1)
            .returning(|_| Err(ServiceError::network("connection refused")));
        client.expect_send_invitation().never();
        client.expect_fetch_imported_repos().never();

        let repository = Arc::new(MockProjectRepository::new());
        let reconciler = reconciler(client, repository.clone());

        let pass = reconciler
            .reconcile(
                &fossa(),
                &project(),
                &[maintainer(1, "ay"), maintainer(2, "bee")],
                None,
            )
            .await
            .unwrap();

        assert_eq!(pass.status, PassStatus::TeamProvisioningFailed);
        assert_eq!(pass.actions.len(), 1);
        assert_eq!(pass.actions[0].severity, Severity::Error);
        assert!(pass.actions[0].message.contains("connection refused"));
        assert!(pass.invitations.is_empty());
        assert_eq!(repository.service_team_writes(), 0);
    }

    #[tokio::test]
    async fn test_invitation_failure_does_not_block_others() {
        let mut client = client();
        client
            .expect_send_invitation()
            .times(3)
            .returning(|email| {
                if email == "bee@example.org" {
                    Err(InvitationError::Service(ServiceError::api(500, "boom")))
                } else {
                    Ok(())
                }
            });
        client
            .expect_fetch_imported_repos()
            .returning(|_| Ok(ImportedRepos::default()));

        let reconciler = reconciler(client, Arc::new(MockProjectRepository::new()));
        let maintainers = [maintainer(1, "ay"), maintainer(2, "bee"), maintainer(3, "cee")];

        let pass = reconciler
            .reconcile(&fossa(), &project(), &maintainers, Some(existing_team()))
            .await
            .unwrap();

        let invites = &pass.actions[1..4];
        assert!(invites[0].message.starts_with("@ay:"));
        assert_eq!(invites[0].severity, Severity::Ok);
        assert!(invites[1].message.starts_with("@bee:"));
        assert_eq!(invites[1].severity, Severity::Warning);
        assert!(invites[1].message.contains("HTTP 500: boom"));
        assert!(invites[2].message.starts_with("@cee:"));
        assert_eq!(invites[2].severity, Severity::Ok);
        assert_eq!(pass.failed_invitations(), vec![MaintainerId::new(2)]);
        assert_eq!(pass.status, PassStatus::Completed);
    }

    #[tokio::test]
    async fn test_invitation_outcomes_are_distinguished() {
        let mut client = client();
        client.expect_send_invitation().returning(|email| match email {
            "ay@example.org" => Err(InvitationError::AlreadyPending),
            "bee@example.org" => Err(InvitationError::AlreadyMember),
            _ => Ok(()),
        });
        client
            .expect_fetch_imported_repos()
            .returning(|_| Ok(ImportedRepos::default()));

        let reconciler = reconciler(client, Arc::new(MockProjectRepository::new()));
        let maintainers = [maintainer(1, "ay"), maintainer(2, "bee"), maintainer(3, "cee")];

        let pass = reconciler
            .reconcile(&fossa(), &project(), &maintainers, Some(existing_team()))
            .await
            .unwrap();

        assert!(pass.actions[1].message.contains("pending invitation"));
        assert!(pass.actions[1].message.contains("48 hours"));
        assert!(pass.actions[2].message.contains("already a FOSSA user"));
        assert!(pass.actions[3].message.contains("have been invited"));
        assert!(pass.actions[3].message.contains("48 hours"));
        assert_eq!(pass.count(Severity::Warning), 0);

        assert_eq!(
            pass.invitations,
            vec![
                (MaintainerId::new(1), InvitationOutcome::AlreadyPending),
                (MaintainerId::new(2), InvitationOutcome::AlreadyMember),
                (MaintainerId::new(3), InvitationOutcome::Sent),
            ]
        );
        assert_eq!(pass.existing_members(), vec![MaintainerId::new(2)]);
    }

    #[tokio::test]
    async fn test_imported_repos_are_listed() {
        let mut client = client();
        client.expect_send_invitation().returning(|_| Ok(()));
        client.expect_fetch_imported_repos().returning(|_| {
            Ok(ImportedRepos::new(
                2,
                vec!["[envoy](https://x/1)".to_string(), "[go-control-plane](https://x/2)".to_string()],
            ))
        });

        let reconciler = reconciler(client, Arc::new(MockProjectRepository::new()));

        let pass = reconciler
            .reconcile(&fossa(), &project(), &[maintainer(1, "ay")], Some(existing_team()))
            .await
            .unwrap();

        let last = pass.actions.last().unwrap();
        assert_eq!(last.severity, Severity::Ok);
        assert_eq!(
            last.message,
            "The envoy project team has imported 2 repo(s): [envoy](https://x/1), [go-control-plane](https://x/2)"
        );
    }

    #[test]
    fn test_imported_repo_listing_is_capped() {
        let links: Vec<String> = (0..15).map(|i| format!("repo-{}", i)).collect();
        let repos = ImportedRepos::new(15, links);

        let listed = list_repos(&repos);
        assert!(listed.starts_with("repo-0, repo-1"));
        assert!(listed.contains("repo-9"));
        assert!(!listed.contains("repo-10"));
        assert!(listed.ends_with("and 5 more"));
    }

    #[test]
    fn test_imported_repo_count_without_links() {
        assert_eq!(list_repos(&ImportedRepos::new(3, vec![])), "3 more");
        assert_eq!(
            list_repos(&ImportedRepos::new(1, vec!["[envoy](https://x/1)".to_string()])),
            "[envoy](https://x/1)"
        );
    }

    #[tokio::test]
    async fn test_imported_repos_failure_is_a_warning() {
        let mut client = client();
        client.expect_send_invitation().returning(|_| Ok(()));
        client
            .expect_fetch_imported_repos()
            .returning(|_| Err(ServiceError::api(503, "unavailable")));

        let reconciler = reconciler(client, Arc::new(MockProjectRepository::new()));

        let pass = reconciler
            .reconcile(&fossa(), &project(), &[maintainer(1, "ay")], Some(existing_team()))
            .await
            .unwrap();

        let last = pass.actions.last().unwrap();
        assert_eq!(last.severity, Severity::Warning);
        assert!(last.message.contains("unavailable"));
        assert_eq!(pass.status, PassStatus::Completed);
    }

    /// Fake whose invitations finish in reverse order of submission
    struct SlowInviteClient;

    #[async_trait]
    impl ServiceClient for SlowInviteClient {
        async fn create_team(&self, name: &str) -> Result<RemoteTeam, ServiceError> {
            Ok(RemoteTeam::new(RemoteTeamId::new(1), name))
        }

        async fn send_invitation(&self, email: &str) -> Result<(), InvitationError> {
            let delay = match email {
                "ay@example.org" => 60,
                "bee@example.org" => 30,
                _ => 1,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(())
        }

        async fn fetch_imported_repos(
            &self,
            _team_id: RemoteTeamId,
        ) -> Result<ImportedRepos, ServiceError> {
            Ok(ImportedRepos::default())
        }

        fn team_url(&self, team_id: RemoteTeamId) -> String {
            format!("https://example.org/teams/{}", team_id)
        }
    }

    #[tokio::test]
    async fn test_concurrent_invitations_keep_maintainer_order() {
        let reconciler = Reconciler::new(
            Arc::new(SlowInviteClient),
            Arc::new(MockProjectRepository::new()),
        )
        .with_invitation_concurrency(3);
        let maintainers = [maintainer(1, "ay"), maintainer(2, "bee"), maintainer(3, "cee")];

        let first = reconciler
            .reconcile(&fossa(), &project(), &maintainers, Some(existing_team()))
            .await
            .unwrap();
        let second = reconciler
            .reconcile(&fossa(), &project(), &maintainers, Some(existing_team()))
            .await
            .unwrap();

        assert!(first.actions[1].message.starts_with("@ay:"));
        assert!(first.actions[2].message.starts_with("@bee:"));
        assert!(first.actions[3].message.starts_with("@cee:"));
        let ids: Vec<MaintainerId> = first.invitations.iter().map(|(id, _)| *id).collect();
        assert_eq!(
            ids,
            vec![MaintainerId::new(1), MaintainerId::new(2), MaintainerId::new(3)]
        );
        assert_eq!(first.report(), second.report());
    }

    #[test]
    fn test_concurrency_has_a_floor() {
        let reconciler = Reconciler::new(
            Arc::new(SlowInviteClient),
            Arc::new(MockProjectRepository::new()),
        )
        .with_invitation_concurrency(0);
        assert_eq!(reconciler.invitation_concurrency, 1);
    }
}
