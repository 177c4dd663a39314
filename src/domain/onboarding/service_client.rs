//! Contract for the remote compliance service

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use super::invitation::InvitationError;
use crate::domain::project::{RemoteTeam, RemoteTeamId};

/// Failure talking to the remote service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ServiceError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

/// Repositories a team has imported into the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportedRepos {
    /// Total reported by the service; may exceed `links` when paginated
    pub count: usize,
    /// Markdown links to the imported repositories
    pub links: Vec<String>,
}

impl ImportedRepos {
    pub fn new(count: usize, links: Vec<String>) -> Self {
        Self { count, links }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Remote operations needed to onboard a project
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// Create a team named after the project
    async fn create_team(&self, name: &str) -> Result<RemoteTeam, ServiceError>;

    /// Invite a user into the organization by email
    async fn send_invitation(&self, email: &str) -> Result<(), InvitationError>;

    /// List the repositories imported by a team
    async fn fetch_imported_repos(&self, team_id: RemoteTeamId)
    -> Result<ImportedRepos, ServiceError>;

    /// Browser link to a team's settings page
    fn team_url(&self, team_id: RemoteTeamId) -> String;
}
