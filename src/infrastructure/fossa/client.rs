//! FOSSA API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::domain::DomainError;
use crate::domain::onboarding::{ImportedRepos, InvitationError, ServiceClient, ServiceError};
use crate::domain::project::{RemoteTeam, RemoteTeamId};

/// FOSSA client configuration
#[derive(Debug, Clone)]
pub struct FossaConfig {
    /// Base URL of the FOSSA instance, used for both API calls and links
    pub base_url: String,
    /// API token sent as a bearer token
    pub api_token: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl FossaConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://app.fossa.com";

    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_token: api_token.into(),
            timeout_secs: 30,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[derive(Debug, Deserialize)]
struct TeamResponse {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProjectsResponse {
    #[serde(default)]
    projects: Vec<FossaProject>,
    total: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct FossaProject {
    id: String,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

/// ServiceClient backed by the FOSSA REST API
#[derive(Debug, Clone)]
pub struct FossaClient {
    http: Client,
    base_url: String,
    api_token: String,
}

impl FossaClient {
    pub fn new(config: &FossaConfig) -> Result<Self, DomainError> {
        if config.api_token.trim().is_empty() {
            return Err(DomainError::configuration("FOSSA API token is not set"));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Markdown link to an imported project
    fn project_link(&self, project: &FossaProject) -> String {
        let title = project.title.as_deref().unwrap_or(&project.id);

        let href = Url::parse(&self.base_url)
            .ok()
            .and_then(|mut url| {
                url.path_segments_mut()
                    .ok()?
                    .pop_if_empty()
                    .push("projects")
                    .push(&project.id);
                Some(url.to_string())
            })
            .unwrap_or_else(|| format!("{}/projects/{}", self.base_url, project.id));

        format!("[{}]({})", title, href)
    }
}

#[async_trait]
impl ServiceClient for FossaClient {
    async fn create_team(&self, name: &str) -> Result<RemoteTeam, ServiceError> {
        let response = self
            .http
            .post(self.url("/api/teams"))
            .bearer_auth(&self.api_token)
            .json(&json!({ "name": name }))
            .send()
            .await
            .map_err(transport_error)?;

        let response = ensure_success(response).await?;
        let team: TeamResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::decode(format!("team response: {}", e)))?;

        debug!(team_id = team.id, team_name = %team.name, "FOSSA team created");
        Ok(RemoteTeam::new(RemoteTeamId::new(team.id), team.name))
    }

    async fn send_invitation(&self, email: &str) -> Result<(), InvitationError> {
        let response = self
            .http
            .post(self.url("/api/user-invitations"))
            .bearer_auth(&self.api_token)
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(transport_error)?;

        match ensure_success(response).await {
            Ok(_) => Ok(()),
            Err(ServiceError::Api { status, message }) => {
                Err(classify_invitation_error(status, message))
            }
            Err(e) => Err(InvitationError::Service(e)),
        }
    }

    async fn fetch_imported_repos(
        &self,
        team_id: RemoteTeamId,
    ) -> Result<ImportedRepos, ServiceError> {
        let response = self
            .http
            .get(self.url("/api/v2/projects"))
            .bearer_auth(&self.api_token)
            .query(&[("teamId", team_id.value())])
            .send()
            .await
            .map_err(transport_error)?;

        let response = ensure_success(response).await?;
        let body: ProjectsResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::decode(format!("projects response: {}", e)))?;

        let links: Vec<String> = body.projects.iter().map(|p| self.project_link(p)).collect();
        let count = body.total.unwrap_or(links.len()).max(links.len());

        Ok(ImportedRepos::new(count, links))
    }

    fn team_url(&self, team_id: RemoteTeamId) -> String {
        format!(
            "{}/account/settings/organization/teams/{}",
            self.base_url, team_id
        )
    }
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::network("request timed out")
    } else if e.is_connect() {
        ServiceError::network(format!("connection failed: {}", e))
    } else {
        ServiceError::network(format!("request failed: {}", e))
    }
}

/// Pass 2xx responses through, turn anything else into `ServiceError::Api`
async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or(body);

    Err(ServiceError::api(status.as_u16(), message))
}

/// Map FOSSA's invitation rejections onto typed outcomes
fn classify_invitation_error(status: u16, message: String) -> InvitationError {
    let lower = message.to_lowercase();

    if lower.contains("pending invitation") || lower.contains("already invited") {
        InvitationError::AlreadyPending
    } else if lower.contains("already a member") || lower.contains("already exists in") {
        InvitationError::AlreadyMember
    } else {
        InvitationError::Service(ServiceError::api(status, message))
    }
}
