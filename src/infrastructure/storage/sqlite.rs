//! SQLite project repository backed by the maintainer-d database

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::debug;

use crate::domain::DomainError;
use crate::domain::project::{
    Maintainer, MaintainerId, NewServiceTeam, Project, ProjectId, ProjectRepository, RemoteTeam,
    RemoteTeamId, Service, ServiceId, ServiceTeam,
};

/// SQLite storage configuration
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database URL, e.g. `sqlite://maintainers.db`
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://maintainers.db".to_string(),
            max_connections: 5,
            connect_timeout_secs: 30,
        }
    }
}

impl SqliteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }
}

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS maintainers (
        id INTEGER PRIMARY KEY,
        project_id INTEGER NOT NULL REFERENCES projects(id),
        name TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL,
        github_account TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS services (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS service_teams (
        id INTEGER PRIMARY KEY,
        project_id INTEGER NOT NULL REFERENCES projects(id),
        project_name TEXT NOT NULL,
        service_id INTEGER NOT NULL REFERENCES services(id),
        service_team_id INTEGER NOT NULL,
        service_team_name TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (project_id, service_id)
    )
    "#,
];

/// SQLite implementation of ProjectRepository
#[derive(Debug, Clone)]
pub struct SqliteProjectRepository {
    pool: SqlitePool,
}

impl SqliteProjectRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pooled connection to the database
    pub async fn connect(config: &SqliteConfig) -> Result<Self, DomainError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DomainError::configuration(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true);

        // In-memory databases live only as long as their connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to SQLite: {}", e)))?;

        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create any missing tables
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;
        }

        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for SqliteProjectRepository {
    async fn get_project_by_name(&self, name: &str) -> Result<Project, DomainError> {
        let row = sqlx::query("SELECT id, name FROM projects WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get project: {}", e)))?;

        match row {
            Some(row) => row_to_project(&row),
            None => Err(DomainError::not_found(format!(
                "Project '{}' not found",
                name
            ))),
        }
    }

    async fn count_projects(&self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count projects: {}", e)))?;

        Ok(count.max(0) as usize)
    }

    async fn get_maintainers_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Maintainer>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, project_id, name, email, github_account
            FROM maintainers
            WHERE project_id = ?
            ORDER BY id
            "#,
        )
        .bind(project_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get maintainers: {}", e)))?;

        debug!(project_id = %project_id, count = rows.len(), "Fetched maintainers");

        rows.iter().map(row_to_maintainer).collect()
    }

    async fn get_service_by_name(&self, name: &str) -> Result<Option<Service>, DomainError> {
        let row = sqlx::query("SELECT id, name FROM services WHERE lower(name) = lower(?)")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get service: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_service(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_service_team_by_project(
        &self,
        project_id: ProjectId,
        service_id: ServiceId,
    ) -> Result<Option<ServiceTeam>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT project_id, project_name, service_id, service_team_id,
                   service_team_name, created_at
            FROM service_teams
            WHERE project_id = ? AND service_id = ?
            "#,
        )
        .bind(project_id.value())
        .bind(service_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get service team: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_service_team(&row)?)),
            None => Ok(None),
        }
    }

    async fn create_service_team(&self, team: NewServiceTeam) -> Result<ServiceTeam, DomainError> {
        let created = team.into_service_team(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO service_teams (project_id, project_name, service_id,
                                       service_team_id, service_team_name, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(created.project_id().value())
        .bind(created.project_name())
        .bind(created.service_id().value())
        .bind(created.remote_team().id.value())
        .bind(&created.remote_team().name)
        .bind(created.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint") {
                DomainError::storage(format!(
                    "Service team for project '{}' already exists",
                    created.project_name()
                ))
            } else {
                DomainError::storage(format!("Failed to create service team: {}", e))
            }
        })?;

        Ok(created)
    }
}

fn row_to_project(row: &SqliteRow) -> Result<Project, DomainError> {
    let id: i64 = try_get(row, "id")?;
    let name: String = try_get(row, "name")?;
    Ok(Project::new(ProjectId::new(id), name))
}

fn row_to_maintainer(row: &SqliteRow) -> Result<Maintainer, DomainError> {
    let id: i64 = try_get(row, "id")?;
    let project_id: i64 = try_get(row, "project_id")?;
    let name: String = try_get(row, "name")?;
    let email: String = try_get(row, "email")?;
    let github_account: String = try_get(row, "github_account")?;

    Ok(Maintainer::new(
        MaintainerId::new(id),
        ProjectId::new(project_id),
        name,
        email,
        github_account,
    ))
}

fn row_to_service(row: &SqliteRow) -> Result<Service, DomainError> {
    let id: i64 = try_get(row, "id")?;
    let name: String = try_get(row, "name")?;
    Ok(Service::new(ServiceId::new(id), name))
}

fn row_to_service_team(row: &SqliteRow) -> Result<ServiceTeam, DomainError> {
    let project_id: i64 = try_get(row, "project_id")?;
    let project_name: String = try_get(row, "project_name")?;
    let service_id: i64 = try_get(row, "service_id")?;
    let team_id: i64 = try_get(row, "service_team_id")?;
    let team_name: String = try_get(row, "service_team_name")?;
    let created_at: DateTime<Utc> = try_get(row, "created_at")?;

    Ok(ServiceTeam::new(
        ProjectId::new(project_id),
        project_name,
        ServiceId::new(service_id),
        RemoteTeam::new(RemoteTeamId::new(team_id), team_name),
        created_at,
    ))
}

fn try_get<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|e| DomainError::storage(format!("Failed to read column '{}': {}", column, e)))
}
