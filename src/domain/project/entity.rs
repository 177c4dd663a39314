//! Project, maintainer and service-team entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Local project identifier
    ProjectId
);
numeric_id!(
    /// Local maintainer identifier
    MaintainerId
);
numeric_id!(
    /// Local identifier of an onboarding service (e.g. FOSSA)
    ServiceId
);
numeric_id!(
    /// Team identifier assigned by the remote service
    RemoteTeamId
);

/// An open-source project known to the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    name: String,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A project maintainer
///
/// Each maintainer belongs to exactly one project. The email is where service
/// invitations are sent; the GitHub account is how the report addresses them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintainer {
    id: MaintainerId,
    project_id: ProjectId,
    name: String,
    email: String,
    github_account: String,
}

impl Maintainer {
    pub fn new(
        id: MaintainerId,
        project_id: ProjectId,
        name: impl Into<String>,
        email: impl Into<String>,
        github_account: impl Into<String>,
    ) -> Self {
        Self {
            id,
            project_id,
            name: name.into(),
            email: email.into(),
            github_account: github_account.into(),
        }
    }

    pub fn id(&self) -> MaintainerId {
        self.id
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn github_account(&self) -> &str {
        &self.github_account
    }

    /// Handle used when addressing the maintainer in a report line
    pub fn handle(&self) -> String {
        format!("@{}", self.github_account.trim_start_matches('@'))
    }
}

/// An onboarding target such as FOSSA
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    id: ServiceId,
    name: String,
}

impl Service {
    pub fn new(id: ServiceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> ServiceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Team provisioned on the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTeam {
    pub id: RemoteTeamId,
    pub name: String,
}

impl RemoteTeam {
    pub fn new(id: RemoteTeamId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Local mirror of a project's team on a service
///
/// At most one exists per (project, service). Its presence means the remote
/// team has already been provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTeam {
    project_id: ProjectId,
    project_name: String,
    service_id: ServiceId,
    remote_team: RemoteTeam,
    created_at: DateTime<Utc>,
}

impl ServiceTeam {
    pub fn new(
        project_id: ProjectId,
        project_name: impl Into<String>,
        service_id: ServiceId,
        remote_team: RemoteTeam,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            project_id,
            project_name: project_name.into(),
            service_id,
            remote_team,
            created_at,
        }
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn service_id(&self) -> ServiceId {
        self.service_id
    }

    pub fn remote_team(&self) -> &RemoteTeam {
        &self.remote_team
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Write request for a new service-team mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewServiceTeam {
    pub project_id: ProjectId,
    pub project_name: String,
    pub service_id: ServiceId,
    pub remote_team: RemoteTeam,
}

impl NewServiceTeam {
    /// Materialize the mapping with the given creation timestamp
    pub fn into_service_team(self, created_at: DateTime<Utc>) -> ServiceTeam {
        ServiceTeam::new(
            self.project_id,
            self.project_name,
            self.service_id,
            self.remote_team,
            created_at,
        )
    }
}
