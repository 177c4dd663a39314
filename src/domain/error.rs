use thiserror::Error;

/// Core domain errors
///
/// These are the local precondition failures that abort a reconciliation pass.
/// Problems on the remote service side never surface here; they are reported
/// as actions instead.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("No maintainers found for project '{project}'")]
    NoMaintainers { project: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn no_maintainers(project: impl Into<String>) -> Self {
        Self::NoMaintainers {
            project: project.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Whether this is a missing-entity error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
