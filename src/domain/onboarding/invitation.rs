//! Invitation outcomes

use thiserror::Error;

use super::service_client::ServiceError;

/// Why an invitation was not sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvitationError {
    #[error("an invitation is already pending")]
    AlreadyPending,

    #[error("user is already a member")]
    AlreadyMember,

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Result of inviting one maintainer during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvitationOutcome {
    Sent,
    AlreadyPending,
    /// The user already belongs to the organization. Adding them to the
    /// project team is a separate operation callers may issue next.
    AlreadyMember,
    Failed(ServiceError),
}

impl InvitationOutcome {
    /// Whether the maintainer now has (or will have) access once they act
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

impl From<Result<(), InvitationError>> for InvitationOutcome {
    fn from(result: Result<(), InvitationError>) -> Self {
        match result {
            Ok(()) => Self::Sent,
            Err(InvitationError::AlreadyPending) => Self::AlreadyPending,
            Err(InvitationError::AlreadyMember) => Self::AlreadyMember,
            Err(InvitationError::Service(e)) => Self::Failed(e),
        }
    }
}
