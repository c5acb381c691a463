use crate::application_port::{ErrorKind, UserError};
use crate::domain_model::*;
use std::collections::BTreeSet;

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("Both from_user and to_user are required")]
    MissingUserId,
    #[error("Cannot send friend request to yourself")]
    SelfRequest,
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("friend request {0} not found")]
    RequestNotFound(FriendRequestId),
    #[error("Friend request already sent")]
    AlreadySent,
    #[error("Cannot accept and discard invite at the same time")]
    ConflictingDecision,
    #[error("friend request {0} is already {1}")]
    AlreadyResolved(FriendRequestId, RequestState),
    #[error("these users are not friends")]
    NotFriends,
    #[error("store error: {0}")]
    Store(String),
}

impl RelationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelationError::MissingUserId
            | RelationError::SelfRequest
            | RelationError::ConflictingDecision => ErrorKind::Validation,
            RelationError::UserNotFound(_) | RelationError::RequestNotFound(_) => {
                ErrorKind::NotFound
            }
            RelationError::AlreadySent
            | RelationError::AlreadyResolved(..)
            | RelationError::NotFriends => ErrorKind::Conflict,
            RelationError::Store(_) => ErrorKind::Internal,
        }
    }
}

impl From<UserError> for RelationError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(user_id) => RelationError::UserNotFound(user_id),
            other => RelationError::Store(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateRequestInput {
    pub from_user: Option<UserId>,
    pub to_user: Option<UserId>,
}

/// Result of `create_request`: either a fresh pending request, or the opposite request that
/// was accepted because both users asked for each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Created(FriendRequest),
    Collapsed(FriendRequest),
}

impl RequestOutcome {
    pub fn request(&self) -> &FriendRequest {
        match self {
            RequestOutcome::Created(request) | RequestOutcome::Collapsed(request) => request,
        }
    }

    pub fn into_request(self) -> FriendRequest {
        match self {
            RequestOutcome::Created(request) | RequestOutcome::Collapsed(request) => request,
        }
    }
}

#[async_trait::async_trait]
pub trait RelationshipService: Send + Sync {
    async fn create_request(
        &self,
        input: CreateRequestInput,
    ) -> Result<RequestOutcome, RelationError>;
    async fn list_pending(&self, user_id: UserId) -> Result<Vec<FriendRequest>, RelationError>;
    async fn manipulate_request(
        &self,
        request_id: FriendRequestId,
        decision: RequestDecision,
    ) -> Result<FriendRequest, RelationError>;
    async fn list_friend_ids(&self, user_id: UserId) -> Result<BTreeSet<UserId>, RelationError>;
    async fn check_relationship_status(
        &self,
        user_1: UserId,
        user_2: UserId,
    ) -> Result<RelationshipStatus, RelationError>;
    async fn delete_friendship(&self, user_1: UserId, user_2: UserId)
    -> Result<(), RelationError>;
}
