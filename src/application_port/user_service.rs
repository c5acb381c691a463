use crate::application_port::ErrorKind;
use crate::domain_model::{User, UserId};

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("No username provided")]
    MissingUsername,
    #[error("user {0} not found")]
    NotFound(UserId),
    #[error("store error: {0}")]
    Store(String),
}

impl UserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UserError::MissingUsername => ErrorKind::Validation,
            UserError::NotFound(_) => ErrorKind::NotFound,
            UserError::Store(_) => ErrorKind::Internal,
        }
    }
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn create_user(&self, username: &str) -> Result<User, UserError>;
    async fn get_user(&self, user_id: UserId) -> Result<User, UserError>;
    async fn list_users(&self) -> Result<Vec<User>, UserError>;
    async fn update_user(&self, user_id: UserId, username: &str) -> Result<User, UserError>;
    /// Removes the user together with every friend request that references it.
    async fn delete_user(&self, user_id: UserId) -> Result<(), UserError>;
}
