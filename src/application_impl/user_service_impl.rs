use crate::application_port::{UserError, UserService};
use crate::domain_model::{User, UserId};
use crate::domain_port::{FriendRequestRepo, TxManager, UserRepo};
use crate::logger::*;
use std::sync::Arc;

pub struct RealUserService {
    user_repo: Arc<dyn UserRepo>,
    friend_request_repo: Arc<dyn FriendRequestRepo>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealUserService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        friend_request_repo: Arc<dyn FriendRequestRepo>,
        tx_manager: Arc<dyn TxManager>,
    ) -> RealUserService {
        RealUserService {
            user_repo,
            friend_request_repo,
            tx_manager,
        }
    }
}

fn validate_username(username: &str) -> Result<&str, UserError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(UserError::MissingUsername);
    }
    Ok(username)
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn create_user(&self, username: &str) -> Result<User, UserError> {
        let username = validate_username(username)?;

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        let user = self.user_repo.create_in_tx(&mut *tx, username).await?;

        tx.commit()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    async fn get_user(&self, user_id: UserId) -> Result<User, UserError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        let user = self
            .user_repo
            .get_in_tx(&mut *tx, user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;

        tx.commit()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, UserError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        let users = self.user_repo.list_in_tx(&mut *tx).await?;

        tx.commit()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        Ok(users)
    }

    async fn update_user(&self, user_id: UserId, username: &str) -> Result<User, UserError> {
        let username = validate_username(username)?;

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        if !self
            .user_repo
            .update_in_tx(&mut *tx, user_id, username)
            .await?
        {
            return Err(UserError::NotFound(user_id));
        }

        tx.commit()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        Ok(User {
            id: user_id,
            username: username.to_string(),
        })
    }

    async fn delete_user(&self, user_id: UserId) -> Result<(), UserError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        // requests first: the sql schema keeps plain foreign keys on them
        let removed = self
            .friend_request_repo
            .delete_involving_in_tx(&mut *tx, user_id)
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        if !self.user_repo.delete_in_tx(&mut *tx, user_id).await? {
            return Err(UserError::NotFound(user_id));
        }

        tx.commit()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        info!(%user_id, removed_requests = removed, "user deleted");
        Ok(())
    }
}
