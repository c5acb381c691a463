use crate::application_port::UserError;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        username: &str,
    ) -> Result<User, UserError>;

    async fn get_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Option<User>, UserError>;

    async fn list_in_tx<'t>(&self, tx: &mut dyn StorageTx<'t>) -> Result<Vec<User>, UserError>;

    /// Returns `false` when no user has this id.
    async fn update_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        username: &str,
    ) -> Result<bool, UserError>;

    /// Returns `false` when no user has this id.
    async fn delete_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<bool, UserError>;
}
