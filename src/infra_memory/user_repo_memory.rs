use super::repo_tx_memory::downcast;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

#[derive(Debug, Default)]
pub struct MemoryUserRepo;

impl MemoryUserRepo {
    pub fn new() -> Self {
        MemoryUserRepo
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        username: &str,
    ) -> Result<User, UserError> {
        let state = downcast(tx).state();
        let user = User {
            id: state.next_user_id(),
            username: username.to_string(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Option<User>, UserError> {
        Ok(downcast(tx).state().users.get(&user_id).cloned())
    }

    async fn list_in_tx<'t>(&self, tx: &mut dyn StorageTx<'t>) -> Result<Vec<User>, UserError> {
        Ok(downcast(tx).state().users.values().cloned().collect())
    }

    async fn update_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        username: &str,
    ) -> Result<bool, UserError> {
        match downcast(tx).state().users.get_mut(&user_id) {
            Some(user) => {
                user.username = username.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<bool, UserError> {
        Ok(downcast(tx).state().users.remove(&user_id).is_some())
    }
}
