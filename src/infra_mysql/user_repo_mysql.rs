use super::util::downcast;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::Row;
use sqlx::mysql::MySqlRow;

#[derive(Debug, Default)]
pub struct MySqlUserRepo;

impl MySqlUserRepo {
    pub fn new() -> Self {
        MySqlUserRepo
    }
}

fn user_from_row(row: &MySqlRow) -> Result<User, UserError> {
    Ok(User {
        id: row
            .try_get::<UserId, _>("id")
            .map_err(|e| UserError::Store(format!("decode user id: {e}")))?,
        username: row
            .try_get::<String, _>("username")
            .map_err(|e| UserError::Store(format!("decode username: {e}")))?,
    })
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        username: &str,
    ) -> Result<User, UserError> {
        let tx = downcast(tx);

        let res = sqlx::query("INSERT INTO user (username) VALUES (?)")
            .bind(username)
            .execute(tx.conn())
            .await
            .map_err(|e| UserError::Store(format!("insert user: {e}")))?;

        Ok(User {
            id: UserId(res.last_insert_id() as i64),
            username: username.to_string(),
        })
    }

    async fn get_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Option<User>, UserError> {
        let tx = downcast(tx);

        let row = sqlx::query("SELECT id, username FROM user WHERE id = ?")
            .bind(user_id)
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| UserError::Store(format!("query user: {e}")))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_in_tx<'t>(&self, tx: &mut dyn StorageTx<'t>) -> Result<Vec<User>, UserError> {
        let tx = downcast(tx);

        let rows = sqlx::query("SELECT id, username FROM user ORDER BY id")
            .fetch_all(tx.conn())
            .await
            .map_err(|e| UserError::Store(format!("list users: {e}")))?;

        rows.iter().map(user_from_row).collect()
    }

    async fn update_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        username: &str,
    ) -> Result<bool, UserError> {
        let tx = downcast(tx);

        // an unchanged username reports 0 affected rows, so existence is checked explicitly
        let locked = sqlx::query("SELECT id FROM user WHERE id = ? FOR UPDATE")
            .bind(user_id)
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| UserError::Store(format!("lock user: {e}")))?;
        if locked.is_none() {
            return Ok(false);
        }

        sqlx::query("UPDATE user SET username = ? WHERE id = ?")
            .bind(username)
            .bind(user_id)
            .execute(tx.conn())
            .await
            .map_err(|e| UserError::Store(format!("update user: {e}")))?;

        Ok(true)
    }

    async fn delete_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<bool, UserError> {
        let tx = downcast(tx);

        let res = sqlx::query("DELETE FROM user WHERE id = ?")
            .bind(user_id)
            .execute(tx.conn())
            .await
            .map_err(|e| UserError::Store(format!("delete user: {e}")))?;

        Ok(res.rows_affected() > 0)
    }
}
