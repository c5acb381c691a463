use super::util::{downcast, lost_pair_race};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::Row;
use sqlx::mysql::MySqlRow;

#[derive(Debug, Default)]
pub struct MySqlFriendRequestRepo;

impl MySqlFriendRequestRepo {
    pub fn new() -> Self {
        MySqlFriendRequestRepo
    }
}

const SELECT_REQUEST: &str = "SELECT id, from_user, to_user, accepted, discarded FROM friend_request";

fn record_from_row(row: &MySqlRow) -> Result<FriendRequestRecord, RelationError> {
    let decode = |e: sqlx::Error| RelationError::Store(format!("decode friend request: {e}"));
    Ok(FriendRequestRecord {
        id: row.try_get::<FriendRequestId, _>("id").map_err(decode)?,
        from_user: row.try_get::<UserId, _>("from_user").map_err(decode)?,
        to_user: row.try_get::<UserId, _>("to_user").map_err(decode)?,
        accepted: row.try_get::<bool, _>("accepted").map_err(decode)?,
        discarded: row.try_get::<bool, _>("discarded").map_err(decode)?,
    })
}

#[async_trait::async_trait]
impl FriendRequestRepo for MySqlFriendRequestRepo {
    async fn insert_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        from_user: UserId,
        to_user: UserId,
    ) -> Result<FriendRequestRecord, RelationError> {
        if from_user == to_user {
            return Err(RelationError::SelfRequest);
        }

        let tx = downcast(tx);

        let res = sqlx::query(
            r#"
INSERT INTO friend_request (from_user, to_user, accepted, discarded)
VALUES (?, ?, FALSE, FALSE)
"#,
        )
        .bind(from_user)
        .bind(to_user)
        .execute(tx.conn())
        .await;

        match res {
            Ok(done) => Ok(FriendRequestRecord {
                id: FriendRequestId(done.last_insert_id() as i64),
                from_user,
                to_user,
                accepted: false,
                discarded: false,
            }),
            // a racing transaction claimed the pair first
            Err(e) if lost_pair_race(&e) => Err(RelationError::AlreadySent),
            Err(e) => Err(RelationError::Store(format!("insert friend request: {e}"))),
        }
    }

    async fn get_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequestRecord>, RelationError> {
        let tx = downcast(tx);

        let row = sqlx::query(&format!("{SELECT_REQUEST} WHERE id = ? FOR UPDATE"))
            .bind(request_id)
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| RelationError::Store(format!("query friend request: {e}")))?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn find_directed_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        from_user: UserId,
        to_user: UserId,
    ) -> Result<Option<FriendRequestRecord>, RelationError> {
        let tx = downcast(tx);

        let row = sqlx::query(&format!(
            "{SELECT_REQUEST} WHERE from_user = ? AND to_user = ? ORDER BY id LIMIT 1 FOR UPDATE"
        ))
        .bind(from_user)
        .bind(to_user)
        .fetch_optional(tx.conn())
        .await
        .map_err(|e| {
            if lost_pair_race(&e) {
                RelationError::AlreadySent
            } else {
                RelationError::Store(format!("query directed friend request: {e}"))
            }
        })?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn find_between_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        pair: UserPair,
    ) -> Result<Option<FriendRequestRecord>, RelationError> {
        let tx = downcast(tx);

        let row = sqlx::query(&format!(
            "{SELECT_REQUEST} WHERE user_min = ? AND user_max = ? ORDER BY id LIMIT 1"
        ))
        .bind(pair.min())
        .bind(pair.max())
        .fetch_optional(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("query friend request by pair: {e}")))?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn update_flags_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
        accepted: bool,
        discarded: bool,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx);

        sqlx::query("UPDATE friend_request SET accepted = ?, discarded = ? WHERE id = ?")
            .bind(accepted)
            .bind(discarded)
            .bind(request_id)
            .execute(tx.conn())
            .await
            .map_err(|e| RelationError::Store(format!("update friend request: {e}")))?;

        Ok(())
    }

    async fn list_pending_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Vec<FriendRequestRecord>, RelationError> {
        let tx = downcast(tx);

        let rows = sqlx::query(&format!(
            r#"
{SELECT_REQUEST}
WHERE (from_user = ? OR to_user = ?)
  AND accepted = FALSE
  AND discarded = FALSE
ORDER BY id
"#
        ))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("list pending friend requests: {e}")))?;

        rows.iter().map(record_from_row).collect()
    }

    async fn list_accepted_recipients_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Vec<UserId>, RelationError> {
        let tx = downcast(tx);

        sqlx::query_scalar::<_, UserId>(
            "SELECT to_user FROM friend_request WHERE from_user = ? AND accepted = TRUE AND discarded = FALSE",
        )
        .bind(user_id)
        .fetch_all(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("list accepted recipients: {e}")))
    }

    async fn list_accepted_senders_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Vec<UserId>, RelationError> {
        let tx = downcast(tx);

        sqlx::query_scalar::<_, UserId>(
            "SELECT from_user FROM friend_request WHERE to_user = ? AND accepted = TRUE AND discarded = FALSE",
        )
        .bind(user_id)
        .fetch_all(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("list accepted senders: {e}")))
    }

    async fn delete_friendships_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        pair: UserPair,
    ) -> Result<u64, RelationError> {
        let tx = downcast(tx);

        let res = sqlx::query(
            r#"
DELETE FROM friend_request
WHERE user_min = ?
  AND user_max = ?
  AND accepted = TRUE
  AND discarded = FALSE
"#,
        )
        .bind(pair.min())
        .bind(pair.max())
        .execute(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("delete friendship: {e}")))?;

        Ok(res.rows_affected())
    }

    async fn delete_involving_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<u64, RelationError> {
        let tx = downcast(tx);

        let res = sqlx::query("DELETE FROM friend_request WHERE from_user = ? OR to_user = ?")
            .bind(user_id)
            .bind(user_id)
            .execute(tx.conn())
            .await
            .map_err(|e| RelationError::Store(format!("delete user friend requests: {e}")))?;

        Ok(res.rows_affected())
    }
}
