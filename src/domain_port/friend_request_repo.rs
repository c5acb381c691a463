use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait FriendRequestRepo: Send + Sync {
    /// Inserts a pending request. Fails with `AlreadySent` if the pair already has a request
    /// in either direction.
    async fn insert_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        from_user: UserId,
        to_user: UserId,
    ) -> Result<FriendRequestRecord, RelationError>;

    async fn get_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequestRecord>, RelationError>;

    /// Looks up the request sent from `from_user` to `to_user`, ignoring the reverse one.
    async fn find_directed_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        from_user: UserId,
        to_user: UserId,
    ) -> Result<Option<FriendRequestRecord>, RelationError>;

    /// Looks up the request between the pair in either direction, lowest id first.
    async fn find_between_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        pair: UserPair,
    ) -> Result<Option<FriendRequestRecord>, RelationError>;

    async fn update_flags_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
        accepted: bool,
        discarded: bool,
    ) -> Result<(), RelationError>;

    /// Pending requests sent or received by the user, by ascending id.
    async fn list_pending_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Vec<FriendRequestRecord>, RelationError>;

    /// Recipients of the user's accepted, non-discarded requests.
    async fn list_accepted_recipients_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Vec<UserId>, RelationError>;

    /// Senders of accepted, non-discarded requests addressed to the user.
    async fn list_accepted_senders_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Vec<UserId>, RelationError>;

    /// Deletes every accepted, non-discarded request between the pair and returns how many
    /// were removed.
    async fn delete_friendships_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        pair: UserPair,
    ) -> Result<u64, RelationError>;

    async fn delete_involving_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<u64, RelationError>;
}
