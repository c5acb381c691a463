use super::repo_tx_memory::downcast;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

#[derive(Debug, Default)]
pub struct MemoryFriendRequestRepo;

impl MemoryFriendRequestRepo {
    pub fn new() -> Self {
        MemoryFriendRequestRepo
    }
}

#[async_trait::async_trait]
impl FriendRequestRepo for MemoryFriendRequestRepo {
    async fn insert_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        from_user: UserId,
        to_user: UserId,
    ) -> Result<FriendRequestRecord, RelationError> {
        if from_user == to_user {
            return Err(RelationError::SelfRequest);
        }

        let state = downcast(tx).state();
        // same uniqueness as the pair key on the sql table
        let pair = UserPair::new(from_user, to_user);
        if state.friend_requests.values().any(|r| r.pair() == pair) {
            return Err(RelationError::AlreadySent);
        }

        let record = FriendRequestRecord {
            id: state.next_request_id(),
            from_user,
            to_user,
            accepted: false,
            discarded: false,
        };
        state.friend_requests.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequestRecord>, RelationError> {
        Ok(downcast(tx).state().friend_requests.get(&request_id).cloned())
    }

    async fn find_directed_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        from_user: UserId,
        to_user: UserId,
    ) -> Result<Option<FriendRequestRecord>, RelationError> {
        Ok(downcast(tx)
            .state()
            .friend_requests
            .values()
            .find(|r| r.from_user == from_user && r.to_user == to_user)
            .cloned())
    }

    async fn find_between_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        pair: UserPair,
    ) -> Result<Option<FriendRequestRecord>, RelationError> {
        Ok(downcast(tx)
            .state()
            .friend_requests
            .values()
            .find(|r| r.pair() == pair)
            .cloned())
    }

    async fn update_flags_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
        accepted: bool,
        discarded: bool,
    ) -> Result<(), RelationError> {
        let record = downcast(tx)
            .state()
            .friend_requests
            .get_mut(&request_id)
            .ok_or(RelationError::RequestNotFound(request_id))?;
        record.accepted = accepted;
        record.discarded = discarded;
        Ok(())
    }

    async fn list_pending_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Vec<FriendRequestRecord>, RelationError> {
        Ok(downcast(tx)
            .state()
            .friend_requests
            .values()
            .filter(|r| r.involves(user_id) && r.is_pending())
            .cloned()
            .collect())
    }

    async fn list_accepted_recipients_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Vec<UserId>, RelationError> {
        Ok(downcast(tx)
            .state()
            .friend_requests
            .values()
            .filter(|r| r.from_user == user_id && r.is_friendship())
            .map(|r| r.to_user)
            .collect())
    }

    async fn list_accepted_senders_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Vec<UserId>, RelationError> {
        Ok(downcast(tx)
            .state()
            .friend_requests
            .values()
            .filter(|r| r.to_user == user_id && r.is_friendship())
            .map(|r| r.from_user)
            .collect())
    }

    async fn delete_friendships_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        pair: UserPair,
    ) -> Result<u64, RelationError> {
        let requests = &mut downcast(tx).state().friend_requests;
        let before = requests.len();
        requests.retain(|_, r| !(r.pair() == pair && r.is_friendship()));
        Ok((before - requests.len()) as u64)
    }

    async fn delete_involving_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<u64, RelationError> {
        let requests = &mut downcast(tx).state().friend_requests;
        let before = requests.len();
        requests.retain(|_, r| !r.involves(user_id));
        Ok((before - requests.len()) as u64)
    }
}
