use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::{FriendRequestRepo, StorageTx, TxManager, UserRepo};
use crate::logger::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub struct RealRelationshipService {
    user_repo: Arc<dyn UserRepo>,
    friend_request_repo: Arc<dyn FriendRequestRepo>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealRelationshipService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        friend_request_repo: Arc<dyn FriendRequestRepo>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            user_repo,
            friend_request_repo,
            tx_manager,
        }
    }

    async fn require_user_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user_id: UserId,
    ) -> Result<User, RelationError> {
        self.user_repo
            .get_in_tx(tx, user_id)
            .await?
            .ok_or(RelationError::UserNotFound(user_id))
    }

    /// Resolves both endpoints of each record, looking every user up at most once.
    async fn hydrate_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        records: Vec<FriendRequestRecord>,
    ) -> Result<Vec<FriendRequest>, RelationError> {
        let mut users: BTreeMap<UserId, User> = BTreeMap::new();
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            for user_id in [record.from_user, record.to_user] {
                if !users.contains_key(&user_id) {
                    let user = self.require_user_in_tx(&mut *tx, user_id).await?;
                    users.insert(user_id, user);
                }
            }
            let from_user = users[&record.from_user].clone();
            let to_user = users[&record.to_user].clone();
            out.push(FriendRequest::hydrate(record, from_user, to_user));
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl RelationshipService for RealRelationshipService {
    async fn create_request(
        &self,
        input: CreateRequestInput,
    ) -> Result<RequestOutcome, RelationError> {
        let (Some(from), Some(to)) = (input.from_user, input.to_user) else {
            return Err(RelationError::MissingUserId);
        };
        if from == to {
            return Err(RelationError::SelfRequest);
        }

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let from_user = self.require_user_in_tx(&mut *tx, from).await?;
        let to_user = self.require_user_in_tx(&mut *tx, to).await?;

        if self
            .friend_request_repo
            .find_directed_in_tx(&mut *tx, from, to)
            .await?
            .is_some()
        {
            return Err(RelationError::AlreadySent);
        }

        let outcome = match self
            .friend_request_repo
            .find_directed_in_tx(&mut *tx, to, from)
            .await?
        {
            Some(mut opposing) => {
                // both users asked: the earlier request becomes the friendship
                opposing.accepted = true;
                self.friend_request_repo
                    .update_flags_in_tx(&mut *tx, opposing.id, opposing.accepted, opposing.discarded)
                    .await?;
                info!(request_id = %opposing.id, %from, %to, "mutual friend request accepted");
                RequestOutcome::Collapsed(FriendRequest::hydrate(opposing, from_user, to_user))
            }
            None => {
                let record = self
                    .friend_request_repo
                    .insert_in_tx(&mut *tx, from, to)
                    .await?;
                info!(request_id = %record.id, %from, %to, "friend request created");
                RequestOutcome::Created(FriendRequest::hydrate(record, from_user, to_user))
            }
        };

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        Ok(outcome)
    }

    async fn list_pending(&self, user_id: UserId) -> Result<Vec<FriendRequest>, RelationError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let records = self
            .friend_request_repo
            .list_pending_in_tx(&mut *tx, user_id)
            .await?;
        let requests = self.hydrate_in_tx(&mut *tx, records).await?;

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        debug!(%user_id, count = requests.len(), "listed pending friend requests");
        Ok(requests)
    }

    async fn manipulate_request(
        &self,
        request_id: FriendRequestId,
        decision: RequestDecision,
    ) -> Result<FriendRequest, RelationError> {
        let accept = decision.wants_accept();
        let discard = decision.wants_discard();
        if accept && discard {
            return Err(RelationError::ConflictingDecision);
        }

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let mut record = self
            .friend_request_repo
            .get_in_tx(&mut *tx, request_id)
            .await?
            .ok_or(RelationError::RequestNotFound(request_id))?;

        let state = record.state();
        let changed = match (state, accept, discard) {
            (RequestState::Pending, true, _) => {
                record.accepted = true;
                true
            }
            (RequestState::Pending, _, true) => {
                record.discarded = true;
                true
            }
            (_, false, false) | (RequestState::Accepted, true, _) => false,
            (RequestState::Discarded, _, true) => false,
            (resolved, _, _) => return Err(RelationError::AlreadyResolved(request_id, resolved)),
        };

        if changed {
            self.friend_request_repo
                .update_flags_in_tx(&mut *tx, record.id, record.accepted, record.discarded)
                .await?;
            info!(%request_id, from = %state, to = %record.state(), "friend request updated");
        }

        let mut hydrated = self.hydrate_in_tx(&mut *tx, vec![record]).await?;

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        hydrated
            .pop()
            .ok_or(RelationError::RequestNotFound(request_id))
    }

    async fn list_friend_ids(&self, user_id: UserId) -> Result<BTreeSet<UserId>, RelationError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let recipients = self
            .friend_request_repo
            .list_accepted_recipients_in_tx(&mut *tx, user_id)
            .await?;
        let senders = self
            .friend_request_repo
            .list_accepted_senders_in_tx(&mut *tx, user_id)
            .await?;

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        Ok(recipients.into_iter().chain(senders).collect())
    }

    async fn check_relationship_status(
        &self,
        user_1: UserId,
        user_2: UserId,
    ) -> Result<RelationshipStatus, RelationError> {
        if user_1 == user_2 {
            return Ok(RelationshipStatus::NoRelationship);
        }

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let record = self
            .friend_request_repo
            .find_between_in_tx(&mut *tx, UserPair::new(user_1, user_2))
            .await?;

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        Ok(record
            .map(|r| r.status_for(user_1))
            .unwrap_or(RelationshipStatus::NoRelationship))
    }

    async fn delete_friendship(
        &self,
        user_1: UserId,
        user_2: UserId,
    ) -> Result<(), RelationError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let removed = self
            .friend_request_repo
            .delete_friendships_in_tx(&mut *tx, UserPair::new(user_1, user_2))
            .await?;
        if removed == 0 {
            return Err(RelationError::NotFriends);
        }

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        info!(%user_1, %user_2, removed, "friendship deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::RealUserService;
    use crate::infra_memory::*;

    struct Fixture {
        users: RealUserService,
        relations: Arc<RealRelationshipService>,
        tx_manager: Arc<MemoryTxManager>,
    }

    fn fixture() -> Fixture {
        let tx_manager = Arc::new(MemoryTxManager::new(Arc::new(MemoryStore::new())));
        let user_repo: Arc<dyn UserRepo> = Arc::new(MemoryUserRepo::new());
        let friend_request_repo: Arc<dyn FriendRequestRepo> =
            Arc::new(MemoryFriendRequestRepo::new());
        Fixture {
            users: RealUserService::new(
                user_repo.clone(),
                friend_request_repo.clone(),
                tx_manager.clone(),
            ),
            relations: Arc::new(RealRelationshipService::new(
                user_repo,
                friend_request_repo,
                tx_manager.clone(),
            )),
            tx_manager,
        }
    }

    impl Fixture {
        async fn user(&self, name: &str) -> UserId {
            self.users.create_user(name).await.unwrap().id
        }

        async fn send(&self, from: UserId, to: UserId) -> Result<RequestOutcome, RelationError> {
            self.relations
                .create_request(CreateRequestInput {
                    from_user: Some(from),
                    to_user: Some(to),
                })
                .await
        }

        async fn stored_requests(&self) -> Vec<FriendRequestRecord> {
            let mut tx = self.tx_manager.begin().await.unwrap();
            downcast(&mut *tx).state().friend_requests().cloned().collect()
        }

        async fn status(&self, a: UserId, b: UserId) -> RelationshipStatus {
            self.relations.check_relationship_status(a, b).await.unwrap()
        }
    }

    #[tokio::test]
    async fn new_request_is_pending_and_hydrated() {
        let f = fixture();
        let alice = f.user("alice").await;
        let bob = f.user("bob").await;

        let outcome = f.send(alice, bob).await.unwrap();

        let RequestOutcome::Created(request) = outcome else {
            panic!("expected a new request, got {outcome:?}");
        };
        assert_eq!(request.from_user.username, "alice");
        assert_eq!(request.to_user.username, "bob");
        assert!(!request.accepted);
        assert!(!request.discarded);
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let f = fixture();
        let alice = f.user("alice").await;

        let err = f
            .relations
            .create_request(CreateRequestInput {
                from_user: Some(alice),
                to_user: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::MissingUserId));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = f.send(alice, alice).await.unwrap_err();
        assert!(matches!(err, RelationError::SelfRequest));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = f.send(alice, UserId(999)).await.unwrap_err();
        assert!(matches!(err, RelationError::UserNotFound(UserId(999))));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn duplicate_request_conflicts() {
        let f = fixture();
        let alice = f.user("alice").await;
        let bob = f.user("bob").await;

        f.send(alice, bob).await.unwrap();
        let err = f.send(alice, bob).await.unwrap_err();

        assert!(matches!(err, RelationError::AlreadySent));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn duplicate_of_resolved_request_still_conflicts() {
        let f = fixture();
        let alice = f.user("alice").await;
        let bob = f.user("bob").await;

        let id = f.send(alice, bob).await.unwrap().request().id;
        f.relations
            .manipulate_request(id, RequestDecision::discard())
            .await
            .unwrap();

        assert!(matches!(
            f.send(alice, bob).await,
            Err(RelationError::AlreadySent)
        ));
    }

    #[tokio::test]
    async fn reverse_request_collapses_into_existing_one() {
        let f = fixture();
        let alice = f.user("alice").await;
        let bob = f.user("bob").await;

        let first = f.send(alice, bob).await.unwrap().into_request();
        let outcome = f.send(bob, alice).await.unwrap();

        let RequestOutcome::Collapsed(second) = outcome else {
            panic!("expected collapse, got {outcome:?}");
        };
        assert_eq!(second.id, first.id);
        assert!(second.accepted);
        // direction records who asked first
        assert_eq!(second.from_user.id, alice);
        assert_eq!(second.to_user.id, bob);

        assert_eq!(f.stored_requests().await.len(), 1);
        assert_eq!(f.status(alice, bob).await, RelationshipStatus::Friends);
        assert_eq!(
            f.relations.list_friend_ids(alice).await.unwrap(),
            BTreeSet::from([bob])
        );
    }

    #[tokio::test]
    async fn collapse_onto_discarded_request_keeps_it_discarded() {
        let f = fixture();
        let alice = f.user("alice").await;
        let bob = f.user("bob").await;

        let id = f.send(alice, bob).await.unwrap().request().id;
        f.relations
            .manipulate_request(id, RequestDecision::discard())
            .await
            .unwrap();

        let collapsed = f.send(bob, alice).await.unwrap().into_request();

        assert_eq!(collapsed.id, id);
        assert!(collapsed.accepted);
        assert!(collapsed.discarded);
        assert_eq!(f.status(alice, bob).await, RelationshipStatus::Discarded);
        assert!(f.relations.list_friend_ids(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_mutual_requests_leave_a_single_request() {
        let f = fixture();
        let alice = f.user("alice").await;
        let bob = f.user("bob").await;

        let send = |from, to| {
            let relations = f.relations.clone();
            tokio::spawn(async move {
                relations
                    .create_request(CreateRequestInput {
                        from_user: Some(from),
                        to_user: Some(to),
                    })
                    .await
            })
        };
        let (a, b) = tokio::join!(send(alice, bob), send(bob, alice));
        let a = a.unwrap().unwrap().into_request();
        let b = b.unwrap().unwrap().into_request();

        assert_eq!(a.id, b.id);
        assert_eq!(f.status(alice, bob).await, RelationshipStatus::Friends);
        assert_eq!(f.stored_requests().await.len(), 1);
    }

    #[tokio::test]
    async fn manipulate_accepts_and_discards_pending_requests() {
        let f = fixture();
        let alice = f.user("alice").await;
        let bob = f.user("bob").await;
        let carol = f.user("carol").await;

        let to_bob = f.send(alice, bob).await.unwrap().request().id;
        let to_carol = f.send(alice, carol).await.unwrap().request().id;

        let accepted = f
            .relations
            .manipulate_request(to_bob, RequestDecision::accept())
            .await
            .unwrap();
        assert!(accepted.accepted && !accepted.discarded);

        let discarded = f
            .relations
            .manipulate_request(to_carol, RequestDecision::discard())
            .await
            .unwrap();
        assert!(!discarded.accepted && discarded.discarded);

        assert_eq!(f.status(alice, carol).await, RelationshipStatus::Discarded);
        assert!(f.relations.list_pending(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn manipulate_edge_cases() {
        let f = fixture();
        let alice = f.user("alice").await;
        let bob = f.user("bob").await;
        let id = f.send(alice, bob).await.unwrap().request().id;

        let err = f
            .relations
            .manipulate_request(FriendRequestId(404), RequestDecision::accept())
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::RequestNotFound(_)));

        let both = RequestDecision {
            accepted: Some(true),
            discarded: Some(true),
        };
        let err = f.relations.manipulate_request(id, both).await.unwrap_err();
        assert!(matches!(err, RelationError::ConflictingDecision));
        assert_eq!(
            f.status(alice, bob).await,
            RelationshipStatus::RequestSentByUser1
        );

        let untouched = f
            .relations
            .manipulate_request(id, RequestDecision::default())
            .await
            .unwrap();
        assert!(!untouched.accepted && !untouched.discarded);

        f.relations
            .manipulate_request(id, RequestDecision::accept())
            .await
            .unwrap();
        // accepting twice is harmless, discarding a friendship is not a transition
        f.relations
            .manipulate_request(id, RequestDecision::accept())
            .await
            .unwrap();
        let err = f
            .relations
            .manipulate_request(id, RequestDecision::discard())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RelationError::AlreadyResolved(_, RequestState::Accepted)
        ));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn friend_ids_are_symmetric_and_unique() {
        let f = fixture();
        let alice = f.user("alice").await;
        let bob = f.user("bob").await;
        let carol = f.user("carol").await;

        f.send(alice, bob).await.unwrap();
        f.send(bob, alice).await.unwrap();
        f.send(carol, alice).await.unwrap();
        f.send(alice, carol).await.unwrap();

        assert_eq!(
            f.relations.list_friend_ids(alice).await.unwrap(),
            BTreeSet::from([bob, carol])
        );
        for friend in [bob, carol] {
            assert!(
                f.relations
                    .list_friend_ids(friend)
                    .await
                    .unwrap()
                    .contains(&alice)
            );
        }
        assert!(
            f.relations
                .list_friend_ids(UserId(777))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn status_without_request_is_no_relationship() {
        let f = fixture();
        let alice = f.user("alice").await;
        let bob = f.user("bob").await;

        assert_eq!(
            f.status(alice, bob).await,
            RelationshipStatus::NoRelationship
        );
        assert_eq!(
            f.status(alice, alice).await,
            RelationshipStatus::NoRelationship
        );
    }

    #[tokio::test]
    async fn delete_friendship_requires_friends() {
        let f = fixture();
        let alice = f.user("alice").await;
        let bob = f.user("bob").await;
        let carol = f.user("carol").await;

        f.send(alice, bob).await.unwrap();
        f.send(bob, alice).await.unwrap();
        f.send(alice, carol).await.unwrap();

        let err = f
            .relations
            .delete_friendship(alice, carol)
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::NotFriends));
        assert_eq!(
            f.status(alice, carol).await,
            RelationshipStatus::RequestSentByUser1
        );

        f.relations.delete_friendship(bob, alice).await.unwrap();
        assert_eq!(
            f.status(alice, bob).await,
            RelationshipStatus::NoRelationship
        );

        let err = f.relations.delete_friendship(alice, bob).await.unwrap_err();
        assert!(matches!(err, RelationError::NotFriends));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // the pair is free again
        assert!(matches!(
            f.send(bob, alice).await.unwrap(),
            RequestOutcome::Created(_)
        ));
    }

    #[tokio::test]
    async fn deleting_a_user_drops_its_requests() {
        let f = fixture();
        let alice = f.user("alice").await;
        let bob = f.user("bob").await;
        let carol = f.user("carol").await;

        f.send(alice, bob).await.unwrap();
        f.send(carol, alice).await.unwrap();
        f.send(bob, carol).await.unwrap();

        f.users.delete_user(alice).await.unwrap();

        let pending = f.relations.list_pending(carol).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].from_user.id, bob);
        assert_eq!(
            f.status(bob, alice).await,
            RelationshipStatus::NoRelationship
        );
    }

    #[tokio::test]
    async fn three_user_scenario() {
        let f = fixture();
        let u1 = f.user("User1").await;
        let u2 = f.user("User2").await;
        let u3 = f.user("User3").await;

        let id1 = f.send(u1, u2).await.unwrap().request().id;
        let id2 = f.send(u3, u1).await.unwrap().request().id;

        let accepted = f
            .relations
            .manipulate_request(id1, RequestDecision::accept())
            .await
            .unwrap();
        assert!(accepted.accepted);

        let pending = f.relations.list_pending(u1).await.unwrap();
        assert_eq!(
            pending.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![id2]
        );

        assert_eq!(f.status(u1, u2).await, RelationshipStatus::Friends);
        assert_eq!(
            f.status(u1, u3).await,
            RelationshipStatus::RequestSentByUser2
        );
        assert_eq!(
            f.status(u3, u1).await,
            RelationshipStatus::RequestSentByUser1
        );
        assert_eq!(
            f.relations.list_friend_ids(u1).await.unwrap(),
            BTreeSet::from([u2])
        );

        f.relations.delete_friendship(u1, u2).await.unwrap();
        assert!(matches!(
            f.relations.delete_friendship(u1, u2).await,
            Err(RelationError::NotFriends)
        ));
    }
}
