use crate::domain_model::*;
use crate::domain_port::{StorageTx, TxManager};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub(super) users: BTreeMap<UserId, User>,
    pub(super) friend_requests: BTreeMap<FriendRequestId, FriendRequestRecord>,
    last_user_id: i64,
    last_request_id: i64,
}

impl MemoryState {
    pub fn friend_requests(&self) -> impl Iterator<Item = &FriendRequestRecord> {
        self.friend_requests.values()
    }

    pub(super) fn next_user_id(&mut self) -> UserId {
        self.last_user_id += 1;
        UserId(self.last_user_id)
    }

    pub(super) fn next_request_id(&mut self) -> FriendRequestId {
        self.last_request_id += 1;
        FriendRequestId(self.last_request_id)
    }
}

/// Process-local store. A single lock guards all tables, so transactions are serialized.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MemoryTxManager {
    store: Arc<MemoryStore>,
}

impl MemoryTxManager {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        MemoryTxManager { store }
    }
}

#[async_trait::async_trait]
impl TxManager for MemoryTxManager {
    async fn begin<'t>(&'t self) -> anyhow::Result<Box<dyn StorageTx<'t> + 't>> {
        let guard = self.store.state.lock().await;
        Ok(Box::new(MemoryTx::new(guard)))
    }
}

pub struct MemoryTx<'t> {
    guard: MutexGuard<'t, MemoryState>,
    // snapshot restored unless the transaction commits
    backup: Option<MemoryState>,
}

impl<'t> MemoryTx<'t> {
    pub fn new(guard: MutexGuard<'t, MemoryState>) -> Self {
        let backup = Some(guard.clone());
        MemoryTx { guard, backup }
    }

    pub fn state(&mut self) -> &mut MemoryState {
        &mut self.guard
    }
}

impl Drop for MemoryTx<'_> {
    fn drop(&mut self) {
        if let Some(backup) = self.backup.take() {
            *self.guard = backup;
        }
    }
}

#[async_trait::async_trait]
impl<'t> StorageTx<'t> for MemoryTx<'t> {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let mut tx = self;
        tx.backup = None;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        // restored by Drop
        drop(self);
        Ok(())
    }
}

pub fn downcast<'a, 't>(tx: &'a mut dyn StorageTx<'t>) -> &'a mut MemoryTx<'t> {
    // SAFETY: memory repos are only ever wired to a MemoryTxManager, which hands out
    // nothing but MemoryTx.
    unsafe {
        let p = tx as *mut dyn StorageTx<'t>;
        let p = p as *mut MemoryTx<'t>;
        &mut *p
    }
}
