use super::repo_tx_mysql::MySqlTx;
use crate::domain_port::*;
use sqlx::mysql::MySqlDatabaseError;

const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
const ER_DUP_ENTRY: u16 = 1062;
const ER_LOCK_DEADLOCK: u16 = 1213;
const PAIR_KEY: &str = "uq_friend_request_pair";

/// Recovers the concrete transaction behind a `StorageTx` handed to a mysql repo.
pub fn downcast<'a, 't>(tx: &'a mut dyn StorageTx<'t>) -> &'a mut MySqlTx<'t> {
    // SAFETY: mysql repos are only ever wired to a MySqlTxManager.
    unsafe { &mut *(tx as *mut dyn StorageTx<'t> as *mut MySqlTx<'t>) }
}

/// True when `err` means another transaction claimed the same user pair first: a duplicate
/// on the pair key, or the deadlock / lock timeout InnoDB raises when two `SERIALIZABLE`
/// transactions lock the same gaps before inserting.
pub fn lost_pair_race(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db) = err else {
        return false;
    };

    db.try_downcast_ref::<MySqlDatabaseError>()
        .is_some_and(|e| is_pair_race(e.number(), e.message()))
}

fn is_pair_race(number: u16, message: &str) -> bool {
    match number {
        ER_DUP_ENTRY => message.contains(PAIR_KEY),
        ER_LOCK_DEADLOCK | ER_LOCK_WAIT_TIMEOUT => true,
        _ => false,
    }
}
