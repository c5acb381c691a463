use crate::domain_port::{StorageTx, TxManager};
use anyhow::Context;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{Executor, MySql, MySqlConnection, MySqlPool, Transaction};

/// Hands out transactions on a pool whose sessions all run at `SERIALIZABLE`, so the
/// check-then-write sequences of the relationship engine cannot interleave.
pub struct MySqlTxManager {
    pool: MySqlPool,
}

impl MySqlTxManager {
    pub async fn connect(dsn: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET SESSION TRANSACTION ISOLATION LEVEL SERIALIZABLE")
                        .await?;
                    Ok(())
                })
            })
            .connect(dsn)
            .await
            .context("connect to mysql")?;
        Ok(MySqlTxManager { pool })
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl TxManager for MySqlTxManager {
    async fn begin<'t>(&'t self) -> anyhow::Result<Box<dyn StorageTx<'t> + 't>> {
        let inner = self.pool.begin().await.context("begin transaction")?;
        Ok(Box::new(MySqlTx { inner }))
    }
}

/// An open mysql transaction. Dropping it without `commit` rolls back.
pub struct MySqlTx<'t> {
    inner: Transaction<'t, MySql>,
}

impl MySqlTx<'_> {
    pub fn conn(&mut self) -> &mut MySqlConnection {
        self.inner.as_mut()
    }
}

#[async_trait::async_trait]
impl<'t> StorageTx<'t> for MySqlTx<'t> {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.inner.commit().await.context("commit transaction")
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        self.inner.rollback().await.context("rollback transaction")
    }
}
