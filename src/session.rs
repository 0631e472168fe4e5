use crate::errors::DbError;
use crate::transport::{SessionMetadata, Transport};
use std::sync::Arc;

/// An open transaction. Pass it to collection operations to run them inside the
/// transaction, then `commit` or `rollback`.
pub struct Session<Tr: Transport> {
    database: String,
    meta: SessionMetadata,
    transport: Arc<Tr>,
    finished: bool,
}

impl<Tr: Transport> Session<Tr> {
    pub(crate) fn new(database: String, meta: SessionMetadata, transport: Arc<Tr>) -> Self {
        Self { database, meta, transport, finished: false }
    }

    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    #[must_use]
    pub fn metadata(&self) -> &SessionMetadata {
        &self.meta
    }

    /// # Errors
    /// Returns the transport's error; the transaction is considered finished either way.
    pub async fn commit(mut self) -> Result<(), DbError> {
        self.finished = true;
        log::debug!("commit tx={} db={}", self.meta.tx_id, self.database);
        self.transport.commit_transaction(&self.database, &self.meta).await
    }

    /// # Errors
    /// Returns the transport's error; the transaction is considered finished either way.
    pub async fn rollback(mut self) -> Result<(), DbError> {
        self.finished = true;
        log::debug!("rollback tx={} db={}", self.meta.tx_id, self.database);
        self.transport.rollback_transaction(&self.database, &self.meta).await
    }

    /// Metadata to attach to a request against `database`.
    pub(crate) fn metadata_for(&self, database: &str) -> Result<SessionMetadata, DbError> {
        if self.database != database {
            return Err(DbError::Session(format!(
                "transaction {} belongs to database `{}`, not `{database}`",
                self.meta.tx_id, self.database
            )));
        }
        Ok(self.meta.clone())
    }
}

impl<Tr: Transport> Drop for Session<Tr> {
    fn drop(&mut self) {
        if !self.finished {
            log::warn!(
                "transaction {} on `{}` dropped without commit or rollback",
                self.meta.tx_id,
                self.database
            );
        }
    }
}
