use crate::collection::Collection;
use crate::document::Document;
use crate::errors::DbError;
use crate::session::Session;
use crate::transport::Transport;
use std::sync::Arc;

/// A named database reachable through a shared transport.
pub struct Database<Tr: Transport> {
    name: String,
    transport: Arc<Tr>,
}

impl<Tr: Transport> Database<Tr> {
    pub fn new(name: &str, transport: Arc<Tr>) -> Self {
        Self { name: name.to_string(), transport }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle on the collection holding `T` documents.
    #[must_use]
    pub fn collection<T: Document>(&self) -> Collection<T, Tr> {
        Collection::new(self.name.clone(), Arc::clone(&self.transport))
    }

    /// Starts a transaction; requests made with the returned session carry its token.
    ///
    /// # Errors
    /// Propagates the transport's error.
    pub async fn begin_transaction(&self) -> Result<Session<Tr>, DbError> {
        let meta = self.transport.begin_transaction(&self.name).await?;
        log::debug!("begin tx={} db={}", meta.tx_id, self.name);
        Ok(Session::new(self.name.clone(), meta, Arc::clone(&self.transport)))
    }
}

impl<Tr: Transport> Clone for Database<Tr> {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(), transport: Arc::clone(&self.transport) }
    }
}
