//! Typed collection handles and the CRUD operations over them.

mod cursor;
mod ops;

pub use cursor::Cursor;

use crate::document::Document;
use crate::transport::Transport;
use std::marker::PhantomData;
use std::sync::Arc;

/// Wire payload sent when a read names no filter.
pub(crate) const MATCH_ALL: &[u8] = b"{}";

/// Handle on the collection storing `T` documents in one database.
pub struct Collection<T: Document, Tr: Transport> {
    database: String,
    transport: Arc<Tr>,
    _doc: PhantomData<fn() -> T>,
}

impl<T: Document, Tr: Transport> Collection<T, Tr> {
    pub(crate) fn new(database: String, transport: Arc<Tr>) -> Self {
        Self { database, transport, _doc: PhantomData }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        T::COLLECTION
    }

    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }
}

impl<T: Document, Tr: Transport> Clone for Collection<T, Tr> {
    fn clone(&self) -> Self {
        Self::new(self.database.clone(), Arc::clone(&self.transport))
    }
}
