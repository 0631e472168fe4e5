use crate::document::decode_document;
use crate::errors::DbError;
use crate::transport::ReadStream;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// A forward-only cursor over streamed read results.
pub struct Cursor<T> {
    stream: ReadStream,
    _doc: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Cursor<T> {
    pub(crate) fn new(stream: ReadStream) -> Self {
        Self { stream, _doc: PhantomData }
    }

    /// Next document, or `None` once the stream is exhausted.
    pub async fn advance(&mut self) -> Option<Result<T, DbError>> {
        let item = self.stream.recv().await?;
        Some(item.and_then(|bytes| decode_document(&bytes)))
    }

    /// Drains the cursor, stopping at the first error.
    ///
    /// # Errors
    /// Returns the first transport or decode error encountered.
    pub async fn to_vec(mut self) -> Result<Vec<T>, DbError> {
        let mut out = Vec::new();
        while let Some(doc) = self.advance().await {
            out.push(doc?);
        }
        Ok(out)
    }
}
