//! Request envelopes and the transport seam.
//!
//! Filters, projections and updates arrive here already encoded; a transport only moves
//! bytes and never looks inside them.

mod recording;

pub use recording::{RecordedCall, RecordingTransport};

use crate::errors::DbError;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Opaque transaction token carried alongside requests made inside a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub tx_id: String,
    pub origin: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertRequest {
    pub database: String,
    pub collection: String,
    pub documents: Vec<Vec<u8>>,
    pub session: Option<SessionMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub database: String,
    pub collection: String,
    pub filter: Vec<u8>,
    pub fields: Option<Vec<u8>>,
    pub options: ReadOptions,
    pub session: Option<SessionMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub database: String,
    pub collection: String,
    pub filter: Vec<u8>,
    pub fields: Vec<u8>,
    pub session: Option<SessionMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub database: String,
    pub collection: String,
    pub filter: Vec<u8>,
    pub session: Option<SessionMetadata>,
}

/// One generated-key payload (a JSON object) per inserted document, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertResponse {
    pub keys: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResponse {
    pub modified_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResponse {
    pub deleted_count: u64,
}

/// Streamed read results, one encoded document per message.
pub type ReadStream = tokio::sync::mpsc::Receiver<Result<Vec<u8>, DbError>>;

/// The RPC channel to the document database.
pub trait Transport: Send + Sync {
    fn insert(
        &self,
        req: InsertRequest,
    ) -> impl Future<Output = Result<InsertResponse, DbError>> + Send;

    fn read(&self, req: ReadRequest) -> impl Future<Output = Result<ReadStream, DbError>> + Send;

    fn update(
        &self,
        req: UpdateRequest,
    ) -> impl Future<Output = Result<UpdateResponse, DbError>> + Send;

    fn delete(
        &self,
        req: DeleteRequest,
    ) -> impl Future<Output = Result<DeleteResponse, DbError>> + Send;

    fn begin_transaction(
        &self,
        database: &str,
    ) -> impl Future<Output = Result<SessionMetadata, DbError>> + Send;

    fn commit_transaction(
        &self,
        database: &str,
        session: &SessionMetadata,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    fn rollback_transaction(
        &self,
        database: &str,
        session: &SessionMetadata,
    ) -> impl Future<Output = Result<(), DbError>> + Send;
}
