use super::{
    DeleteRequest, DeleteResponse, InsertRequest, InsertResponse, ReadRequest, ReadStream,
    SessionMetadata, Transport, UpdateRequest, UpdateResponse,
};
use crate::errors::DbError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Insert(InsertRequest),
    Read(ReadRequest),
    Update(UpdateRequest),
    Delete(DeleteRequest),
    Begin { database: String },
    Commit { database: String, session: SessionMetadata },
    Rollback { database: String, session: SessionMetadata },
}

/// In-process transport that records every request and answers from canned state.
///
/// Inserts get sequential keys (`{"<key_field>":n}` starting at 1); reads pop one queued
/// batch of documents, or stream nothing when the queue is empty.
pub struct RecordingTransport {
    calls: Mutex<Vec<RecordedCall>>,
    reads: Mutex<VecDeque<Vec<Vec<u8>>>>,
    key_field: String,
    next_key: AtomicU64,
    modified_count: AtomicU64,
    deleted_count: AtomicU64,
    fail_next: Mutex<Option<String>>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::with_key_field("id")
    }

    #[must_use]
    pub fn with_key_field(field: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reads: Mutex::new(VecDeque::new()),
            key_field: field.to_string(),
            next_key: AtomicU64::new(1),
            modified_count: AtomicU64::new(0),
            deleted_count: AtomicU64::new(0),
            fail_next: Mutex::new(None),
        }
    }

    /// Queues the documents returned by the next read.
    pub fn push_read_documents(&self, docs: Vec<Vec<u8>>) {
        self.reads.lock().push_back(docs);
    }

    pub fn set_modified_count(&self, n: u64) {
        self.modified_count.store(n, Ordering::Relaxed);
    }

    pub fn set_deleted_count(&self, n: u64) {
        self.deleted_count.store(n, Ordering::Relaxed);
    }

    /// Makes the next call fail with a transport error carrying `message`.
    pub fn fail_next(&self, message: &str) {
        *self.fail_next.lock() = Some(message.to_string());
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(&self, call: RecordedCall) -> Result<(), DbError> {
        self.calls.lock().push(call);
        match self.fail_next.lock().take() {
            Some(msg) => Err(DbError::Transport(msg)),
            None => Ok(()),
        }
    }
}

impl Transport for RecordingTransport {
    async fn insert(&self, req: InsertRequest) -> Result<InsertResponse, DbError> {
        let count = req.documents.len();
        self.record(RecordedCall::Insert(req))?;
        let mut keys = Vec::with_capacity(count);
        for _ in 0..count {
            let n = self.next_key.fetch_add(1, Ordering::Relaxed);
            let mut obj = serde_json::Map::new();
            obj.insert(self.key_field.clone(), serde_json::Value::from(n));
            keys.push(serde_json::to_vec(&obj)?);
        }
        Ok(InsertResponse { keys })
    }

    async fn read(&self, req: ReadRequest) -> Result<ReadStream, DbError> {
        let limit = req.options.limit;
        self.record(RecordedCall::Read(req))?;
        let mut docs = self.reads.lock().pop_front().unwrap_or_default();
        if let Some(limit) = limit.and_then(|l| usize::try_from(l).ok()) {
            docs.truncate(limit);
        }
        let (tx, rx) = tokio::sync::mpsc::channel(docs.len().max(1));
        for doc in docs {
            tx.try_send(Ok(doc)).map_err(|e| DbError::Transport(e.to_string()))?;
        }
        Ok(rx)
    }

    async fn update(&self, req: UpdateRequest) -> Result<UpdateResponse, DbError> {
        self.record(RecordedCall::Update(req))?;
        Ok(UpdateResponse { modified_count: self.modified_count.load(Ordering::Relaxed) })
    }

    async fn delete(&self, req: DeleteRequest) -> Result<DeleteResponse, DbError> {
        self.record(RecordedCall::Delete(req))?;
        Ok(DeleteResponse { deleted_count: self.deleted_count.load(Ordering::Relaxed) })
    }

    async fn begin_transaction(&self, database: &str) -> Result<SessionMetadata, DbError> {
        self.record(RecordedCall::Begin { database: database.to_string() })?;
        Ok(SessionMetadata { tx_id: Uuid::new_v4().to_string(), origin: "recording".into() })
    }

    async fn commit_transaction(
        &self,
        database: &str,
        session: &SessionMetadata,
    ) -> Result<(), DbError> {
        self.record(RecordedCall::Commit {
            database: database.to_string(),
            session: session.clone(),
        })
    }

    async fn rollback_transaction(
        &self,
        database: &str,
        session: &SessionMetadata,
    ) -> Result<(), DbError> {
        self.record(RecordedCall::Rollback {
            database: database.to_string(),
            session: session.clone(),
        })
    }
}
