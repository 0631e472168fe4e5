use super::{Collection, Cursor, MATCH_ALL};
use crate::document::{
    Document, apply_generated_keys, encode_document, generated_keys_from_bytes, validate_paths,
};
use crate::errors::DbError;
use crate::filter::{
    FieldMap, Filter, ReadFields, Selector, UpdateFields, encode_filter, encode_read_fields,
    encode_update_fields, flatten,
};
use crate::session::Session;
use crate::transport::{
    DeleteRequest, InsertRequest, ReadOptions, ReadRequest, SessionMetadata, Transport,
    UpdateRequest,
};

// Every operation encodes (and schema-checks) its payloads before touching the transport,
// so a malformed filter never costs a round trip. Encode errors are returned as-is.

impl<T: Document, Tr: Transport> Collection<T, Tr> {
    /// Inserts one document and returns it with server-generated keys merged in.
    ///
    /// # Errors
    /// Propagates codec and transport errors.
    pub async fn insert_one(&self, doc: &T, session: Option<&Session<Tr>>) -> Result<T, DbError> {
        let mut out = self.insert_many(std::slice::from_ref(doc), session).await?;
        out.pop().ok_or_else(|| DbError::Transport("insert returned no keys".into()))
    }

    /// Inserts documents and returns copies with server-generated keys merged in, in order.
    ///
    /// # Errors
    /// Propagates codec and transport errors; a key count that does not match the document
    /// count is a transport error.
    pub async fn insert_many(
        &self,
        docs: &[T],
        session: Option<&Session<Tr>>,
    ) -> Result<Vec<T>, DbError> {
        let documents = docs.iter().map(encode_document).collect::<Result<Vec<_>, _>>()?;
        let req = InsertRequest {
            database: self.database.clone(),
            collection: T::COLLECTION.to_string(),
            documents,
            session: self.session_meta(session)?,
        };
        log::debug!(
            target: "nexusrpc::wire",
            "insert {}.{} docs={}",
            self.database,
            T::COLLECTION,
            docs.len()
        );
        let resp = self.transport.insert(req).await?;
        if resp.keys.len() != docs.len() {
            return Err(DbError::Transport(format!(
                "insert returned {} keys for {} documents",
                resp.keys.len(),
                docs.len()
            )));
        }
        docs.iter()
            .zip(&resp.keys)
            .map(|(doc, key)| apply_generated_keys(doc, &generated_keys_from_bytes(key)?))
            .collect()
    }

    /// Streams documents matching `filter` (all documents when `None`).
    ///
    /// # Errors
    /// Encoding errors for the filter or projection, then transport errors.
    pub async fn find_many(
        &self,
        filter: Option<&Filter>,
        fields: Option<&ReadFields>,
        session: Option<&Session<Tr>>,
    ) -> Result<Cursor<T>, DbError> {
        self.read(filter, fields, ReadOptions::default(), session).await
    }

    /// First document matching `filter`, if any.
    ///
    /// # Errors
    /// Encoding, transport and decode errors.
    pub async fn find_one(
        &self,
        filter: Option<&Filter>,
        fields: Option<&ReadFields>,
        session: Option<&Session<Tr>>,
    ) -> Result<Option<T>, DbError> {
        let opts = ReadOptions { limit: Some(1), skip: None };
        let mut cursor = self.read(filter, fields, opts, session).await?;
        cursor.advance().await.transpose()
    }

    /// Fetches the document whose primary key fields equal `key`.
    ///
    /// `key` must name exactly the fields of `T::primary_key()`.
    ///
    /// # Errors
    /// `FilterEncoding` for a key that does not match the declared primary key,
    /// `NoSuchDocument` when nothing matches, then encoding, transport and decode errors.
    pub async fn find_by_key(
        &self,
        key: &FieldMap,
        session: Option<&Session<Tr>>,
    ) -> Result<T, DbError> {
        let declared = T::primary_key();
        let paths: Vec<String> = flatten(key)?.into_iter().map(|(p, _)| p).collect();
        if paths.len() != declared.len() || !declared.iter().all(|d| paths.iter().any(|p| p == d)) {
            return Err(DbError::FilterEncoding(format!(
                "key [{}] does not match primary key [{}] of `{}`",
                paths.join(", "),
                declared.join(", "),
                T::COLLECTION
            )));
        }
        let filter = Filter::Selector(Selector::new(key.clone()));
        self.find_one(Some(&filter), None, session).await?.ok_or_else(|| {
            DbError::NoSuchDocument(format!(
                "{}.{} {}",
                self.database,
                T::COLLECTION,
                paths.join(",")
            ))
        })
    }

    /// Applies `update` to every document matching `filter`; returns the modified count.
    ///
    /// # Errors
    /// Encoding errors for the filter or update, then transport errors.
    pub async fn update_many(
        &self,
        filter: &Filter,
        update: &UpdateFields,
        session: Option<&Session<Tr>>,
    ) -> Result<u64, DbError> {
        let filter = self.filter_bytes(Some(filter))?;
        validate_paths::<T>(&update.field_paths()?)?;
        let fields = encode_update_fields(update)?.into_bytes();
        log::debug!(
            target: "nexusrpc::wire",
            "update {}.{} filter={}B fields={}B",
            self.database,
            T::COLLECTION,
            filter.len(),
            fields.len()
        );
        let req = UpdateRequest {
            database: self.database.clone(),
            collection: T::COLLECTION.to_string(),
            filter,
            fields,
            session: self.session_meta(session)?,
        };
        Ok(self.transport.update(req).await?.modified_count)
    }

    /// Deletes every document matching `filter`; returns the deleted count.
    ///
    /// # Errors
    /// Encoding errors for the filter, then transport errors.
    pub async fn delete_many(
        &self,
        filter: &Filter,
        session: Option<&Session<Tr>>,
    ) -> Result<u64, DbError> {
        let filter = self.filter_bytes(Some(filter))?;
        log::debug!(
            target: "nexusrpc::wire",
            "delete {}.{} filter={}B",
            self.database,
            T::COLLECTION,
            filter.len()
        );
        let req = DeleteRequest {
            database: self.database.clone(),
            collection: T::COLLECTION.to_string(),
            filter,
            session: self.session_meta(session)?,
        };
        Ok(self.transport.delete(req).await?.deleted_count)
    }

    async fn read(
        &self,
        filter: Option<&Filter>,
        fields: Option<&ReadFields>,
        options: ReadOptions,
        session: Option<&Session<Tr>>,
    ) -> Result<Cursor<T>, DbError> {
        let filter = self.filter_bytes(filter)?;
        let fields = match fields {
            Some(f) => {
                validate_paths::<T>(&f.include)?;
                validate_paths::<T>(&f.exclude)?;
                Some(encode_read_fields(f)?.into_bytes())
            }
            None => None,
        };
        log::debug!(
            target: "nexusrpc::wire",
            "read {}.{} filter={}B fields={}B",
            self.database,
            T::COLLECTION,
            filter.len(),
            fields.as_ref().map_or(0, Vec::len)
        );
        let req = ReadRequest {
            database: self.database.clone(),
            collection: T::COLLECTION.to_string(),
            filter,
            fields,
            options,
            session: self.session_meta(session)?,
        };
        Ok(Cursor::new(self.transport.read(req).await?))
    }

    fn filter_bytes(&self, filter: Option<&Filter>) -> Result<Vec<u8>, DbError> {
        let Some(filter) = filter else {
            return Ok(MATCH_ALL.to_vec());
        };
        validate_paths::<T>(&filter.field_paths()?)?;
        Ok(encode_filter(filter)?.into_bytes())
    }

    fn session_meta(
        &self,
        session: Option<&Session<Tr>>,
    ) -> Result<Option<SessionMetadata>, DbError> {
        session.map(|s| s.metadata_for(&self.database)).transpose()
    }
}
