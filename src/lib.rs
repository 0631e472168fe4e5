//! Client library for a remote document database.
//!
//! Application code describes which documents to touch with [`filter::Filter`] values,
//! which fields to return with [`filter::ReadFields`] and how to change them with
//! [`filter::UpdateFields`]. Collection operations encode these into the canonical JSON
//! wire strings and hand them to a [`transport::Transport`].
//!
//! ```
//! use nexusrpc::fields;
//! use nexusrpc::filter::{encode_filter, Filter, LogicalFilter, Selector};
//!
//! let f: Filter = LogicalFilter::or(vec![
//!     Selector::new(fields! { "name" => "alice" }),
//!     Selector::new(fields! { "name" => "emma" }),
//! ])
//! .into();
//! assert_eq!(encode_filter(&f).unwrap(), r#"{"$or":[{"name":"alice"},{"name":"emma"}]}"#);
//! ```

pub mod collection;
pub mod config;
pub mod database;
pub mod document;
pub mod errors;
pub mod filter;
pub mod logger;
pub mod session;
pub mod transport;

use crate::config::ClientConfig;
use crate::database::Database;
use crate::errors::DbError;
use crate::transport::Transport;
use std::sync::Arc;

/// Entry point: a validated configuration plus a shared transport.
pub struct Client<Tr: Transport> {
    config: ClientConfig,
    transport: Arc<Tr>,
}

impl<Tr: Transport> Client<Tr> {
    /// # Errors
    /// Returns `Config` if the configuration does not validate.
    pub fn new(config: ClientConfig, transport: Tr) -> Result<Self, DbError> {
        config.validate()?;
        log::info!("client: server={} database={}", config.server_url, config.database);
        Ok(Self { config, transport: Arc::new(transport) })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn transport(&self) -> &Arc<Tr> {
        &self.transport
    }

    #[must_use]
    pub fn database(&self, name: &str) -> Database<Tr> {
        Database::new(name, Arc::clone(&self.transport))
    }

    /// The database named in the configuration.
    #[must_use]
    pub fn default_database(&self) -> Database<Tr> {
        self.database(&self.config.database)
    }
}

/// Initializes process logging from `log4rs.yaml` if present.
///
/// # Errors
/// Returns an error if the logging configuration file cannot be loaded.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    logger::init()?;
    Ok(())
}
