//! Client configuration.
//!
//! Precedence: environment > config files > defaults. Config files are searched in order
//! (explicit path, `NEXUSRPC_CONFIG`, `<config dir>/nexusrpc.toml`, `./nexusrpc.toml`);
//! earlier files win field by field.

use crate::errors::DbError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server_url: String,
    pub database: String,
    pub timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "localhost:8081".into(),
            database: "default".into(),
            timeout_ms: 30_000,
            log_dir: None,
            log_level: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    server_url: Option<String>,
    database: Option<String>,
    timeout_ms: Option<u64>,
    log_dir: Option<PathBuf>,
    log_level: Option<String>,
}

impl FileConfig {
    fn fill_from(&mut self, other: Self) {
        if self.server_url.is_none() { self.server_url = other.server_url; }
        if self.database.is_none() { self.database = other.database; }
        if self.timeout_ms.is_none() { self.timeout_ms = other.timeout_ms; }
        if self.log_dir.is_none() { self.log_dir = other.log_dir; }
        if self.log_level.is_none() { self.log_level = other.log_level; }
    }
}

impl ClientConfig {
    /// Loads files, applies environment overrides and validates.
    ///
    /// The explicit path must exist; the searched locations are optional.
    ///
    /// # Errors
    /// `Io` for unreadable files, `Config` for a missing explicit file, invalid TOML, env
    /// values or settings.
    pub fn load(explicit: Option<&Path>) -> Result<Self, DbError> {
        if let Some(p) = explicit
            && !p.exists()
        {
            return Err(DbError::Config(format!("config file {} not found", p.display())));
        }
        let mut file = FileConfig::default();
        for p in config_paths(explicit) {
            if !p.exists() {
                continue;
            }
            let text = std::fs::read_to_string(&p)?;
            let parsed: FileConfig = toml::from_str(&text)
                .map_err(|e| DbError::Config(format!("{}: {e}", p.display())))?;
            log::debug!("config: loaded {}", p.display());
            file.fill_from(parsed);
        }
        let mut cfg = Self::default();
        cfg.merge_file(file);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parses a single TOML document on top of the defaults.
    ///
    /// # Errors
    /// `Config` for invalid TOML or settings.
    pub fn from_toml_str(text: &str) -> Result<Self, DbError> {
        let file: FileConfig = toml::from_str(text).map_err(|e| DbError::Config(e.to_string()))?;
        let mut cfg = Self::default();
        cfg.merge_file(file);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Applies `NEXUSRPC_URL`, `NEXUSRPC_DATABASE` and `NEXUSRPC_TIMEOUT_MS`.
    ///
    /// # Errors
    /// `Config` when `NEXUSRPC_TIMEOUT_MS` is not an integer.
    pub fn apply_env(&mut self) -> Result<(), DbError> {
        self.apply_env_from(|k| std::env::var(k).ok())
    }

    /// Same as [`apply_env`](Self::apply_env) with an injectable variable lookup.
    ///
    /// # Errors
    /// `Config` when the timeout value is not an integer.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), DbError> {
        if let Some(url) = lookup("NEXUSRPC_URL") {
            self.server_url = url;
        }
        if let Some(db) = lookup("NEXUSRPC_DATABASE") {
            self.database = db;
        }
        if let Some(ms) = lookup("NEXUSRPC_TIMEOUT_MS") {
            self.timeout_ms = ms.parse().map_err(|_| {
                DbError::Config(format!("NEXUSRPC_TIMEOUT_MS `{ms}` is not an integer"))
            })?;
        }
        Ok(())
    }

    /// # Errors
    /// `Config` for an empty server URL or database name, or a zero timeout.
    pub fn validate(&self) -> Result<(), DbError> {
        if self.server_url.trim().is_empty() {
            return Err(DbError::Config("server_url is empty".into()));
        }
        if self.database.trim().is_empty() {
            return Err(DbError::Config("database is empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(DbError::Config("timeout_ms must be positive".into()));
        }
        Ok(())
    }

    /// Routes process logs according to `log_dir`/`log_level`; no-op without `log_dir`.
    ///
    /// # Errors
    /// `Config` when the logger cannot be set up.
    pub fn init_logging(&self) -> Result<(), DbError> {
        let Some(dir) = &self.log_dir else {
            return Ok(());
        };
        crate::logger::configure_logging(Some(dir), self.log_level.as_deref(), None)
            .map_err(|e| DbError::Config(format!("logging: {e}")))
    }

    fn merge_file(&mut self, file: FileConfig) {
        if let Some(v) = file.server_url { self.server_url = v; }
        if let Some(v) = file.database { self.database = v; }
        if let Some(v) = file.timeout_ms { self.timeout_ms = v; }
        if file.log_dir.is_some() { self.log_dir = file.log_dir; }
        if file.log_level.is_some() { self.log_level = file.log_level; }
    }
}

fn config_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = vec![];
    if let Some(p) = explicit { paths.push(p.to_path_buf()); }
    if let Ok(p) = std::env::var("NEXUSRPC_CONFIG") { paths.push(PathBuf::from(p)); }
    if let Some(dir) = dirs_next::config_dir() { paths.push(dir.join("nexusrpc.toml")); }
    if let Ok(cur) = std::env::current_dir() { paths.push(cur.join("nexusrpc.toml")); }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = ClientConfig::from_toml_str("server_url = \"db.internal:9000\"\n").unwrap();
        cfg.apply_env_from(|k| (k == "NEXUSRPC_DATABASE").then(|| "orders".to_string())).unwrap();
        assert_eq!(cfg.server_url, "db.internal:9000");
        assert_eq!(cfg.database, "orders");
    }

    #[test]
    fn bad_timeout_env_is_rejected() {
        let mut cfg = ClientConfig::default();
        let err = cfg.apply_env_from(|k| (k == "NEXUSRPC_TIMEOUT_MS").then(|| "soon".to_string()));
        assert!(matches!(err, Err(DbError::Config(_))));
    }
}
