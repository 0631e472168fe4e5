use nexusrpc::config::ClientConfig;
use nexusrpc::errors::DbError;
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(body: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(body.as_bytes()).unwrap();
    f
}

#[test]
fn explicit_file_overrides_defaults() {
    let f = config_file("server_url = \"db.example:9443\"\ndatabase = \"crm\"\n");
    let cfg = ClientConfig::load(Some(f.path())).unwrap();
    assert_eq!(cfg.server_url, "db.example:9443");
    assert_eq!(cfg.database, "crm");
    assert_eq!(cfg.timeout_ms, 30_000);
    assert!(cfg.log_dir.is_none());
}

#[test]
fn unknown_keys_are_config_errors() {
    let f = config_file("server = \"oops\"\n");
    assert!(matches!(ClientConfig::load(Some(f.path())), Err(DbError::Config(_))));
}

#[test]
fn invalid_values_fail_validation() {
    assert!(matches!(ClientConfig::from_toml_str("timeout_ms = 0\n"), Err(DbError::Config(_))));
    assert!(matches!(ClientConfig::from_toml_str("database = \"\"\n"), Err(DbError::Config(_))));
    assert!(matches!(ClientConfig::from_toml_str("timeout_ms = \"x\"\n"), Err(DbError::Config(_))));
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ClientConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, DbError::Config(ref m) if m.contains("absent.toml")));
}

#[test]
fn env_lookup_overrides() {
    let mut cfg = ClientConfig::default();
    cfg.apply_env_from(|k| match k {
        "NEXUSRPC_URL" => Some("10.0.0.5:8081".into()),
        "NEXUSRPC_TIMEOUT_MS" => Some("500".into()),
        _ => None,
    })
    .unwrap();
    assert_eq!(cfg.server_url, "10.0.0.5:8081");
    assert_eq!(cfg.timeout_ms, 500);
    assert_eq!(cfg.database, "default");
}

#[test]
fn config_serializes_back_to_toml() {
    let cfg = ClientConfig::from_toml_str("log_level = \"debug\"\n").unwrap();
    let text = toml::to_string(&cfg).unwrap();
    assert_eq!(ClientConfig::from_toml_str(&text).unwrap(), cfg);
}
