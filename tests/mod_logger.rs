use nexusrpc::config::ClientConfig;
use nexusrpc::logger::{WIRE_TARGET, configure_logging};

#[test]
fn writes_app_and_wire_logs() {
    let dir = tempfile::tempdir().unwrap();
    configure_logging(Some(dir.path()), Some("debug"), Some(2)).unwrap();
    log::info!("client started");
    log::debug!(target: WIRE_TARGET, "read db.users filter=2B");
    log::logger().flush();

    let app = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
    let wire = std::fs::read_to_string(dir.path().join("wire.log")).unwrap();
    assert!(app.contains("client started"));
    assert!(!app.contains("filter=2B"));
    assert!(wire.contains("filter=2B"));

    // Reconfiguring replaces the active appenders.
    let second = tempfile::tempdir().unwrap();
    let cfg = ClientConfig {
        log_dir: Some(second.path().to_path_buf()),
        log_level: Some("info".into()),
        ..ClientConfig::default()
    };
    cfg.init_logging().unwrap();
    log::info!("moved");
    log::logger().flush();
    let moved = std::fs::read_to_string(second.path().join("app.log")).unwrap();
    assert!(moved.contains("moved"));
}
