//! Process-wide logging on top of `log4rs`.
//!
//! Two rolling files are written: `app.log` for everything and `wire.log` for the
//! `nexusrpc::wire` target, which records each request's operation and payload sizes.

use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use parking_lot::Mutex;
use std::error::Error;
use std::path::{Path, PathBuf};

pub const WIRE_TARGET: &str = "nexusrpc::wire";

const ENCODER_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;

static HANDLE: Mutex<Option<log4rs::Handle>> = Mutex::new(None);

/// Initializes the logging system from `log4rs.yaml` in the working directory, if present.
///
/// # Errors
/// Returns an error if the file exists but cannot be loaded.
pub fn init() -> Result<(), Box<dyn Error>> {
    let path = Path::new("log4rs.yaml");
    if path.exists() {
        init_path(path)?;
    }
    Ok(())
}

/// Initializes the logging system from a specific config file path.
///
/// # Errors
/// Returns an error if the file cannot be parsed or a logger is already installed.
pub fn init_path(path: &Path) -> Result<(), Box<dyn Error>> {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

/// Configures logging for the process; later calls replace the active configuration.
/// - dir: base directory for logs; if None, current directory.
/// - level: error|warn|info|debug|trace (default info)
/// - retention: number of rolled files to keep (default 7)
///
/// # Errors
/// Returns an error if the directory or appenders cannot be created.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<u32>,
) -> Result<(), Box<dyn Error>> {
    let base = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&base)?;
    let keep = retention.unwrap_or(7);
    let lvl = parse_level(level.unwrap_or("info"));

    let app = rolling_appender(&base, "app", keep)?;
    let wire = rolling_appender(&base, "wire", keep)?;
    let config = Config::builder()
        .appender(Appender::builder().build("app", Box::new(app)))
        .appender(Appender::builder().build("wire", Box::new(wire)))
        .logger(Logger::builder().appender("wire").additive(false).build(WIRE_TARGET, lvl))
        .build(Root::builder().appender("app").build(lvl))?;

    let mut handle = HANDLE.lock();
    match handle.as_ref() {
        Some(h) => h.set_config(config),
        None => *handle = Some(log4rs::init_config(config)?),
    }
    Ok(())
}

/// Configures logging from environment variables if present:
/// - NEXUSRPC_LOG_DIR
/// - NEXUSRPC_LOG_LEVEL
/// - NEXUSRPC_LOG_RETENTION
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_from_env() -> Result<(), Box<dyn Error>> {
    let dir = std::env::var("NEXUSRPC_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("NEXUSRPC_LOG_LEVEL").ok();
    let retention =
        std::env::var("NEXUSRPC_LOG_RETENTION").ok().and_then(|s| s.parse::<u32>().ok());
    configure_logging(dir.as_deref(), level.as_deref(), retention)
}

fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling_appender(
    base: &Path,
    name: &str,
    keep: u32,
) -> Result<RollingFileAppender, Box<dyn Error>> {
    let pattern = base.join(format!("{name}.{{}}.log"));
    let roller = FixedWindowRoller::builder().build(&pattern.display().to_string(), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(ENCODER_PATTERN)))
        .build(base.join(format!("{name}.log")), Box::new(policy))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("bogus"), LevelFilter::Info);
        assert_eq!(parse_level("off"), LevelFilter::Off);
    }
}
