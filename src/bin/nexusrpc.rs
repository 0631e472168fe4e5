use clap::{Parser, Subcommand};
use nexusrpc::config::ClientConfig;
use nexusrpc::errors::DbError;
use nexusrpc::filter::{
    encode_filter, encode_read_fields, encode_update_fields, parse_filter_json,
    parse_read_fields_json, parse_update_json,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "nexusrpc", version, about = "Inspect nexusrpc wire payloads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(name = "encode-filter", about = "Print the wire form of a filter")]
    EncodeFilter {
        #[arg(help = r#"Filter JSON (e.g., {"op":"or","selectorFilters":[{"fields":{"a":1}}]})"#)]
        json: String,
    },
    #[command(name = "encode-update", about = "Print the wire form of an update")]
    EncodeUpdate {
        #[arg(help = "Update JSON (e.g., {\"$set\":{\"address\":{\"city\":\"SF\"}}})")]
        json: String,
    },
    #[command(name = "encode-fields", about = "Print the wire form of a projection")]
    EncodeFields {
        #[arg(help = "Read fields JSON (e.g., {\"include\":[\"name\",\"age\"]})")]
        json: String,
    },
    #[command(name = "show-config", about = "Print the resolved client configuration as TOML")]
    ShowConfig {
        #[arg(long, help = "Path to a config file (TOML)")]
        config: Option<PathBuf>,
    },
}

fn run(cmd: Commands) -> Result<String, DbError> {
    match cmd {
        Commands::EncodeFilter { json } => encode_filter(&parse_filter_json(&json)?),
        Commands::EncodeUpdate { json } => encode_update_fields(&parse_update_json(&json)?),
        Commands::EncodeFields { json } => encode_read_fields(&parse_read_fields_json(&json)?),
        Commands::ShowConfig { config } => {
            let cfg = ClientConfig::load(config.as_deref())?;
            toml::to_string(&cfg).map_err(|e| DbError::Config(e.to_string()))
        }
    }
}

fn main() -> ExitCode {
    if std::env::var_os("NEXUSRPC_LOG_DIR").is_some()
        && let Err(e) = nexusrpc::logger::configure_from_env()
    {
        eprintln!("logging disabled: {e}");
    }
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
