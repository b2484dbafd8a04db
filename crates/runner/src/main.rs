use std::time::Duration;

use hermes_engine::{EngineConfig, EngineKind};
use hermes_runner::{EngineBootstrap, QuoteFeed, QuoteFeedConfig};

fn print_help() {
    eprintln!(
        r#"Hermes Server - market data / order execution engine

USAGE:
    hermes-server [OPTIONS]

OPTIONS:
    --config <PATH>          Load engine configuration from a JSON file
    --engine <KIND>          Engine kind when no config file is given:
                             market-data (default) or order-execution
    --quote-interval <MS>    Milliseconds between simulated quotes (default: 1000,
                             0 disables the quote feed)
    --help                   Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                 Log level filter (default: info)

EXAMPLES:
    # Market data engine with defaults
    hermes-server

    # Order execution engine
    hermes-server --engine order-execution

    # Run with config file
    hermes-server --config engine.json
"#
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut kind = EngineKind::default();
    let mut quote_interval_ms: u64 = 1_000;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(args[i].clone());
            }
            "--engine" | "-e" => {
                i += 1;
                let Some(parsed) = args.get(i).and_then(|name| EngineKind::from_name(name)) else {
                    eprintln!("Error: --engine requires market-data or order-execution");
                    std::process::exit(1);
                };
                kind = parsed;
            }
            "--quote-interval" => {
                i += 1;
                let Some(parsed) = args.get(i).and_then(|ms| ms.parse().ok()) else {
                    eprintln!("Error: --quote-interval requires a number of milliseconds");
                    std::process::exit(1);
                };
                quote_interval_ms = parsed;
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            EngineConfig::from_file(&path)?
        }
        None => {
            log::info!("Using default {:?} configuration", kind);
            EngineConfig::for_kind(kind)
        }
    };
    log::info!("Engine: {} ({:?})", config.name, config.kind);
    log::info!("Exchange: {}", config.exchange);
    log::info!(
        "Heartbeat: threshold {}ms, interval {}ms",
        config.heartbeat.threshold_ms,
        config.heartbeat.interval_ms
    );

    let bootstrap = EngineBootstrap::with_config(config)?;
    bootstrap.server.start_server()?;

    let topology = bootstrap.server.config().topology();
    for kind in topology.kinds() {
        if let Some(binding) = topology.binding(kind) {
            log::info!("  {:<16} queue '{}'", kind.as_str(), binding.queue);
        }
    }

    let feed = (quote_interval_ms > 0).then(|| {
        let config = QuoteFeedConfig {
            interval: Duration::from_millis(quote_interval_ms),
            ..Default::default()
        };
        QuoteFeed::new(bootstrap.providers.clone(), config).spawn()
    });

    tokio::signal::ctrl_c().await?;
    log::info!("Shutdown requested");

    if let Some(feed) = feed {
        feed.abort();
    }
    bootstrap.server.stop_server();
    Ok(())
}
