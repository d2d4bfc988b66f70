mod models;
mod server;

use models::{AdapterMode, AppConfig, PublisherManager};
use server::AppState;

use anyhow::Result;
use clap::{Arg, Command};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let matches = Command::new("Crosspostrs")
        .version("1.0")
        .about("Blog Cross-Poster - Publishes a blog post to several social platforms at once")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Configuration file path")
                .default_value("config.json"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .help("Address to bind the HTTP server to")
                .value_name("HOST"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to bind the HTTP server to")
                .value_name("PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .help("Publisher mode: demo (simulated) or live (real platform APIs)")
                .value_parser(["demo", "live"]),
        )
        .get_matches();

    let config_file = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.json");

    log::info!("Starting Crosspostrs");
    log::info!("Config file: {}", config_file);

    let mut config = AppConfig::load(config_file)?;
    if let Some(host) = matches.get_one::<String>("host") {
        config.server.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }
    if let Some(mode) = matches.get_one::<String>("mode") {
        config.mode = mode.parse::<AdapterMode>()?;
    }
    config.validate()?;

    if config.mode == AdapterMode::Live {
        log::warn!("Live mode enabled: posts will be sent to real platform APIs");
    }

    let publishers = PublisherManager::from_config(&config)?;
    log::info!(
        "Loaded {} publishers: {:?}",
        config.platforms.len(),
        publishers
            .list_publishers()
            .iter()
            .map(|p| p.id.as_str())
            .collect::<Vec<_>>()
    );

    let app = server::router(Arc::new(AppState { publishers }));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {}", e);
            }
            log::info!("Shutdown signal received, stopping server");
        })
        .await?;

    log::info!("Crosspostrs stopped");
    Ok(())
}
