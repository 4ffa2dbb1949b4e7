use log::{error, info, warn};
use std::net::SocketAddr;

use coursehub::config::ServerConfig;
use coursehub::routes;
use coursehub::server::AppState;
use coursehub::storage::Database;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    // Initialize env before logging so RUST_LOG can come from .env
    let dotenv_result = dotenvy::dotenv();

    // Initialize logging
    env_logger::init();

    match dotenv_result {
        Ok(_) => info!("Environment variables loaded from .env file"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Load config from environment
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, database={}, uploads={}",
        config.host,
        config.port,
        config.database_path,
        config.upload_dir.display()
    );

    let db = match Database::connect(&config.database_path).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    let tls_paths = match (&config.tls_cert_path, &config.tls_key_path) {
        (Some(cert), Some(key)) if config.enable_tls => Some((cert.clone(), key.clone())),
        _ => None,
    };

    let state = AppState::new(config, db.clone());
    let routes = routes(state);

    match tls_paths {
        Some((cert, key)) => {
            info!("Starting Course Hub server on https://{}", addr);
            let (_, server) = warp::serve(routes)
                .tls()
                .cert_path(cert)
                .key_path(key)
                .bind_with_graceful_shutdown(addr, shutdown_signal());
            server.await;
        }
        None => {
            info!("Starting Course Hub server on http://{}", addr);
            match warp::serve(routes).try_bind_with_graceful_shutdown(addr, shutdown_signal()) {
                Ok((_, server)) => server.await,
                Err(e) => {
                    error!("Failed to bind {}: {}", addr, e);
                    std::process::exit(1);
                }
            }
        }
    }

    db.pool().close().await;
    info!("Server stopped");
}
