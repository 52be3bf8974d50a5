//! MerchLink Service Entry Point
//!
//! Loads configuration from the environment, initializes logging, and
//! serves the HTTP + realtime API.

use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use merchlink::api::AppState;
use merchlink::logging::{self, LogLevel};
use merchlink::session::{Base64TokenEncoder, MerchantStore};
use merchlink::{create_router, MacResolver, MerchLinkConfig, MerchLinkError};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config = match MerchLinkConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = logging::init_logging(
        LogLevel::from(config.log_level.as_str()),
        config.log_json,
    ) {
        eprintln!("{}", e);
        process::exit(1);
    }

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "service failed");
        process::exit(1);
    }
}

async fn run(config: MerchLinkConfig) -> Result<(), MerchLinkError> {
    let store = MerchantStore::new(&config.data_dir)?.into_shared();

    let state = AppState::new(
        store,
        Arc::new(MacResolver),
        Arc::new(Base64TokenEncoder),
        Duration::from_secs(config.expiry_secs),
    );

    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!(
        %addr,
        data_dir = %config.data_dir.display(),
        expiry_secs = config.expiry_secs,
        "merchlink listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
