use std::process::ExitCode;
use std::sync::Arc;

use common::config::Config;
use common::endpoints::{create_http_router, dispatch};
use common::errors::Result;
use common::http::HttpServer;
use common::state::AppState;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn setup_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();
}

fn run() -> Result<()> {
    let config = Config::load()?;
    let server = HttpServer::new(&config.address)?;
    info!(address = %config.address, production = config.production, "Starting server");

    let workers = config.workers;
    let router = Arc::new(create_http_router()?);
    let state = Arc::new(AppState::new(config)?);

    server.serve(workers, move |request| dispatch(&router, &state, request));
    Ok(())
}

fn main() -> ExitCode {
    setup_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Server failed to start");
            ExitCode::FAILURE
        }
    }
}
