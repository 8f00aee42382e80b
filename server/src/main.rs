mod config;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    Extension, Router,
};
use job_notifications::JobsApiClient;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use config::Config;
use routes::{jobs::job_routes, notifications::notification_routes};
use state::{sweep_sessions, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1) .env, then logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    // 2) Configuration
    let config = Config::from_env()?;

    // 3) Jobs API client (rejects a malformed api key), state, idle-session sweeper
    let jobs = JobsApiClient::new(&config.jobs_api_url, config.jobs_api_key.clone())?;
    let state = AppState::new(Arc::new(jobs)).with_session_ttl(config.session_ttl);
    let sweep_every = (config.session_ttl / 4).max(Duration::from_secs(1));
    tokio::spawn(sweep_sessions(state.clone(), sweep_every));

    // 4) CORS for the front end
    let cors = CorsLayer::new()
        .allow_origin(config.client_url.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    // 5) Routes and layers
    let app = Router::new()
        .nest("/api", notification_routes().merge(job_routes()))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // 6) Serve
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, jobs_api = %config.jobs_api_url, "portal server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
