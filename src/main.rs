use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use sourcing_api::clients::{HttpIdentityProvider, HttpMailer, HttpObjectStore};
use sourcing_api::config::{init_tracing, load_config};
use sourcing_api::db::{establish_connection_from_app_config, run_migrations};
use sourcing_api::events::{event_channel, process_events};
use sourcing_api::handlers::AppServices;
use sourcing_api::{api_routes, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = load_config()?;
    init_tracing(cfg.log_level(), cfg.log_json);
    info!(environment = %cfg.environment, "starting sourcing-api");

    let db = Arc::new(establish_connection_from_app_config(&cfg).await?);
    if cfg.auto_migrate {
        run_migrations(db.as_ref()).await?;
    }

    let identity = Arc::new(HttpIdentityProvider::new(
        cfg.identity_base_url.clone(),
        cfg.identity_api_key.clone(),
    ));
    let storage = Arc::new(HttpObjectStore::new(cfg.storage_base_url.clone()));
    let mailer = Arc::new(HttpMailer::new(
        cfg.email_base_url.clone(),
        cfg.email_api_key.clone(),
        cfg.email_from_address.clone(),
        cfg.email_from_name.clone(),
    ));

    let (event_sender, event_rx) = event_channel(1024);
    tokio::spawn(process_events(event_rx));

    let services = AppServices::new(
        db.clone(),
        event_sender.clone(),
        identity.clone(),
        mailer,
        &cfg,
    );

    // The scheduled sweep; the list handler shares the same implementation.
    services.expiry.clone().spawn(cfg.expiry_sweep_interval_secs);

    let state = AppState {
        db,
        config: cfg.clone(),
        event_sender,
        identity,
        storage,
        services,
    };

    // CORS from config; fall back to permissive in development only.
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    let cors_layer = if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.is_development() {
        info!("using permissive CORS (development environment)");
        CorsLayer::permissive()
    } else {
        error!("missing CORS configuration; set APP__CORS_ALLOWED_ORIGINS");
        return Err("missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS".into());
    };

    let app = api_routes()
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state);

    let addr = SocketAddr::new(cfg.host.parse()?, cfg.port);
    info!("sourcing-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
