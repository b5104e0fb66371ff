use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spijker_api::config::ServerConfig;
use spijker_api::router::build_app_router;
use spijker_api::state::AppState;
use spijker_api::ws;
use spijker_db::StoreConfig;
use spijker_drive::{DriveApi, DriveConfig};
use spijker_events::EventBus;
use spijker_pipeline::{GenerationManager, SharedGallery};
use spijker_workflow::{WorkflowConfig, WorkflowSubmitter};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "spijker_api=debug,spijker_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    config.poll.validate().expect("Invalid polling configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        interval_secs = config.poll.interval.as_secs(),
        max_attempts = config.poll.max_attempts,
        target = config.poll.target_count,
        on_exhausted = %config.poll.on_exhausted,
        "Loaded server configuration"
    );

    // --- Session store ---
    let store_config = StoreConfig::from_env().expect("Invalid session store configuration");
    let store = spijker_db::create_store(&store_config).expect("Failed to create store client");
    match spijker_db::health_check(&store).await {
        Ok(()) => tracing::info!("Session store health check passed"),
        Err(e) => tracing::warn!(error = %e, "Session store unreachable, continuing degraded"),
    }

    // --- Upstream clients ---
    let drive = DriveApi::new(&DriveConfig::from_env()).expect("Failed to create Drive client");
    if !drive.has_api_key() {
        tracing::warn!("GOOGLE_DRIVE_API_KEY is not set, polling will fail until it is");
    }

    let mut workflow_config = WorkflowConfig::new(config.workflow_webhook_url.clone());
    workflow_config.timeout = config.workflow_timeout();
    let submitter = WorkflowSubmitter::new(workflow_config).expect("Invalid workflow configuration");

    // --- Gallery ---
    let gallery = Arc::new(SharedGallery::load(config.history_path.clone()).await);

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let forwarder = ws::EventForwarder::new(Arc::clone(&ws_manager));
    let forwarder_handle = tokio::spawn(forwarder.run(event_bus.subscribe()));
    tracing::info!("Event forwarder started");

    // --- Generation manager ---
    let generations = Arc::new(GenerationManager::new(
        Arc::new(submitter),
        Arc::new(drive),
        Arc::new(store.clone()),
        config.poll.clone(),
        Arc::clone(&gallery),
        Arc::clone(&event_bus),
    ));

    // --- App state ---
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
        generations: Arc::clone(&generations),
        gallery,
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Cancel the active run first; it may still patch its session row.
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(shutdown_timeout, generations.shutdown())
        .await
        .is_err()
    {
        tracing::warn!("Generation manager did not shut down in time");
    }

    // The router state was dropped with the server, so this is the last
    // sender; dropping it closes the channel and ends the forwarder.
    drop(generations);
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), forwarder_handle).await;
    tracing::info!("Event forwarder shut down");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM (on Unix) to start graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
