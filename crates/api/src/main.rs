use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use roomwatch_api::bootstrap;
use roomwatch_api::broadcast::FeedBroadcaster;
use roomwatch_api::config::ServerConfig;
use roomwatch_api::router::build_app_router;
use roomwatch_api::ws;
use roomwatch_detector::SimulatedDetector;
use roomwatch_events::{OccupancyPersistence, RoomFeed};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "roomwatch_api=debug,roomwatch_pipeline=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        detector = ?config.detector,
        full_threshold_percent = config.status_policy.full_threshold_percent(),
        "Loaded server configuration"
    );

    // --- Rooms ---
    let room_configs = bootstrap::load_room_configs(&config).expect("Failed to load rooms");
    let registry = bootstrap::build_registry(&room_configs, config.status_policy)
        .expect("Failed to build room registry");

    // --- Sampling profiles ---
    let live = bootstrap::live_profile(&config).expect("Failed to set up live detector");
    let ambient = bootstrap::ambient_profile(&registry);

    // --- App state ---
    let state = bootstrap::build_state(
        config.clone(),
        registry,
        live,
        ambient,
        Arc::new(SimulatedDetector::default()),
    );
    let ws_manager = Arc::clone(&state.ws_manager);
    let sampling = Arc::clone(&state.sampling);

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Event services ---
    let services_cancel = CancellationToken::new();

    let broadcaster = FeedBroadcaster::new(Arc::clone(&ws_manager));
    let broadcaster_handle = tokio::spawn(broadcaster.run(
        RoomFeed::new(state.event_bus(), Arc::clone(state.registry())),
        services_cancel.clone(),
    ));

    let persistence_handle = match &config.persist_url {
        Some(url) => {
            let sink = OccupancyPersistence::new(url.clone())
                .expect("Failed to build persistence client");
            tracing::info!(url = %url, "Occupancy persistence enabled");
            Some(tokio::spawn(sink.run(
                RoomFeed::new(state.event_bus(), Arc::clone(state.registry())),
                services_cancel.clone(),
            )))
        }
        None => None,
    };

    // --- Sampling ---
    if config.autostart_sampling {
        let started = sampling.start_all().await;
        tracing::info!(started, "Sampling loops started");
    }

    // --- Router ---
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

    // Loops first, so no update is produced after the feeds stop.
    sampling.shutdown().await;

    let join_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    services_cancel.cancel();
    let _ = tokio::time::timeout(join_timeout, broadcaster_handle).await;
    if let Some(handle) = persistence_handle {
        let _ = tokio::time::timeout(join_timeout, handle).await;
    }
    tracing::info!("Event services shut down");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
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
