//! Binary entry point: wires config, engine, scheduler, and HTTP
//! surface together and runs until a shutdown signal arrives (§5, §6).

use std::sync::Arc;

use market::{router, AppState, Engine, Scheduler};
use market_types::EngineConfig;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
#[cfg(feature = "tracing")]
use tracing::info;

#[tokio::main]
async fn main() {
    #[cfg(feature = "tracing")]
    {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    let config = EngineConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    let engine = Arc::new(Engine::production(config));

    let scheduler = match Scheduler::start(engine.clone()).await {
        Ok(scheduler) => Arc::new(scheduler),
        Err(err) => {
            #[cfg(feature = "tracing")]
            tracing::error!(%err, "failed to start scheduler");
            #[cfg(not(feature = "tracing"))]
            eprintln!("failed to start scheduler: {err}");
            std::process::exit(1);
        }
    };

    let app = router(AppState { engine: engine.clone(), scheduler: scheduler.clone() })
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(30)));

    #[cfg(feature = "tracing")]
    info!(%bind_addr, "listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|err| panic!("failed to bind {bind_addr}: {err}"));

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await.expect("server error");

    // tokio-cron-scheduler's shutdown is the only other thing left to
    // drain; nothing holds a second reference by the time we get here.
    if let Ok(scheduler) = Arc::try_unwrap(scheduler) {
        let _ = scheduler.shutdown().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
