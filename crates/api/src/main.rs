use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offboardpro_api::config::ServerConfig;
use offboardpro_api::router::build_app_router;
use offboardpro_api::state::AppState;
use offboardpro_events::queue::DEFAULT_QUEUE_CAPACITY;
use offboardpro_events::{
    AnalysisConfig, EmailConfig, EmailDelivery, JobQueue, JobWorker, SurveyAnalyzer,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offboardpro_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    if config.paddle_webhook_secret.is_none() {
        tracing::warn!("PADDLE_WEBHOOK_SECRET not set, webhook signatures are not verified");
    }
    if config.cron_secret.is_none() {
        tracing::warn!("CRON_SECRET not set, cron endpoints reject every call");
    }

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = offboardpro_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    offboardpro_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    offboardpro_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // --- Background jobs ---
    let email = EmailConfig::from_env().map(EmailDelivery::new);
    if email.is_none() {
        tracing::warn!("SMTP_HOST not set, emails are logged and skipped");
    }
    let analyzer = SurveyAnalyzer::new(AnalysisConfig::from_env());

    let (jobs, receiver) = JobQueue::new(DEFAULT_QUEUE_CAPACITY);
    let worker_cancel = CancellationToken::new();
    let worker = JobWorker::new(pool.clone(), email, analyzer);
    let worker_handle = tokio::spawn(worker.run(receiver, worker_cancel.clone()));
    tracing::info!("Job worker started");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        jobs,
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
    tracing::info!("Server stopped accepting connections, draining job queue");

    worker_cancel.cancel();
    let drain_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(drain_timeout, worker_handle).await.is_err() {
        tracing::warn!("Job worker did not drain before the shutdown timeout");
    }

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
        () = ctrl_c => tracing::info!("Received Ctrl-C, starting graceful shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
