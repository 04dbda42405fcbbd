/// Account Service Main Entry Point
///
/// Wires up the lifecycle engine with:
/// - PostgreSQL connection pool (user store)
/// - Redis connection manager (token cache)
/// - SMTP email service (notifier)
/// - Kafka producer (deletion cascade task queue)
use account_service::{
    config::Settings,
    db::PgUserStore,
    http::{self, AppState},
    lifecycle::LifecycleEngine,
    services::{EmailService, KafkaTaskQueue, LogOnlyTaskQueue, TaskQueue},
    token::RedisTokenCache,
};
use anyhow::{Context, Result};
use redis_utils::RedisPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "account_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting Account Service");

    let settings = Settings::load().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    let db_pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    info!(
        "Database pool initialized with {} max connections",
        settings.database.max_connections
    );

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    let redis_pool = RedisPool::connect(&settings.redis.url)
        .await
        .context("Failed to connect to Redis")?;

    let email_service =
        EmailService::new(&settings.email).context("Failed to initialize email service")?;
    if email_service.is_enabled() {
        info!("Email service initialized with SMTP");
    } else {
        info!("Email service running in no-op mode (SMTP not configured)");
    }

    let tasks: Arc<dyn TaskQueue> = if settings.kafka.brokers.is_empty() {
        info!("Kafka brokers not configured; deletion cascade will run in log-only mode");
        Arc::new(LogOnlyTaskQueue)
    } else {
        let brokers = settings.kafka.brokers.join(",");
        let queue = KafkaTaskQueue::new(&brokers, &settings.kafka.task_topic)
            .context("Failed to initialize Kafka task queue")?;
        info!("Kafka task queue initialized");
        Arc::new(queue)
    };

    let engine = LifecycleEngine::new(
        Arc::new(settings.tokens.clone()),
        settings.server.public_base_url.clone(),
        Arc::new(RedisTokenCache::new(redis_pool.manager())),
        Arc::new(PgUserStore::new(db_pool)),
        Arc::new(email_service),
        tasks,
    );

    let app = http::router(AppState {
        engine: Arc::new(engine),
    });

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting HTTP server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Account service shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutting down gracefully...");
}
