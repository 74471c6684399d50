//! Attenda server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use apalis::prelude::*;
use axum::{Router, middleware};
use sea_orm::{ConnectOptions, Database};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use attenda_api::{middleware::AppState, router as api_router};
use attenda_common::{Config, LocalStorage, storage::StorageBackend};
use attenda_core::{
    AttendanceService, AuthService, EnrollmentService, EventService, FcmDispatcher, JwtKeys,
    MailService, NoOpMailQueue, NoOpPush, OutsideEventService, PushService, ReminderService,
    SettingsService, seed_admin,
};
use attenda_db::repositories::{
    AdminSettingsRepository, AttendanceRepository, EnrollmentRepository, EventRepository,
    OutsideEventRepository, UserRepository,
};
use attenda_queue::{
    EmailJob, JobExecutor, MailContext, RedisMailQueue, SchedulerConfig, email_worker,
    run_scheduler,
};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Adapter running the reminder sweep under the queue scheduler.
struct ReminderExecutor(ReminderService);

#[async_trait::async_trait]
impl JobExecutor for ReminderExecutor {
    async fn send_event_reminders(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        self.0.run_sweep().await.map_err(Into::into)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attenda=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting attenda server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let mut db_opts = ConnectOptions::new(&config.database.url);
    db_opts
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections);

    let db = Database::connect(db_opts).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    attenda_db::migrate(&db).await?;
    info!("Migrations completed");

    // Connect to Redis and initialize the mail job queue
    info!("Connecting to Redis...");
    let redis_client =
        redis::Client::open(config.redis.url.as_str()).expect("Failed to create Redis client");
    let redis_conn = redis::aio::ConnectionManager::new(redis_client)
        .await
        .expect("Failed to connect to Redis");
    let redis_storage = apalis_redis::RedisStorage::<EmailJob>::new(redis_conn);
    info!("Connected to Redis job queue");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let settings_repo = AdminSettingsRepository::new(Arc::clone(&db));
    let event_repo = EventRepository::new(Arc::clone(&db));
    let outside_event_repo = OutsideEventRepository::new(Arc::clone(&db));
    let enrollment_repo = EnrollmentRepository::new(Arc::clone(&db));
    let attendance_repo = AttendanceRepository::new(Arc::clone(&db));

    // Seed the bootstrap admin and the policy row
    seed_admin(&user_repo, &settings_repo, &config).await?;

    // Push dispatcher (no-op without credentials)
    let push: PushService = match config.fcm.server_key.clone() {
        Some(server_key) => {
            info!("Push dispatch enabled (FCM)");
            Arc::new(FcmDispatcher::new(server_key, config.fcm.endpoint.clone()))
        }
        None => {
            info!("Push dispatch disabled (no FCM server key)");
            Arc::new(NoOpPush)
        }
    };

    // Mail queue and SMTP worker (no-op without SMTP credentials)
    let mail_context = MailContext::from_config(&config.smtp)?;
    let mail: MailService = if mail_context.is_some() {
        Arc::new(RedisMailQueue::new(redis_storage.clone()))
    } else {
        info!("Mail delivery disabled (no SMTP relay configured)");
        Arc::new(NoOpMailQueue)
    };

    // Object storage for profile images
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        config.storage.base_path.clone().into(),
        config.storage.base_url.clone(),
    ));

    // Initialize services
    let keys = JwtKeys::from_config(&config);
    let auth_service = AuthService::new(user_repo.clone(), keys, push.clone(), mail);
    let attendance_service = AttendanceService::new(attendance_repo.clone(), user_repo.clone());
    let event_service = EventService::new(
        event_repo.clone(),
        enrollment_repo.clone(),
        user_repo.clone(),
        settings_repo.clone(),
        push.clone(),
    );
    let outside_event_service = OutsideEventService::new(
        Arc::clone(&db),
        outside_event_repo,
        user_repo.clone(),
        attendance_repo.clone(),
        settings_repo.clone(),
        push.clone(),
    );
    let enrollment_service = EnrollmentService::new(
        Arc::clone(&db),
        enrollment_repo.clone(),
        event_repo.clone(),
        user_repo.clone(),
        attendance_repo,
        settings_repo.clone(),
        push.clone(),
    );
    let settings_service = SettingsService::new(settings_repo.clone(), user_repo.clone());

    // Create app state
    let state = AppState {
        auth_service,
        attendance_service,
        event_service,
        outside_event_service,
        enrollment_service,
        settings_service,
        storage,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            attenda_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start the SMTP worker if mail is configured
    if let Some(mail_ctx) = mail_context {
        info!("Starting email delivery worker...");
        tokio::spawn(async move {
            let monitor = Monitor::new().register({
                WorkerBuilder::new("email")
                    .data(mail_ctx)
                    .backend(redis_storage)
                    .build_fn(email_worker)
            });

            if let Err(e) = monitor.run().await {
                tracing::error!(error = %e, "Email worker failed");
            }
        });
        info!("Email delivery worker started");
    }

    // Start the reminder sweep scheduler
    let reminder_service = ReminderService::new(
        event_repo,
        enrollment_repo,
        user_repo,
        settings_repo,
        push,
    );
    let scheduler_config = SchedulerConfig {
        reminder_interval: Duration::from_secs(config.scheduler.reminder_interval_secs),
    };
    run_scheduler(scheduler_config, Arc::new(ReminderExecutor(reminder_service))).await;
    info!("Reminder scheduler started");

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
