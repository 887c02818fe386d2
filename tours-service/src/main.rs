use std::net::SocketAddr;
use std::sync::Arc;

use service_core::middleware::rate_limit::create_ip_rate_limiter;
use service_core::observability::logging::init_tracing;
use tokio::signal;

use tours_service::{
    build_router,
    config::ToursConfig,
    models::{AdminUser, AuditLog, Role},
    services::{
        AccessGuard, ApplicationLifecycle, AuditRecorder, AuthService, Database, JwtService,
        RedisService,
    },
    utils::{hash_password, Password},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = ToursConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting tours backend"
    );

    let db = Database::new(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized successfully");

    let redis = RedisService::new(&config.redis).await?;
    let blacklist = Arc::new(redis);
    tracing::info!("Redis service initialized");

    let jwt = JwtService::new(&config.jwt)?;
    tracing::info!("JWT service initialized");

    bootstrap_superadmin(&db, &config).await?;

    let guard = AccessGuard::new(jwt.clone(), blacklist.clone());
    let auth = AuthService::new(db.clone(), jwt.clone(), blacklist.clone());
    let lifecycle = ApplicationLifecycle::new(db.clone());
    let audit = AuditRecorder::new(db.clone());

    let login_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.login_attempts,
        config.rate_limit.login_window_seconds,
    );
    let tracking_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.tracking_attempts,
        config.rate_limit.tracking_window_seconds,
    );
    let ip_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );
    tracing::info!("Rate limiters initialized: Login, Tracking and Global IP");

    let state = AppState {
        config: config.clone(),
        db,
        jwt,
        blacklist,
        guard,
        auth,
        lifecycle,
        audit,
        login_rate_limiter,
        tracking_rate_limiter,
        ip_rate_limiter,
    };

    let app = build_router(state).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

/// First-run bootstrap: when no admin account exists and the bootstrap
/// credentials are configured, create the initial super admin.
async fn bootstrap_superadmin(
    db: &Database,
    config: &ToursConfig,
) -> Result<(), service_core::error::AppError> {
    let (email, password) = match (
        &config.security.bootstrap_admin_email,
        &config.security.bootstrap_admin_password,
    ) {
        (Some(email), Some(password)) => (email, password),
        _ => return Ok(()),
    };

    let (_, total) = db.list_users(1, 0).await?;
    if total > 0 {
        return Ok(());
    }

    let password_hash = hash_password(&Password::new(password.clone()))?;
    let admin = AdminUser::new(
        email.to_lowercase(),
        password_hash.into_string(),
        "Super".to_string(),
        "Admin".to_string(),
        Role::SuperAdmin,
    );
    let audit = AuditLog::new(None, "bootstrap_superadmin", "user", Some(admin.user_id.to_string()), None);
    db.insert_user(&admin, &audit).await?;

    tracing::info!(email = %admin.email, "Bootstrap super admin created");
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
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
