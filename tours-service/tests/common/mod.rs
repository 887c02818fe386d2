//! Shared test harness: application state over a lazy pool and an
//! in-memory blacklist, so tests need no running Postgres or Redis.
#![allow(dead_code)]

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tours_service::config::{
    DatabaseConfig, Environment, JwtConfig, LifecycleConfig, RateLimitConfig, RedisConfig,
    SecurityConfig, SwaggerConfig, SwaggerMode, ToursConfig,
};
use tours_service::services::{
    AccessGuard, ApplicationLifecycle, AuditRecorder, AuthService, Database, JwtService,
    MockBlacklist, TokenBlacklist,
};
use tours_service::AppState;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

pub fn test_config() -> ToursConfig {
    ToursConfig {
        common: service_core::config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "tours-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        database: DatabaseConfig {
            url: "postgres://localhost:5432/tours_test".to_string(),
            max_connections: 2,
            min_connections: 1,
        },
        redis: RedisConfig {
            url: "redis://localhost:6379".to_string(),
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
        rate_limit: RateLimitConfig {
            login_attempts: 100,
            login_window_seconds: 60,
            tracking_attempts: 100,
            tracking_window_seconds: 60,
            global_ip_limit: 10_000,
            global_ip_window_seconds: 60,
        },
        lifecycle: LifecycleConfig {
            resubmit_capability: "applications.process".to_string(),
            cancel_capability: "applications.process".to_string(),
        },
    }
}

/// AppState over a lazily-connecting pool: nothing touches the database
/// unless a test actually issues a query.
pub fn test_state_with_blacklist(blacklist: Arc<dyn TokenBlacklist>) -> AppState {
    let config = test_config();

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_lazy(&config.database.url)
        .expect("lazy pool construction cannot fail");
    let db = Database::from_pool(pool);

    let jwt = JwtService::new(&config.jwt).expect("test JWT config is valid");
    let guard = AccessGuard::new(jwt.clone(), blacklist.clone());
    let auth = AuthService::new(db.clone(), jwt.clone(), blacklist.clone());
    let lifecycle = ApplicationLifecycle::new(db.clone());
    let audit = AuditRecorder::new(db.clone());

    let login_rate_limiter = service_core::middleware::rate_limit::create_ip_rate_limiter(
        config.rate_limit.login_attempts,
        config.rate_limit.login_window_seconds,
    );
    let tracking_rate_limiter = service_core::middleware::rate_limit::create_ip_rate_limiter(
        config.rate_limit.tracking_attempts,
        config.rate_limit.tracking_window_seconds,
    );
    let ip_rate_limiter = service_core::middleware::rate_limit::create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );

    AppState {
        config,
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
    }
}

pub fn test_state() -> AppState {
    test_state_with_blacklist(Arc::new(MockBlacklist::new()))
}
