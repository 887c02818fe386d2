pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    rate_limit::{ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ToursConfig;
use crate::services::{
    AccessGuard, ApplicationLifecycle, AuditRecorder, AuthService, Database, JwtService,
    TokenBlacklist,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::refresh,
        handlers::auth::introspect,
        handlers::auth::me,
        handlers::applications::track,
    ),
    components(
        schemas(
            models::LoginRequest,
            models::LogoutRequest,
            models::RefreshRequest,
            models::IntrospectRequest,
            models::IntrospectResponse,
            models::UserResponse,
            models::AuthResponse,
            models::PublicApplicationView,
            models::PublicStatusChange,
            services::TokenResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Admin authentication and token management"),
        (name = "Tracking", description = "Public application tracking"),
        (name = "Observability", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: ToursConfig,
    pub db: Database,
    pub jwt: JwtService,
    pub blacklist: Arc<dyn TokenBlacklist>,
    pub guard: AccessGuard,
    pub auth: AuthService,
    pub lifecycle: ApplicationLifecycle,
    pub audit: AuditRecorder,
    pub login_rate_limiter: IpRateLimiter,
    pub tracking_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Login gets its own, much tighter limiter
    let login_route = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    // Public tracking endpoint, rate limited per IP
    let tracking_route = Router::new()
        .route(
            "/api/applications/track/:tracking_id",
            get(handlers::applications::track),
        )
        .layer(from_fn_with_state(
            state.tracking_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    // Public content/catalog reads
    let public_routes = Router::new()
        .route("/api/content/posts", get(handlers::content::list_published_posts))
        .route(
            "/api/content/posts/:slug",
            get(handlers::content::get_published_post),
        )
        .route(
            "/api/content/packages",
            get(handlers::content::list_active_packages),
        )
        .route(
            "/api/content/packages/:slug",
            get(handlers::content::get_active_package),
        )
        .route("/api/products", get(handlers::products::list_active_products))
        .route(
            "/api/products/:slug",
            get(handlers::products::get_active_product),
        );

    // Everything behind the access guard
    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/admin/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/api/admin/users/:user_id",
            put(handlers::users::update_user).delete(handlers::users::deactivate_user),
        )
        .route("/api/admin/roles", get(handlers::users::list_roles))
        .route("/api/admin/permissions", get(handlers::users::list_permissions))
        .route("/api/admin/audit-logs", get(handlers::audit::list_audit_logs))
        .route("/api/admin/dashboard", get(handlers::dashboard::dashboard))
        .route(
            "/api/clients",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route(
            "/api/clients/:client_id",
            get(handlers::clients::get_client)
                .put(handlers::clients::update_client)
                .delete(handlers::clients::delete_client),
        )
        .route(
            "/api/clients/:client_id/applications",
            post(handlers::clients::create_application),
        )
        .route(
            "/api/applications",
            get(handlers::applications::list_applications),
        )
        .route(
            "/api/applications/:application_id",
            get(handlers::applications::get_application),
        )
        .route(
            "/api/applications/:application_id/status",
            put(handlers::applications::update_status),
        )
        .route(
            "/api/applications/:application_id/assignment",
            put(handlers::applications::update_assignment),
        )
        .route(
            "/api/admin/content/posts",
            get(handlers::content::list_posts).post(handlers::content::create_post),
        )
        .route(
            "/api/admin/content/posts/:post_id",
            put(handlers::content::update_post).delete(handlers::content::delete_post),
        )
        .route(
            "/api/admin/content/packages",
            get(handlers::content::list_packages).post(handlers::content::create_package),
        )
        .route(
            "/api/admin/content/packages/:package_id",
            put(handlers::content::update_package).delete(handlers::content::delete_package),
        )
        .route(
            "/api/admin/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/api/admin/products/:product_id",
            put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route(
            "/api/orders",
            get(handlers::products::list_orders).post(handlers::products::create_order),
        )
        .route("/api/orders/:order_id", get(handlers::products::get_order))
        .route(
            "/api/orders/:order_id/status",
            put(handlers::products::update_order_status),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let mut app = Router::new().route("/health", get(health_check));

    let swagger_enabled = match state.config.environment {
        config::Environment::Dev => true,
        config::Environment::Prod => state.config.swagger.enabled == config::SwaggerMode::Public,
    };

    if swagger_enabled {
        app = app
            .merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        );
    }

    let ip_limiter = state.ip_rate_limiter.clone();

    let app = app
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route("/api/auth/introspect", post(handlers::auth::introspect))
        .merge(login_route)
        .merge(tracking_route)
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state.clone())
        // Global IP rate limiting
        .layer(from_fn_with_state(ip_limiter, ip_rate_limit_middleware))
        // Tracing span per request, keyed by request id
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .map(|o| {
                            o.parse::<axum::http::HeaderValue>().unwrap_or_else(|e| {
                                tracing::error!(
                                    "Invalid CORS origin '{}': {}. Using fallback.",
                                    o,
                                    e
                                );
                                axum::http::HeaderValue::from_static("*")
                            })
                        })
                        .collect::<Vec<axum::http::HeaderValue>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ]),
        );

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "A dependency is down")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Postgres health check failed");
        e
    })?;

    state.blacklist.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Redis health check failed");
        AppError::InternalError(e)
    })?;

    Ok(axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "postgres": "up",
            "redis": "up"
        }
    })))
}
