//! Services layer: business logic over the database, token and revocation
//! collaborators.

mod audit;
mod auth;
pub mod database;
pub mod error;
mod guard;
mod jwt;
mod lifecycle;
pub mod permissions;
pub mod redis;

pub use audit::{AuditQuery, AuditRecorder};
pub use auth::AuthService;
pub use database::{AuditLogFilter, Database, DashboardStats};
pub use error::ServiceError;
pub use guard::AccessGuard;
pub use jwt::{AccessTokenClaims, JwtService, RefreshTokenClaims, TokenResponse};
pub use lifecycle::{generate_tracking_id, ApplicationLifecycle};
pub use redis::{MockBlacklist, RedisService, TokenBlacklist};
