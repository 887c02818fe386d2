pub mod password;
pub mod slug;
pub mod validation;

use axum::http::HeaderMap;

pub use password::{hash_password, verify_password, Password, PasswordHashString};
pub use slug::slugify;
pub use validation::ValidatedJson;

/// Client address for audit entries, taken from the proxy header.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
