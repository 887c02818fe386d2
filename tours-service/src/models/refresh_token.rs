//! Persisted refresh sessions.
//!
//! The refresh JWT's `jti` is the primary key here, so a session can be
//! revoked server-side before its natural expiry.

use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct RefreshSession {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub expires_utc: DateTime<Utc>,
    pub revoked: bool,
    pub created_utc: DateTime<Utc>,
}

impl RefreshSession {
    pub fn new(token_id: Uuid, user_id: Uuid, expiry_days: i64) -> Self {
        let now = Utc::now();
        Self {
            token_id,
            user_id,
            expires_utc: now + Duration::days(expiry_days),
            revoked: false,
            created_utc: now,
        }
    }

    pub fn is_usable(&self) -> bool {
        !self.revoked && self.expires_utc > Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_usable() {
        let s = RefreshSession::new(Uuid::new_v4(), Uuid::new_v4(), 7);
        assert!(s.is_usable());
    }

    #[test]
    fn revoked_session_is_not_usable() {
        let mut s = RefreshSession::new(Uuid::new_v4(), Uuid::new_v4(), 7);
        s.revoked = true;
        assert!(!s.is_usable());
    }

    #[test]
    fn expired_session_is_not_usable() {
        let mut s = RefreshSession::new(Uuid::new_v4(), Uuid::new_v4(), 7);
        s.expires_utc = Utc::now() - Duration::minutes(1);
        assert!(!s.is_usable());
    }
}
