//! PostgreSQL database service.
//!
//! Every mutating operation takes the audit entry it must record and writes
//! both inside one transaction: the business mutation and its audit row
//! commit or abort together. Reads rely on the store's native isolation.

use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    AdminUser, Application, ApplicationStatusHistory, AuditLog, Client, Order, OrderItem, Post,
    Product, RefreshSession, TravelPackage,
};

/// Filters for the audit query path.
#[derive(Debug, Default)]
pub struct AuditLogFilter {
    pub actor_user_id: Option<Uuid>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub from_utc: Option<DateTime<Utc>>,
    pub to_utc: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

/// Aggregated counts for the admin dashboard.
#[derive(Debug, serde::Serialize)]
pub struct DashboardStats {
    pub clients_total: i64,
    pub clients_new_this_week: i64,
    pub applications_total: i64,
    pub applications_by_status: Vec<StatusCount>,
    pub posts_total: i64,
    pub posts_published: i64,
    pub packages_active: i64,
    pub products_active: i64,
    pub orders_total: i64,
    pub orders_pending: i64,
}

#[derive(Debug, serde::Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// PostgreSQL connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

fn db_err(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(anyhow::anyhow!(e))
}

/// Map unique-constraint violations to Conflict, everything else to a
/// database error.
fn write_err(e: sqlx::Error, what: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(anyhow::anyhow!("{} already exists", what))
        }
        _ => db_err(e),
    }
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests use `PgPool::connect_lazy`).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending schema migrations.
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        Ok(())
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }

    // ==================== Audit Operations ====================

    async fn insert_audit_log_tx(
        tx: &mut Transaction<'_, Postgres>,
        log: &AuditLog,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (audit_id, actor_user_id, action, resource_type, resource_id, details, ip_address, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(log.audit_id)
        .bind(log.actor_user_id)
        .bind(&log.action)
        .bind(&log.resource_type)
        .bind(&log.resource_id)
        .bind(&log.details)
        .bind(&log.ip_address)
        .bind(log.created_utc)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Append a standalone audit entry. Failures propagate; an unaudited
    /// mutation must not survive.
    pub async fn insert_audit_log(&self, log: &AuditLog) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        Self::insert_audit_log_tx(&mut tx, log)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    /// Query audit entries, newest first.
    pub async fn query_audit_logs(
        &self,
        filter: &AuditLogFilter,
    ) -> Result<(Vec<AuditLog>, i64), AppError> {
        let action_pattern = filter.action.as_ref().map(|a| format!("%{}%", a));

        let logs = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT * FROM audit_logs
            WHERE ($1::uuid IS NULL OR actor_user_id = $1)
              AND ($2::text IS NULL OR action ILIKE $2)
              AND ($3::text IS NULL OR resource_type = $3)
              AND ($4::text IS NULL OR resource_id = $4)
              AND ($5::timestamptz IS NULL OR created_utc >= $5)
              AND ($6::timestamptz IS NULL OR created_utc <= $6)
            ORDER BY created_utc DESC
            LIMIT $7 OFFSET $8
            "#,
        )
        .bind(filter.actor_user_id)
        .bind(&action_pattern)
        .bind(&filter.resource_type)
        .bind(&filter.resource_id)
        .bind(filter.from_utc)
        .bind(filter.to_utc)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM audit_logs
            WHERE ($1::uuid IS NULL OR actor_user_id = $1)
              AND ($2::text IS NULL OR action ILIKE $2)
              AND ($3::text IS NULL OR resource_type = $3)
              AND ($4::text IS NULL OR resource_id = $4)
              AND ($5::timestamptz IS NULL OR created_utc >= $5)
              AND ($6::timestamptz IS NULL OR created_utc <= $6)
            "#,
        )
        .bind(filter.actor_user_id)
        .bind(&action_pattern)
        .bind(&filter.resource_type)
        .bind(&filter.resource_id)
        .bind(filter.from_utc)
        .bind(filter.to_utc)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok((logs, total))
    }

    // ==================== User Operations ====================

    pub async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<AdminUser>, AppError> {
        sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<AdminUser>, AppError> {
        sqlx::query_as::<_, AdminUser>(
            "SELECT * FROM admin_users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    pub async fn list_users(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AdminUser>, i64), AppError> {
        let users = sqlx::query_as::<_, AdminUser>(
            "SELECT * FROM admin_users ORDER BY created_utc DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        Ok((users, total))
    }

    pub async fn insert_user(&self, user: &AdminUser, audit: &AuditLog) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(
            r#"
            INSERT INTO admin_users (user_id, email, password_hash, first_name, last_name, role_code, is_active, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.role_code)
        .bind(user.is_active)
        .bind(user.created_utc)
        .bind(user.updated_utc)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err(e, "User with this email"))?;

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn update_user(&self, user: &AdminUser, audit: &AuditLog) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let result = sqlx::query(
            r#"
            UPDATE admin_users
            SET email = $2, password_hash = $3, first_name = $4, last_name = $5,
                role_code = $6, is_active = $7, updated_utc = $8
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.role_code)
        .bind(user.is_active)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err(e, "User with this email"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
        }

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    /// Deactivate (or reactivate) an admin account. Deactivation also revokes
    /// the account's refresh sessions so it cannot mint new access tokens.
    pub async fn set_user_active(
        &self,
        user_id: Uuid,
        active: bool,
        audit: &AuditLog,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let result =
            sqlx::query("UPDATE admin_users SET is_active = $2, updated_utc = $3 WHERE user_id = $1")
                .bind(user_id)
                .bind(active)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
        }

        if !active {
            sqlx::query("UPDATE refresh_sessions SET revoked = TRUE WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    // ==================== Refresh Session Operations ====================

    pub async fn insert_refresh_session(
        &self,
        session: &RefreshSession,
        audit: &AuditLog,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(
            r#"
            INSERT INTO refresh_sessions (token_id, user_id, expires_utc, revoked, created_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.token_id)
        .bind(session.user_id)
        .bind(session.expires_utc)
        .bind(session.revoked)
        .bind(session.created_utc)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err(e, "Refresh session"))?;

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn find_refresh_session(
        &self,
        token_id: Uuid,
    ) -> Result<Option<RefreshSession>, AppError> {
        sqlx::query_as::<_, RefreshSession>("SELECT * FROM refresh_sessions WHERE token_id = $1")
            .bind(token_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn revoke_refresh_session(
        &self,
        token_id: Uuid,
        user_id: Uuid,
        audit: &AuditLog,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let result = sqlx::query(
            "UPDATE refresh_sessions SET revoked = TRUE WHERE token_id = $1 AND user_id = $2",
        )
        .bind(token_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Client Operations ====================

    pub async fn insert_client(&self, client: &Client, audit: &AuditLog) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(
            r#"
            INSERT INTO clients (client_id, first_name, last_name, email, phone, country,
                passport_number, date_of_birth, nationality, address,
                emergency_contact_name, emergency_contact_phone, notes, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(client.client_id)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.country)
        .bind(&client.passport_number)
        .bind(client.date_of_birth)
        .bind(&client.nationality)
        .bind(&client.address)
        .bind(&client.emergency_contact_name)
        .bind(&client.emergency_contact_phone)
        .bind(&client.notes)
        .bind(client.created_utc)
        .bind(client.updated_utc)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err(e, "Client with this email"))?;

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn find_client_by_id(&self, client_id: Uuid) -> Result<Option<Client>, AppError> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE client_id = $1")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>, AppError> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn update_client(&self, client: &Client, audit: &AuditLog) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET first_name = $2, last_name = $3, email = $4, phone = $5, country = $6,
                passport_number = $7, date_of_birth = $8, nationality = $9, address = $10,
                emergency_contact_name = $11, emergency_contact_phone = $12, notes = $13,
                updated_utc = $14
            WHERE client_id = $1
            "#,
        )
        .bind(client.client_id)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.country)
        .bind(&client.passport_number)
        .bind(client.date_of_birth)
        .bind(&client.nationality)
        .bind(&client.address)
        .bind(&client.emergency_contact_name)
        .bind(&client.emergency_contact_phone)
        .bind(&client.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err(e, "Client with this email"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Client not found")));
        }

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn delete_client(&self, client_id: Uuid, audit: &AuditLog) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let result = sqlx::query("DELETE FROM clients WHERE client_id = $1")
            .bind(client_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Client not found")));
        }

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn list_clients(
        &self,
        search: Option<&str>,
        country: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Client>, i64), AppError> {
        let search_pattern = search.map(|s| format!("%{}%", s));
        let country_pattern = country.map(|c| format!("%{}%", c));

        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE ($1::text IS NULL OR first_name ILIKE $1 OR last_name ILIKE $1
                   OR email ILIKE $1 OR phone ILIKE $1)
              AND ($2::text IS NULL OR country ILIKE $2)
            ORDER BY created_utc DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&search_pattern)
        .bind(&country_pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM clients
            WHERE ($1::text IS NULL OR first_name ILIKE $1 OR last_name ILIKE $1
                   OR email ILIKE $1 OR phone ILIKE $1)
              AND ($2::text IS NULL OR country ILIKE $2)
            "#,
        )
        .bind(&search_pattern)
        .bind(&country_pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok((clients, total))
    }

    /// Applications for a client that are not in a terminal state.
    pub async fn count_open_applications(&self, client_id: Uuid) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM applications
            WHERE client_id = $1 AND status NOT IN ('approved', 'rejected', 'cancelled')
            "#,
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }

    // ==================== Application Operations ====================

    /// Insert an application plus its initial history row and audit entry.
    pub async fn create_application(
        &self,
        application: &Application,
        history: &ApplicationStatusHistory,
        audit: &AuditLog,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(
            r#"
            INSERT INTO applications (application_id, tracking_id, client_id, application_type,
                status, priority, application_data, assigned_to, submitted_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(application.application_id)
        .bind(&application.tracking_id)
        .bind(application.client_id)
        .bind(&application.application_type)
        .bind(&application.status)
        .bind(&application.priority)
        .bind(&application.application_data)
        .bind(application.assigned_to)
        .bind(application.submitted_utc)
        .bind(application.updated_utc)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err(e, "Application with this tracking id"))?;

        Self::insert_history_tx(&mut tx, history).await.map_err(db_err)?;
        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn insert_history_tx(
        tx: &mut Transaction<'_, Postgres>,
        history: &ApplicationStatusHistory,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO application_status_history (history_id, application_id, old_status,
                new_status, changed_by, notes, changed_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(history.history_id)
        .bind(history.application_id)
        .bind(&history.old_status)
        .bind(&history.new_status)
        .bind(history.changed_by)
        .bind(&history.notes)
        .bind(history.changed_utc)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn find_application_by_id(
        &self,
        application_id: Uuid,
    ) -> Result<Option<Application>, AppError> {
        sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE application_id = $1")
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn find_application_by_tracking_id(
        &self,
        tracking_id: &str,
    ) -> Result<Option<Application>, AppError> {
        sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE tracking_id = $1")
            .bind(tracking_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn list_applications(
        &self,
        status: Option<&str>,
        application_type: Option<&str>,
        client_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Application>, i64), AppError> {
        let applications = sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM applications
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR application_type = $2)
              AND ($3::uuid IS NULL OR client_id = $3)
            ORDER BY submitted_utc DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(status)
        .bind(application_type)
        .bind(client_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM applications
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR application_type = $2)
              AND ($3::uuid IS NULL OR client_id = $3)
            "#,
        )
        .bind(status)
        .bind(application_type)
        .bind(client_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok((applications, total))
    }

    pub async fn list_application_history(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<ApplicationStatusHistory>, AppError> {
        sqlx::query_as::<_, ApplicationStatusHistory>(
            r#"
            SELECT * FROM application_status_history
            WHERE application_id = $1
            ORDER BY changed_utc ASC
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    /// Apply a validated status transition. The UPDATE is guarded on the
    /// expected current status, so a concurrent transition loses cleanly
    /// instead of double-applying; the status change, its history row and its
    /// audit entry are one transaction.
    pub async fn transition_application(
        &self,
        application_id: Uuid,
        expected_status: &str,
        new_status: &str,
        history: &ApplicationStatusHistory,
        audit: &AuditLog,
    ) -> Result<Application, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let updated = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET status = $3, updated_utc = $4
            WHERE application_id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(application_id)
        .bind(expected_status)
        .bind(new_status)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let updated = updated.ok_or_else(|| {
            AppError::Conflict(anyhow::anyhow!(
                "Application was modified concurrently; reload and retry"
            ))
        })?;

        Self::insert_history_tx(&mut tx, history).await.map_err(db_err)?;
        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        info!(
            application_id = %application_id,
            from = expected_status,
            to = new_status,
            "Application status changed"
        );

        Ok(updated)
    }

    pub async fn update_application_assignment(
        &self,
        application_id: Uuid,
        assigned_to: Option<Uuid>,
        priority: Option<&str>,
        audit: &AuditLog,
    ) -> Result<Application, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let updated = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET assigned_to = COALESCE($2, assigned_to),
                priority = COALESCE($3, priority),
                updated_utc = $4
            WHERE application_id = $1
            RETURNING *
            "#,
        )
        .bind(application_id)
        .bind(assigned_to)
        .bind(priority)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Application not found")))?;

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    // ==================== Post Operations ====================

    pub async fn insert_post(&self, post: &Post, audit: &AuditLog) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(
            r#"
            INSERT INTO posts (post_id, title, slug, content, excerpt, featured_image, status,
                is_featured, author_id, published_utc, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(post.post_id)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.featured_image)
        .bind(&post.status)
        .bind(post.is_featured)
        .bind(post.author_id)
        .bind(post.published_utc)
        .bind(post.created_utc)
        .bind(post.updated_utc)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err(e, "Post with this slug"))?;

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn find_post_by_id(&self, post_id: Uuid) -> Result<Option<Post>, AppError> {
        sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE post_id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, AppError> {
        sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn update_post(&self, post: &Post, audit: &AuditLog) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = $2, slug = $3, content = $4, excerpt = $5, featured_image = $6,
                status = $7, is_featured = $8, published_utc = $9, updated_utc = $10
            WHERE post_id = $1
            "#,
        )
        .bind(post.post_id)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.featured_image)
        .bind(&post.status)
        .bind(post.is_featured)
        .bind(post.published_utc)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err(e, "Post with this slug"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Post not found")));
        }

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn delete_post(&self, post_id: Uuid, audit: &AuditLog) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let result = sqlx::query("DELETE FROM posts WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Post not found")));
        }

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn list_posts(
        &self,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Post>, i64), AppError> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT * FROM posts
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_utc DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok((posts, total))
    }

    // ==================== Travel Package Operations ====================

    pub async fn insert_package(
        &self,
        package: &TravelPackage,
        audit: &AuditLog,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(
            r#"
            INSERT INTO travel_packages (package_id, title, slug, description, short_description,
                destination, duration_days, duration_nights, price, original_price, currency,
                max_participants, is_active, is_featured, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(package.package_id)
        .bind(&package.title)
        .bind(&package.slug)
        .bind(&package.description)
        .bind(&package.short_description)
        .bind(&package.destination)
        .bind(package.duration_days)
        .bind(package.duration_nights)
        .bind(package.price)
        .bind(package.original_price)
        .bind(&package.currency)
        .bind(package.max_participants)
        .bind(package.is_active)
        .bind(package.is_featured)
        .bind(package.created_utc)
        .bind(package.updated_utc)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err(e, "Package with this slug"))?;

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn find_package_by_id(
        &self,
        package_id: Uuid,
    ) -> Result<Option<TravelPackage>, AppError> {
        sqlx::query_as::<_, TravelPackage>("SELECT * FROM travel_packages WHERE package_id = $1")
            .bind(package_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn find_package_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<TravelPackage>, AppError> {
        sqlx::query_as::<_, TravelPackage>("SELECT * FROM travel_packages WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn update_package(
        &self,
        package: &TravelPackage,
        audit: &AuditLog,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let result = sqlx::query(
            r#"
            UPDATE travel_packages
            SET title = $2, slug = $3, description = $4, short_description = $5, destination = $6,
                duration_days = $7, duration_nights = $8, price = $9, original_price = $10,
                currency = $11, max_participants = $12, is_active = $13, is_featured = $14,
                updated_utc = $15
            WHERE package_id = $1
            "#,
        )
        .bind(package.package_id)
        .bind(&package.title)
        .bind(&package.slug)
        .bind(&package.description)
        .bind(&package.short_description)
        .bind(&package.destination)
        .bind(package.duration_days)
        .bind(package.duration_nights)
        .bind(package.price)
        .bind(package.original_price)
        .bind(&package.currency)
        .bind(package.max_participants)
        .bind(package.is_active)
        .bind(package.is_featured)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err(e, "Package with this slug"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Package not found")));
        }

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn delete_package(
        &self,
        package_id: Uuid,
        audit: &AuditLog,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let result = sqlx::query("DELETE FROM travel_packages WHERE package_id = $1")
            .bind(package_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Package not found")));
        }

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn list_packages(
        &self,
        active_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<TravelPackage>, i64), AppError> {
        let packages = sqlx::query_as::<_, TravelPackage>(
            r#"
            SELECT * FROM travel_packages
            WHERE (NOT $1 OR is_active)
            ORDER BY created_utc DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(active_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM travel_packages WHERE (NOT $1 OR is_active)",
        )
        .bind(active_only)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok((packages, total))
    }

    // ==================== Product Operations ====================

    pub async fn insert_product(
        &self,
        product: &Product,
        audit: &AuditLog,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(
            r#"
            INSERT INTO products (product_id, name, slug, description, short_description, sku,
                product_type, price, currency, status, is_featured, is_digital,
                created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(product.product_id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(&product.short_description)
        .bind(&product.sku)
        .bind(&product.product_type)
        .bind(product.price)
        .bind(&product.currency)
        .bind(&product.status)
        .bind(product.is_featured)
        .bind(product.is_digital)
        .bind(product.created_utc)
        .bind(product.updated_utc)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err(e, "Product with this slug or SKU"))?;

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn find_product_by_id(&self, product_id: Uuid) -> Result<Option<Product>, AppError> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE product_id = $1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>, AppError> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn update_product(
        &self,
        product: &Product,
        audit: &AuditLog,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, slug = $3, description = $4, short_description = $5, sku = $6,
                product_type = $7, price = $8, currency = $9, status = $10, is_featured = $11,
                is_digital = $12, updated_utc = $13
            WHERE product_id = $1
            "#,
        )
        .bind(product.product_id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(&product.short_description)
        .bind(&product.sku)
        .bind(&product.product_type)
        .bind(product.price)
        .bind(&product.currency)
        .bind(&product.status)
        .bind(product.is_featured)
        .bind(product.is_digital)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err(e, "Product with this slug or SKU"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Product not found")));
        }

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn delete_product(
        &self,
        product_id: Uuid,
        audit: &AuditLog,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Product not found")));
        }

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn list_products(
        &self,
        product_type: Option<&str>,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Product>, i64), AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE ($1::text IS NULL OR product_type = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_utc DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(product_type)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM products
            WHERE ($1::text IS NULL OR product_type = $1)
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(product_type)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok((products, total))
    }

    // ==================== Order Operations ====================

    pub async fn create_order(
        &self,
        order: &Order,
        items: &[OrderItem],
        audit: &AuditLog,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(
            r#"
            INSERT INTO orders (order_id, order_number, client_id, subtotal, tax_amount,
                discount_amount, total_amount, currency, status, payment_status,
                payment_method, payment_reference, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(order.order_id)
        .bind(&order.order_number)
        .bind(order.client_id)
        .bind(order.subtotal)
        .bind(order.tax_amount)
        .bind(order.discount_amount)
        .bind(order.total_amount)
        .bind(&order.currency)
        .bind(&order.status)
        .bind(&order.payment_status)
        .bind(&order.payment_method)
        .bind(&order.payment_reference)
        .bind(order.created_utc)
        .bind(order.updated_utc)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err(e, "Order with this number"))?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (item_id, order_id, product_id, quantity, unit_price,
                    total_price, product_name, product_sku, created_utc)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(item.item_id)
            .bind(item.order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .bind(&item.product_name)
            .bind(&item.product_sku)
            .bind(item.created_utc)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    pub async fn find_order_by_id(&self, order_id: Uuid) -> Result<Option<Order>, AppError> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn list_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, AppError> {
        sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_utc ASC",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    pub async fn list_orders(
        &self,
        status: Option<&str>,
        client_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Order>, i64), AppError> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR client_id = $2)
            ORDER BY created_utc DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(client_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR client_id = $2)
            "#,
        )
        .bind(status)
        .bind(client_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok((orders, total))
    }

    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        status: &str,
        payment_status: Option<&str>,
        payment_reference: Option<&str>,
        audit: &AuditLog,
    ) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let updated = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $2,
                payment_status = COALESCE($3, payment_status),
                payment_reference = COALESCE($4, payment_reference),
                updated_utc = $5
            WHERE order_id = $1
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(status)
        .bind(payment_status)
        .bind(payment_reference)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found")))?;

        Self::insert_audit_log_tx(&mut tx, audit)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    // ==================== Dashboard ====================

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        let clients_total = self.count("SELECT COUNT(*) FROM clients").await?;
        let clients_new_this_week = self
            .count("SELECT COUNT(*) FROM clients WHERE created_utc >= NOW() - INTERVAL '7 days'")
            .await?;
        let applications_total = self.count("SELECT COUNT(*) FROM applications").await?;

        let applications_by_status = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM applications GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let posts_total = self.count("SELECT COUNT(*) FROM posts").await?;
        let posts_published = self
            .count("SELECT COUNT(*) FROM posts WHERE status = 'published'")
            .await?;
        let packages_active = self
            .count("SELECT COUNT(*) FROM travel_packages WHERE is_active")
            .await?;
        let products_active = self
            .count("SELECT COUNT(*) FROM products WHERE status = 'active'")
            .await?;
        let orders_total = self.count("SELECT COUNT(*) FROM orders").await?;
        let orders_pending = self
            .count("SELECT COUNT(*) FROM orders WHERE status = 'pending'")
            .await?;

        Ok(DashboardStats {
            clients_total,
            clients_new_this_week,
            applications_total,
            applications_by_status,
            posts_total,
            posts_published,
            packages_active,
            products_active,
            orders_total,
            orders_pending,
        })
    }

    async fn count(&self, sql: &str) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }
}
