//! Client model - CRM records for the people applications belong to.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Client entity.
#[derive(Debug, Clone, FromRow)]
pub struct Client {
    pub client_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub passport_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Client {
    pub fn from_request(req: CreateClientRequest) -> Self {
        let now = Utc::now();
        Self {
            client_id: Uuid::new_v4(),
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email.to_lowercase(),
            phone: req.phone,
            country: req.country,
            passport_number: req.passport_number,
            date_of_birth: req.date_of_birth,
            nationality: req.nationality,
            address: req.address,
            emergency_contact_name: req.emergency_contact_name,
            emergency_contact_phone: req.emergency_contact_phone,
            notes: req.notes,
            created_utc: now,
            updated_utc: now,
        }
    }
}

/// Request to create a client.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub passport_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub notes: Option<String>,
}

/// Request to update a client. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub passport_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub notes: Option<String>,
}

/// Client response for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct ClientResponse {
    pub client_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub passport_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<Client> for ClientResponse {
    fn from(c: Client) -> Self {
        Self {
            client_id: c.client_id,
            first_name: c.first_name,
            last_name: c.last_name,
            email: c.email,
            phone: c.phone,
            country: c.country,
            passport_number: c.passport_number,
            date_of_birth: c.date_of_birth,
            nationality: c.nationality,
            address: c.address,
            emergency_contact_name: c.emergency_contact_name,
            emergency_contact_phone: c.emergency_contact_phone,
            notes: c.notes,
            created_utc: c.created_utc,
            updated_utc: c.updated_utc,
        }
    }
}
