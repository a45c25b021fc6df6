use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::ShopCalendar;
use crate::store::{Document, DocumentStore};

#[derive(Clone)]
pub struct AppState {
    /// Identity tables (users, sessions).
    pub db: sqlx::PgPool,
    /// Booking documents.
    pub store: Arc<dyn DocumentStore>,
    pub calendar: ShopCalendar,
    pub session_ttl_hours: i64,
}

/* -------------------------
   Principal
--------------------------*/

/// Role is stored as smallint: 0 customer, 1 barber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Barber,
}

impl Role {
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(Role::Customer),
            1 => Some(Role::Barber),
            _ => None,
        }
    }

    pub fn as_i16(self) -> i16 {
        match self {
            Role::Customer => 0,
            Role::Barber => 1,
        }
    }
}

pub fn role_to_string(role: i16) -> String {
    match Role::from_i16(role) {
        Some(Role::Customer) => "customer",
        Some(Role::Barber) => "barber",
        None => "unknown",
    }
    .to_string()
}

/// Who is acting on the booking core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn customer(id: Uuid) -> Self {
        Self { id, role: Role::Customer }
    }

    pub fn barber(id: Uuid) -> Self {
        Self { id, role: Role::Barber }
    }

    pub fn is_barber(&self) -> bool {
        self.role == Role::Barber
    }
}

/* -------------------------
   API DTOs
--------------------------*/

#[derive(Debug, Serialize)]
pub struct ApiOk<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub device_name: Option<String>,
    pub remember_me: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub display_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct MeData {
    pub user: UserProfile,
    pub session: SessionInfo,
}

#[derive(Debug, Serialize)]
pub struct OkData {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub session_token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/* -------------------------
   DB Row Models
--------------------------*/

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub roles: i16,
    pub is_active: bool,
}

impl UserRow {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.user_id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            role: role_to_string(self.roles),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct SessionTokenRow {
    pub session_token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/* -------------------------
   Catalog documents
--------------------------*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: u32,
    pub price_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Document for ServiceOffering {
    const COLLECTION: &'static str = "services";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_mapping() {
        assert_eq!(Role::from_i16(0), Some(Role::Customer));
        assert_eq!(Role::from_i16(1), Some(Role::Barber));
        assert_eq!(Role::from_i16(4), None);
        assert_eq!(Role::Barber.as_i16(), 1);
        assert_eq!(role_to_string(1), "barber");
        assert_eq!(role_to_string(9), "unknown");
    }
}
