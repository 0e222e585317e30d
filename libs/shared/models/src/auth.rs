use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub iat: Option<u64>,
}

/// Authenticated caller, injected into request extensions by the auth
/// middleware. Role strings mirror the platform roles: `patient`, `doctor`,
/// `secretary`, `admin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_patient(&self) -> bool {
        self.role.as_deref() == Some("patient")
    }

    pub fn is_doctor(&self) -> bool {
        self.role.as_deref() == Some("doctor")
    }

    pub fn is_secretary(&self) -> bool {
        self.role.as_deref() == Some("secretary")
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }

    /// Secretaries and admins manage appointments on behalf of others.
    pub fn is_staff(&self) -> bool {
        self.is_secretary() || self.is_admin()
    }

    pub fn matches_id(&self, id: Uuid) -> bool {
        self.id == id.to_string()
    }
}
