use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Doctor,
    Patient,
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserType::Doctor => write!(f, "doctor"),
            UserType::Patient => write!(f, "patient"),
        }
    }
}

/// Identity attached to a request by the auth middleware. The core trusts
/// this unconditionally; credential checks happen only at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: UserType,
    pub iat: u64,
    pub exp: u64,
}
