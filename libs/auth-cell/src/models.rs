use serde::{Deserialize, Serialize};

use shared_models::auth::{AuthUser, UserType};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    /// Browser-detected IANA zone, captured on patient login so reminders
    /// and views can render local times.
    pub timezone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthUser,
}
