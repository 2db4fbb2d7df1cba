use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::{AuthUser, JwtClaims, UserType};

/// Session lifetime for issued tokens (7 days).
const SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

pub fn sign_token(
    id: Uuid,
    name: &str,
    email: &str,
    user_type: UserType,
    jwt_secret: &str,
) -> Result<String, String> {
    let now = Utc::now().timestamp() as u64;
    let claims = JwtClaims {
        sub: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role: user_type,
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| format!("Failed to sign token: {e}"))
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<AuthUser, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Token validation failed: {e}");
        "Invalid or expired token".to_string()
    })?;

    let id = Uuid::parse_str(&data.claims.sub).map_err(|_| "Invalid token subject".to_string())?;

    Ok(AuthUser {
        id,
        name: data.claims.name,
        email: data.claims.email,
        user_type: data.claims.role,
    })
}
