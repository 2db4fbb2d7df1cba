use std::sync::Arc;

use tracing::{debug, info};

use shared_cache::DirectoryCache;
use shared_config::AppConfig;
use shared_database::{DoctorStore, PatientStore, StoreError};
use shared_models::auth::{AuthUser, UserType};
use shared_models::error::AppError;
use shared_utils::jwt::sign_token;

use crate::models::{LoginRequest, LoginResponse};
use crate::services::password::verify_password;

/// Login for both user types. Credentials are checked against the stored
/// argon2 hash; a patient login may also carry the browser's timezone,
/// which is persisted once the credentials check out.
pub struct SessionService {
    config: Arc<AppConfig>,
    patients: Arc<dyn PatientStore>,
    doctors: Arc<dyn DoctorStore>,
    directory: Arc<DirectoryCache>,
}

impl SessionService {
    pub fn new(
        config: Arc<AppConfig>,
        patients: Arc<dyn PatientStore>,
        doctors: Arc<dyn DoctorStore>,
        directory: Arc<DirectoryCache>,
    ) -> Self {
        Self {
            config,
            patients,
            doctors,
            directory,
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        let email = request.email.trim().to_lowercase();

        match request.user_type {
            UserType::Doctor => {
                let doctor = self
                    .doctors
                    .find_by_email(&email)
                    .await
                    .map_err(store_err)?
                    .ok_or_else(invalid_credentials)?;
                check_password(&request.password, &doctor.password_hash)?;

                self.issue(doctor.id, doctor.name, doctor.email, UserType::Doctor)
            }
            UserType::Patient => {
                let patient = self
                    .patients
                    .find_by_email(&email)
                    .await
                    .map_err(store_err)?
                    .ok_or_else(invalid_credentials)?;
                check_password(&request.password, &patient.password_hash)?;

                if let Some(timezone) = &request.timezone {
                    if timezone != &patient.timezone {
                        self.patients
                            .update_timezone(patient.id, timezone)
                            .await
                            .map_err(store_err)?;
                        // The directory carries timezones, so it is stale now.
                        self.directory.invalidate().await;
                        debug!("Updated timezone for patient {}", patient.id);
                    }
                }

                self.issue(patient.id, patient.name, patient.email, UserType::Patient)
            }
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }

    fn issue(
        &self,
        id: uuid::Uuid,
        name: String,
        email: String,
        user_type: UserType,
    ) -> Result<LoginResponse, AppError> {
        let token = sign_token(id, &name, &email, user_type, &self.config.jwt_secret)
            .map_err(AppError::Internal)?;

        info!("{user_type} {id} logged in");
        Ok(LoginResponse {
            token,
            user: AuthUser {
                id,
                name,
                email,
                user_type,
            },
        })
    }
}

fn check_password(password: &str, hash: &str) -> Result<(), AppError> {
    let verified = verify_password(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {e}")))?;
    if verified {
        Ok(())
    } else {
        Err(invalid_credentials())
    }
}

fn store_err(e: StoreError) -> AppError {
    AppError::Database(e.to_string())
}

fn invalid_credentials() -> AppError {
    AppError::Auth("Invalid email or password".to_string())
}
