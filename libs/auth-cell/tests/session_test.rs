use std::sync::Arc;

use assert_matches::assert_matches;
use uuid::Uuid;

use auth_cell::models::LoginRequest;
use auth_cell::services::password::hash_password;
use auth_cell::SessionService;
use shared_cache::{DirectoryCache, MemoryKv};
use shared_config::AppConfig;
use shared_database::{DoctorRecord, DoctorStore, MemoryStore, PatientRecord, PatientStore};
use shared_models::auth::UserType;
use shared_models::error::AppError;
use shared_utils::jwt::validate_token;

const JWT_SECRET: &str = "test-secret";

fn test_config() -> Arc<AppConfig> {
    Arc::new(AppConfig {
        jwt_secret: JWT_SECRET.to_string(),
        redis_url: None,
        store_rest_url: None,
        store_api_key: None,
        cors_origin: "http://localhost:5173".to_string(),
        port: 0,
    })
}

struct Harness {
    service: SessionService,
    store: Arc<MemoryStore>,
    directory: Arc<DirectoryCache>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let directory = Arc::new(DirectoryCache::new(Arc::new(MemoryKv::new())));
    let service = SessionService::new(
        test_config(),
        store.clone(),
        store.clone(),
        directory.clone(),
    );
    Harness {
        service,
        store,
        directory,
    }
}

async fn seed_patient(store: &MemoryStore, email: &str, password: &str) -> Uuid {
    let patient = PatientRecord {
        id: Uuid::new_v4(),
        name: "Amara Ike".to_string(),
        email: email.to_string(),
        timezone: String::new(),
        password_hash: hash_password(password).unwrap(),
    };
    let id = patient.id;
    PatientStore::insert(store, patient).await.unwrap();
    id
}

fn login_request(email: &str, password: &str, user_type: UserType) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
        user_type,
        timezone: None,
    }
}

#[tokio::test]
async fn patient_login_issues_a_verifiable_token() {
    let h = harness();
    let patient_id = seed_patient(&h.store, "amara@example.com", "correct horse").await;

    let response = h
        .service
        .login(login_request("amara@example.com", "correct horse", UserType::Patient))
        .await
        .unwrap();

    assert_eq!(response.user.id, patient_id);
    assert_eq!(response.user.user_type, UserType::Patient);

    let claims = validate_token(&response.token, JWT_SECRET).unwrap();
    assert_eq!(claims.id, patient_id);
    assert_eq!(claims.user_type, UserType::Patient);
}

#[tokio::test]
async fn doctor_login_checks_the_doctor_directory() {
    let h = harness();
    let doctor = DoctorRecord {
        id: Uuid::new_v4(),
        name: "Dr. Okafor".to_string(),
        email: "okafor@example.com".to_string(),
        password_hash: hash_password("stethoscope").unwrap(),
    };
    DoctorStore::insert(h.store.as_ref(), doctor.clone())
        .await
        .unwrap();

    let response = h
        .service
        .login(login_request("okafor@example.com", "stethoscope", UserType::Doctor))
        .await
        .unwrap();
    assert_eq!(response.user.id, doctor.id);
    assert_eq!(response.user.user_type, UserType::Doctor);

    // The same email does not exist on the patient side.
    assert_matches!(
        h.service
            .login(login_request("okafor@example.com", "stethoscope", UserType::Patient))
            .await,
        Err(AppError::Auth(_))
    );
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_both_rejected() {
    let h = harness();
    seed_patient(&h.store, "amara@example.com", "correct horse").await;

    assert_matches!(
        h.service
            .login(login_request("amara@example.com", "battery staple", UserType::Patient))
            .await,
        Err(AppError::Auth(_))
    );
    assert_matches!(
        h.service
            .login(login_request("nobody@example.com", "correct horse", UserType::Patient))
            .await,
        Err(AppError::Auth(_))
    );
}

#[tokio::test]
async fn email_lookup_is_case_insensitive() {
    let h = harness();
    seed_patient(&h.store, "amara@example.com", "correct horse").await;

    let response = h
        .service
        .login(login_request("  Amara@Example.com ", "correct horse", UserType::Patient))
        .await
        .unwrap();
    assert_eq!(response.user.email, "amara@example.com");
}

#[tokio::test]
async fn patient_timezone_capture_persists_and_drops_the_directory_cache() {
    let h = harness();
    let patient_id = seed_patient(&h.store, "amara@example.com", "correct horse").await;

    h.directory.put(&vec!["stale listing".to_string()]).await;

    let request = LoginRequest {
        email: "amara@example.com".to_string(),
        password: "correct horse".to_string(),
        user_type: UserType::Patient,
        timezone: Some("America/Sao_Paulo".to_string()),
    };
    h.service.login(request).await.unwrap();

    let stored = PatientStore::find_by_id(h.store.as_ref(), patient_id)
        .await
        .unwrap()
        .expect("patient exists");
    assert_eq!(stored.timezone, "America/Sao_Paulo");
    assert_eq!(h.directory.get::<Vec<String>>().await, None);
}

#[tokio::test]
async fn unchanged_timezone_leaves_the_directory_cache_alone() {
    let h = harness();
    let patient_id = seed_patient(&h.store, "amara@example.com", "correct horse").await;
    h.store
        .update_timezone(patient_id, "America/Sao_Paulo")
        .await
        .unwrap();

    h.directory.put(&vec!["warm listing".to_string()]).await;

    let request = LoginRequest {
        email: "amara@example.com".to_string(),
        password: "correct horse".to_string(),
        user_type: UserType::Patient,
        timezone: Some("America/Sao_Paulo".to_string()),
    };
    h.service.login(request).await.unwrap();

    assert_eq!(
        h.directory.get::<Vec<String>>().await,
        Some(vec!["warm listing".to_string()])
    );
}
