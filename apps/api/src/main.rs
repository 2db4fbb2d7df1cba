use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use auth_cell::SessionService;
use event_cell::EventSchedulingService;
use patient_cell::{PatientDirectoryService, PatientEventsService};
use realtime_cell::{NotificationDispatcher, RealtimeState, ReminderScanner, SocketTokenStore};
use shared_cache::{DirectoryCache, KvBackend, MemoryKv, RedisKv, TimeRangeCache};
use shared_config::AppConfig;
use shared_database::{DoctorStore, EventStore, MemoryStore, PatientStore, RestStore};

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting scheduling API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());

    // Persistence: REST store when configured, in-memory otherwise
    let (events, patients, doctors): (
        Arc<dyn EventStore>,
        Arc<dyn PatientStore>,
        Arc<dyn DoctorStore>,
    ) = match (&config.store_rest_url, &config.store_api_key) {
        (Some(url), Some(key)) => {
            let store = Arc::new(RestStore::new(url.clone(), key.clone()));
            (store.clone(), store.clone(), store)
        }
        _ => {
            let store = Arc::new(MemoryStore::new());
            (store.clone(), store.clone(), store)
        }
    };

    // Key/value backend: Redis when reachable, in-process otherwise
    let backend: Arc<dyn KvBackend> = match &config.redis_url {
        Some(url) => match RedisKv::connect(url).await {
            Ok(kv) => Arc::new(kv),
            Err(e) => {
                warn!("Redis unavailable ({e}), using in-process backend");
                Arc::new(MemoryKv::new())
            }
        },
        None => Arc::new(MemoryKv::new()),
    };

    let cache = Arc::new(TimeRangeCache::new(backend.clone()));
    let directory_cache = Arc::new(DirectoryCache::new(backend.clone()));
    let dispatcher = NotificationDispatcher::new();

    let state = router::AppState {
        config: config.clone(),
        session: Arc::new(SessionService::new(
            config.clone(),
            patients.clone(),
            doctors.clone(),
            directory_cache.clone(),
        )),
        scheduling: Arc::new(EventSchedulingService::new(
            events.clone(),
            patients.clone(),
            cache,
            dispatcher.clone(),
        )),
        directory: Arc::new(PatientDirectoryService::new(
            patients.clone(),
            directory_cache,
        )),
        patient_events: Arc::new(PatientEventsService::new(events.clone(), doctors.clone())),
        realtime: Arc::new(RealtimeState {
            tokens: Arc::new(SocketTokenStore::new(backend)),
            dispatcher: dispatcher.clone(),
        }),
    };

    // Background reminder scan
    let _reminder_task = ReminderScanner::new(events, dispatcher).spawn();

    // Set up CORS
    let allow_origin = config
        .cors_origin
        .parse::<axum::http::HeaderValue>()
        .map(AllowOrigin::exact)
        .unwrap_or_else(|_| AllowOrigin::any());
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
