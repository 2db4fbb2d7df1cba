pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::{create_directory_router, create_patient_events_router};
pub use services::directory::PatientDirectoryService;
pub use services::events::PatientEventsService;
