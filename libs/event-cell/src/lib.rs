pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{EventView, PatientRef};
pub use router::create_event_router;
pub use services::scheduling::EventSchedulingService;
