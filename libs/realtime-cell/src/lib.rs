pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use handlers::RealtimeState;
pub use models::*;
pub use router::{create_socket_token_router, create_ws_router};
pub use services::dispatcher::NotificationDispatcher;
pub use services::reminder::ReminderScanner;
pub use services::tokens::SocketTokenStore;
