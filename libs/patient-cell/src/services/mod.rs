pub mod directory;
pub mod events;
