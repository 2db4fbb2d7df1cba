pub mod memory;
pub mod records;
pub mod rest;
pub mod store;

pub use memory::MemoryStore;
pub use records::*;
pub use rest::RestStore;
pub use store::*;
