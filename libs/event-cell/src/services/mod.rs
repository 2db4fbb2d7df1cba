pub mod overlap;
pub mod scheduling;
