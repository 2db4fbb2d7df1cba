pub mod dispatcher;
pub mod reminder;
pub mod tokens;
