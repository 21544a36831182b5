//! WMIC process list to JSON

pub mod app;
pub mod local_logger;
mod prelude;
pub mod provider;
pub mod settings;

pub use local_logger::clean_logger;
