pub mod config;
pub mod errors;
pub mod format;
pub mod logging;

pub use config::{Config, ConfirmBackend, RebootPolicy};
pub use errors::MaintenanceError;
pub use format::humanize;
