pub mod config;
pub mod error;
pub mod handler;
pub mod infrastructure;
pub mod models;
pub mod services;

pub use config::UnzipperConfig;
pub use error::UnzipError;
pub use models::{RunContext, RunOutcome, RunReport};
pub use services::storage::{S3StorageService, StorageService};
pub use services::unzip_service::UnzipService;
