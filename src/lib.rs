pub mod collector;
pub mod config;
pub mod db;
pub mod error;
pub mod lesson;
pub mod notify;
pub mod reconcile;
pub mod report;
pub mod sync;

pub use config::{DateRange, RunConfig};
pub use db::Database;
pub use error::RunError;
