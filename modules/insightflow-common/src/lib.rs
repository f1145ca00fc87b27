pub mod config;
pub mod error;
pub mod time;
pub mod types;

pub use config::Config;
pub use error::InsightFlowError;
pub use types::*;
