pub mod config;
pub mod error;
pub mod types;

pub use config::GridConfig;
pub use error::{ConfigError, ConfigResult};
pub use types::*;
