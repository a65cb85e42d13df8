pub mod config;
pub mod error;
pub mod mapping;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, ConfigResult};
pub use mapping::ResourceMapper;
pub use types::*;
