pub mod config;
pub mod record;

pub use config::{Config, SourceConfig};
pub use record::{Level, ParseLevelError, Regulation};
