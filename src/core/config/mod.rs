pub mod data;
pub mod io;

pub use data::{Config, Overrides, Settings};
pub use io::ConfigError;
