pub mod config;
pub mod error;
pub mod format;
pub mod sample;

pub use config::GeneratorConfig;
pub use error::{ForgeError, ForgeResult};
