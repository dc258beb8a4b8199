pub mod config;
pub mod error;
pub mod types;

pub use config::LdmConfig;
pub use error::{LdmError, Result};
pub use types::*;
