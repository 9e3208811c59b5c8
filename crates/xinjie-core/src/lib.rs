pub mod config;
pub mod error;
pub mod types;

pub use config::XinjieConfig;
pub use error::{Result, XinjieError};
pub use types::*;
