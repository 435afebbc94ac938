mod config;
mod error;

pub(crate) use self::config::*;
pub use error::*;
