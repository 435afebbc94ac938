pub mod common;
pub mod config;
pub mod driver;
pub mod maas;

pub use self::config::*;
