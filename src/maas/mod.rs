mod auth;
mod client;
mod config;
mod inventory;
mod models;

pub use auth::Credential;
pub use client::{MaasClient, Response, SERVICE_NAME};
pub use self::config::*;
pub use inventory::*;
pub use models::*;
