mod driver;
mod firewall;
mod models;

pub use driver::{MaasDriver, DRIVER_NAME};
pub use firewall::{Firewall, NoopFirewall};
pub use models::*;
