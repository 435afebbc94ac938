use super::models::{
    AcquireParams, BootImage, Machine, Network, NodeFilter, NodeGroup, StartOptions, Zone,
};
use crate::common::Result;

/// Operations against the MAAS node inventory.
///
/// A request the service answers with a non-success status is not an error:
/// lists come back empty, lookups come back `None` and actions come back
/// `false`. `Err` is reserved for transport and decoding failures.
#[cfg_attr(test, mockall::automock)]
pub trait Inventory {
    fn boot_images(&self, nodegroup_uuid: &str) -> Result<Vec<BootImage>>;
    fn nodegroups(&self) -> Result<Vec<NodeGroup>>;
    fn zones(&self) -> Result<Vec<Zone>>;
    fn networks(&self) -> Result<Vec<Network>>;

    fn nodes(&self, filter: &NodeFilter) -> Result<Vec<Machine>>;
    fn node_get(&self, system_id: &str) -> Result<Option<Machine>>;
    /// Reserve any node that satisfies the constraints.
    fn node_acquire(&self, params: &AcquireParams) -> Result<Option<Machine>>;
    /// Return a node to the pool.
    fn node_release(&self, system_id: &str) -> Result<bool>;
    fn node_start(&self, system_id: &str, options: &StartOptions) -> Result<bool>;
    fn node_stop(&self, system_id: &str) -> Result<bool>;
}
