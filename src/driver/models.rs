use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::common::Result;
use crate::maas::Machine;

/// Network description handed over by the orchestrator. Opaque here.
pub type NetworkInfo = Value;
/// Block device mapping handed over by the orchestrator. Opaque here.
pub type BlockDeviceInfo = Value;
/// Image metadata handed over by the orchestrator. Opaque here.
pub type ImageMeta = Value;

/// The orchestrator's view of an instance. Only `uuid` is interpreted; it
/// names the MAAS system id the instance runs on.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Instance {
    pub uuid: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Instance {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            extra: Map::new(),
        }
    }
}

/// Resource usage reported for one instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct InstanceInfo {
    /// Power state. MAAS statuses have no mapping onto it, so it is never set.
    pub state: Option<String>,
    /// KB
    pub max_mem: u64,
    /// KB
    pub mem: u64,
    pub num_cpu: u32,
    /// Nanoseconds, always 0.
    pub cpu_time: u64,
}

impl From<&Machine> for InstanceInfo {
    fn from(machine: &Machine) -> Self {
        let mem = machine.memory() * 1024;
        Self {
            state: None,
            max_mem: mem,
            mem,
            num_cpu: machine.cpu_count(),
            cpu_time: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootType {
    Soft,
    Hard,
}

/// The host lifecycle verbs an orchestrator calls on a compute driver.
pub trait ComputeDriver {
    fn init_host(&self, host: &str) -> Result<()>;
    fn hypervisor_type(&self) -> &str;
    fn hypervisor_version(&self) -> u32;

    fn instance_exists(&self, instance: &Instance) -> Result<bool>;
    fn list_instances(&self) -> Result<Vec<String>>;
    fn list_instance_uuids(&self) -> Result<Vec<String>>;
    fn node_is_available(&self, nodename: &str) -> Result<bool>;
    fn get_available_nodes(&self, refresh: bool) -> Result<Vec<Machine>>;
    fn get_available_resource(&self, nodename: &str);
    fn get_info(&self, instance: &Instance) -> Result<InstanceInfo>;
    fn macs_for_instance(&self, instance: &Instance) -> Result<Option<BTreeSet<String>>>;

    /// Returns the system id of the node that was started.
    fn spawn(
        &self,
        instance: &Instance,
        image_meta: &ImageMeta,
        network_info: Option<&NetworkInfo>,
        block_device_info: Option<&BlockDeviceInfo>,
    ) -> Result<String>;
    fn destroy(
        &self,
        instance: &Instance,
        network_info: &NetworkInfo,
        block_device_info: Option<&BlockDeviceInfo>,
        destroy_disks: bool,
    ) -> Result<()>;
    fn reboot(
        &self,
        instance: &Instance,
        network_info: &NetworkInfo,
        reboot_type: RebootType,
        block_device_info: Option<&BlockDeviceInfo>,
    ) -> Result<()>;
    fn power_off(&self, instance: &Instance) -> Result<()>;
    fn power_on(
        &self,
        instance: &Instance,
        network_info: &NetworkInfo,
        block_device_info: Option<&BlockDeviceInfo>,
    ) -> Result<()>;
    fn rebuild(
        &self,
        instance: &Instance,
        image_meta: &ImageMeta,
        network_info: Option<&NetworkInfo>,
        block_device_info: Option<&BlockDeviceInfo>,
        preserve_ephemeral: bool,
    ) -> Result<()>;

    fn get_host_stats(&self, refresh: bool);
    fn get_console_output(&self, instance: &Instance) -> Result<String>;

    fn refresh_security_group_rules(&self, security_group_id: &str) -> Result<()>;
    fn refresh_security_group_members(&self, security_group_id: &str) -> Result<()>;
    fn refresh_provider_fw_rules(&self) -> Result<()>;
    fn refresh_instance_security_rules(&self, instance: &Instance) -> Result<()>;
    fn ensure_filtering_rules_for_instance(
        &self,
        instance: &Instance,
        network_info: &NetworkInfo,
    ) -> Result<()>;
    fn unfilter_instance(&self, instance: &Instance, network_info: &NetworkInfo) -> Result<()>;

    fn plug_vifs(&self, instance: &Instance, network_info: &NetworkInfo) -> Result<()>;
    fn unplug_vifs(&self, instance: &Instance, network_info: &NetworkInfo) -> Result<()>;
}
