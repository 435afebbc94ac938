use std::collections::BTreeSet;

use super::firewall::{Firewall, NoopFirewall};
use super::models::{
    BlockDeviceInfo, ComputeDriver, ImageMeta, Instance, InstanceInfo, NetworkInfo, RebootType,
};
use crate::common::{AllocationSnafu, Error, NotImplementedSnafu, Result};
use crate::maas::{
    AcquireParams, Inventory, MaasClient, Machine, NodeFilter, NodeStatus, StartOptions,
};

pub const DRIVER_NAME: &str = "maas";

/// Compute driver that maps instances one-to-one onto MAAS nodes.
///
/// Holds no state of its own: every verb goes back to the inventory.
pub struct MaasDriver {
    inventory: Box<dyn Inventory>,
    firewall: Box<dyn Firewall>,
    api_version: u32,
}

impl MaasDriver {
    pub fn new(
        inventory: Box<dyn Inventory>,
        firewall: Box<dyn Firewall>,
        api_version: u32,
    ) -> Self {
        Self {
            inventory,
            firewall,
            api_version,
        }
    }

    pub fn inventory(&self) -> &dyn Inventory {
        self.inventory.as_ref()
    }

    fn allocated_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .inventory
            .nodes(&NodeFilter::with_state(NodeStatus::Allocated))?
            .iter()
            .map(|m| m.system_id().to_string())
            .collect())
    }

    fn start(&self, system_id: &str) -> Result<bool> {
        let started = self
            .inventory
            .node_start(system_id, &StartOptions::default())?;
        if !started {
            tracing::warn!(driver = DRIVER_NAME, system_id, "Node did not start");
        }
        Ok(started)
    }

    fn stop(&self, system_id: &str) -> Result<bool> {
        let stopped = self.inventory.node_stop(system_id)?;
        if !stopped {
            tracing::warn!(driver = DRIVER_NAME, system_id, "Node did not stop");
        }
        Ok(stopped)
    }
}

impl TryFrom<crate::maas::Config> for MaasDriver {
    type Error = Error;

    fn try_from(value: crate::maas::Config) -> Result<Self> {
        let client = MaasClient::new(&value)?;
        Ok(Self::new(
            Box::new(client),
            Box::new(NoopFirewall),
            value.api_version,
        ))
    }
}

impl ComputeDriver for MaasDriver {
    fn init_host(&self, host: &str) -> Result<()> {
        tracing::debug!(driver = DRIVER_NAME, host, "Nothing to initialise");
        Ok(())
    }

    fn hypervisor_type(&self) -> &str {
        DRIVER_NAME
    }

    fn hypervisor_version(&self) -> u32 {
        self.api_version
    }

    fn instance_exists(&self, instance: &Instance) -> Result<bool> {
        Ok(self.inventory.node_get(&instance.uuid)?.is_some())
    }

    fn list_instances(&self) -> Result<Vec<String>> {
        self.allocated_ids()
    }

    fn list_instance_uuids(&self) -> Result<Vec<String>> {
        self.allocated_ids()
    }

    fn node_is_available(&self, nodename: &str) -> Result<bool> {
        Ok(self.inventory.node_get(nodename)?.is_some())
    }

    fn get_available_nodes(&self, _refresh: bool) -> Result<Vec<Machine>> {
        self.inventory.nodes(&NodeFilter::default())
    }

    fn get_available_resource(&self, _nodename: &str) {}

    fn get_info(&self, instance: &Instance) -> Result<InstanceInfo> {
        Ok(match self.inventory.node_get(&instance.uuid)? {
            Some(machine) => InstanceInfo::from(&machine),
            None => {
                tracing::debug!(
                    driver = DRIVER_NAME,
                    instance = %instance.uuid,
                    "Instance not found, reporting empty info"
                );
                InstanceInfo::default()
            }
        })
    }

    fn macs_for_instance(&self, instance: &Instance) -> Result<Option<BTreeSet<String>>> {
        Ok(self.inventory.node_get(&instance.uuid)?.map(|machine| {
            machine
                .mac_addresses()
                .into_iter()
                .map(str::to_string)
                .collect()
        }))
    }

    // Acquires whichever node MAAS hands out; the instance's own id plays no
    // part in the choice.
    fn spawn(
        &self,
        instance: &Instance,
        _image_meta: &ImageMeta,
        _network_info: Option<&NetworkInfo>,
        _block_device_info: Option<&BlockDeviceInfo>,
    ) -> Result<String> {
        tracing::info!(driver = DRIVER_NAME, instance = %instance.uuid, "Spawning instance");

        let Some(node) = self.inventory.node_acquire(&AcquireParams::default())? else {
            tracing::error!(
                driver = DRIVER_NAME,
                instance = %instance.uuid,
                "Error allocating MAAS node"
            );
            return AllocationSnafu {
                message: format!("No MAAS node could be acquired for instance {}", instance.uuid),
            }
            .fail();
        };

        tracing::info!(
            driver = DRIVER_NAME,
            instance = %instance.uuid,
            system_id = node.system_id(),
            hostname = node.hostname(),
            "Acquired node, starting"
        );
        self.start(node.system_id())?;

        Ok(node.system_id().to_string())
    }

    fn destroy(
        &self,
        instance: &Instance,
        _network_info: &NetworkInfo,
        _block_device_info: Option<&BlockDeviceInfo>,
        _destroy_disks: bool,
    ) -> Result<()> {
        tracing::info!(driver = DRIVER_NAME, instance = %instance.uuid, "Destroying instance");

        self.stop(&instance.uuid)?;
        if !self.inventory.node_release(&instance.uuid)? {
            tracing::warn!(
                driver = DRIVER_NAME,
                system_id = %instance.uuid,
                "Node was not released"
            );
        }
        Ok(())
    }

    fn reboot(
        &self,
        instance: &Instance,
        _network_info: &NetworkInfo,
        reboot_type: RebootType,
        _block_device_info: Option<&BlockDeviceInfo>,
    ) -> Result<()> {
        tracing::info!(
            driver = DRIVER_NAME,
            instance = %instance.uuid,
            reboot_type = ?reboot_type,
            "Rebooting instance"
        );

        self.stop(&instance.uuid)?;
        self.start(&instance.uuid)?;
        Ok(())
    }

    fn power_off(&self, instance: &Instance) -> Result<()> {
        self.stop(&instance.uuid)?;
        Ok(())
    }

    fn power_on(
        &self,
        instance: &Instance,
        _network_info: &NetworkInfo,
        _block_device_info: Option<&BlockDeviceInfo>,
    ) -> Result<()> {
        self.start(&instance.uuid)?;
        Ok(())
    }

    // The node keeps its identity once allocated, and acquiring again is not
    // allowed, so there is nothing a rebuild can do here.
    fn rebuild(
        &self,
        instance: &Instance,
        _image_meta: &ImageMeta,
        _network_info: Option<&NetworkInfo>,
        _block_device_info: Option<&BlockDeviceInfo>,
        _preserve_ephemeral: bool,
    ) -> Result<()> {
        tracing::debug!(driver = DRIVER_NAME, instance = %instance.uuid, "Rebuild is a no-op");
        Ok(())
    }

    fn get_host_stats(&self, _refresh: bool) {}

    fn get_console_output(&self, _instance: &Instance) -> Result<String> {
        NotImplementedSnafu {
            operation: "get_console_output",
        }
        .fail()
    }

    fn refresh_security_group_rules(&self, security_group_id: &str) -> Result<()> {
        self.firewall.refresh_security_group_rules(security_group_id)
    }

    fn refresh_security_group_members(&self, security_group_id: &str) -> Result<()> {
        self.firewall
            .refresh_security_group_members(security_group_id)
    }

    fn refresh_provider_fw_rules(&self) -> Result<()> {
        self.firewall.refresh_provider_fw_rules()
    }

    fn refresh_instance_security_rules(&self, instance: &Instance) -> Result<()> {
        self.firewall.refresh_instance_security_rules(instance)
    }

    fn ensure_filtering_rules_for_instance(
        &self,
        instance: &Instance,
        network_info: &NetworkInfo,
    ) -> Result<()> {
        self.firewall.setup_basic_filtering(instance, network_info)?;
        self.firewall.prepare_instance_filter(instance, network_info)
    }

    fn unfilter_instance(&self, instance: &Instance, network_info: &NetworkInfo) -> Result<()> {
        self.firewall.unfilter_instance(instance, network_info)
    }

    fn plug_vifs(&self, _instance: &Instance, _network_info: &NetworkInfo) -> Result<()> {
        Ok(())
    }

    fn unplug_vifs(&self, _instance: &Instance, _network_info: &NetworkInfo) -> Result<()> {
        Ok(())
    }
}
