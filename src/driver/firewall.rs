use super::models::{Instance, NetworkInfo};
use crate::common::Result;

/// Security group filtering, owned by the orchestrator's firewall layer.
/// The driver only forwards calls to it.
#[cfg_attr(test, mockall::automock)]
pub trait Firewall {
    fn refresh_security_group_rules(&self, security_group_id: &str) -> Result<()>;
    fn refresh_security_group_members(&self, security_group_id: &str) -> Result<()>;
    fn refresh_provider_fw_rules(&self) -> Result<()>;
    fn refresh_instance_security_rules(&self, instance: &Instance) -> Result<()>;
    fn setup_basic_filtering(&self, instance: &Instance, network_info: &NetworkInfo)
        -> Result<()>;
    fn prepare_instance_filter(
        &self,
        instance: &Instance,
        network_info: &NetworkInfo,
    ) -> Result<()>;
    fn unfilter_instance(&self, instance: &Instance, network_info: &NetworkInfo) -> Result<()>;
}

/// Accepts every call and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFirewall;

impl Firewall for NoopFirewall {
    fn refresh_security_group_rules(&self, _security_group_id: &str) -> Result<()> {
        Ok(())
    }

    fn refresh_security_group_members(&self, _security_group_id: &str) -> Result<()> {
        Ok(())
    }

    fn refresh_provider_fw_rules(&self) -> Result<()> {
        Ok(())
    }

    fn refresh_instance_security_rules(&self, _instance: &Instance) -> Result<()> {
        Ok(())
    }

    fn setup_basic_filtering(
        &self,
        _instance: &Instance,
        _network_info: &NetworkInfo,
    ) -> Result<()> {
        Ok(())
    }

    fn prepare_instance_filter(
        &self,
        _instance: &Instance,
        _network_info: &NetworkInfo,
    ) -> Result<()> {
        Ok(())
    }

    fn unfilter_instance(&self, _instance: &Instance, _network_info: &NetworkInfo) -> Result<()> {
        Ok(())
    }
}
