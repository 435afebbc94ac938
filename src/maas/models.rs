use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

/// Lifecycle status of a node as reported by MAAS.
///
/// This is the provisioning service's own vocabulary and is not a power
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    Declared,
    Commissioning,
    FailedTests,
    Missing,
    Ready,
    Reserved,
    Allocated,
    Retired,
}

impl NodeStatus {
    pub const ALL: [NodeStatus; 8] = [
        NodeStatus::Declared,
        NodeStatus::Commissioning,
        NodeStatus::FailedTests,
        NodeStatus::Missing,
        NodeStatus::Ready,
        NodeStatus::Reserved,
        NodeStatus::Allocated,
        NodeStatus::Retired,
    ];

    pub fn value(self) -> i64 {
        match self {
            NodeStatus::Declared => 0,
            NodeStatus::Commissioning => 1,
            NodeStatus::FailedTests => 2,
            NodeStatus::Missing => 3,
            NodeStatus::Ready => 4,
            NodeStatus::Reserved => 5,
            NodeStatus::Allocated => 6,
            NodeStatus::Retired => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeStatus::Declared => "DECLARED",
            NodeStatus::Commissioning => "COMMISSIONING",
            NodeStatus::FailedTests => "FAILED_TESTS",
            NodeStatus::Missing => "MISSING",
            NodeStatus::Ready => "READY",
            NodeStatus::Reserved => "RESERVED",
            NodeStatus::Allocated => "ALLOCATED",
            NodeStatus::Retired => "RETIRED",
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.value() == value)
    }

    /// Reverse lookup from a raw status code to its name.
    pub fn label(value: i64) -> Option<&'static str> {
        Self::from_value(value).map(Self::name)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeStatus {
    type Err = String;

    /// Accepts a name in any case (`allocated`, `FAILED_TESTS`) or the
    /// numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(value) = s.parse::<i64>() {
            return Self::from_value(value).ok_or_else(|| format!("Unknown node status {value}"));
        }
        let wanted = s.replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("Unknown node status {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub(crate) struct MacAddress {
    pub mac_address: String,
}

/// A node record as returned by the nodes endpoints.
///
/// Read-only: a fresh `Machine` is decoded from every response, and changes
/// are only ever observed by fetching again.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Machine {
    system_id: String,
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    architecture: String,
    status: i64,
    #[serde(default)]
    cpu_count: u32,
    #[serde(default)]
    memory: u64,
    #[serde(default)]
    storage: u64,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    ip_addresses: Vec<String>,
    #[serde(default)]
    macaddress_set: Vec<MacAddress>,
}

impl Machine {
    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    pub fn status(&self) -> i64 {
        self.status
    }

    pub fn node_status(&self) -> Option<NodeStatus> {
        NodeStatus::from_value(self.status)
    }

    pub fn status_label(&self) -> Option<&'static str> {
        NodeStatus::label(self.status)
    }

    pub fn cpu_count(&self) -> u32 {
        self.cpu_count
    }

    /// Memory in MB.
    pub fn memory(&self) -> u64 {
        self.memory
    }

    /// Root disk size in GB.
    pub fn storage(&self) -> u64 {
        self.storage
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn ip_addresses(&self) -> &[String] {
        &self.ip_addresses
    }

    pub fn mac_addresses(&self) -> Vec<&str> {
        self.macaddress_set
            .iter()
            .map(|m| m.mac_address.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct BootImage {
    pub architecture: Option<String>,
    pub subarchitecture: Option<String>,
    pub release: Option<String>,
    pub label: Option<String>,
    pub purpose: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A cluster controller.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NodeGroup {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub cluster_name: Option<String>,
    pub status: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Zone {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Network {
    pub name: Option<String>,
    pub ip: Option<String>,
    pub netmask: Option<String>,
    pub vlan_tag: Option<i64>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Filters for listing nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeFilter {
    pub hostnames: Vec<String>,
    pub mac_addresses: Vec<String>,
    pub zone: Option<String>,
    /// Applied client side after the response arrives.
    pub state: Option<NodeStatus>,
}

impl NodeFilter {
    pub fn with_state(state: NodeStatus) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub(super) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("op", "list".to_string())];
        params.extend(self.hostnames.iter().map(|h| ("hostname", h.clone())));
        params.extend(self.mac_addresses.iter().map(|m| ("mac_address", m.clone())));
        if let Some(zone) = &self.zone {
            params.push(("zone", zone.clone()));
        }
        if let Some(state) = self.state {
            params.push(("state", state.value().to_string()));
        }
        params
    }
}

/// Constraints for acquiring a node. Empty means "any available node".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcquireParams {
    pub name: Option<String>,
    pub arch: Option<String>,
    pub cpu_count: Option<u32>,
    /// Minimum memory in MB.
    pub mem: Option<u64>,
    pub tags: Vec<String>,
    pub zone: Option<String>,
}

impl AcquireParams {
    pub(super) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("op", "acquire".to_string())];
        if let Some(name) = &self.name {
            params.push(("name", name.clone()));
        }
        if let Some(arch) = &self.arch {
            params.push(("arch", arch.clone()));
        }
        if let Some(cpu_count) = self.cpu_count {
            params.push(("cpu_count", cpu_count.to_string()));
        }
        if let Some(mem) = self.mem {
            params.push(("mem", mem.to_string()));
        }
        if !self.tags.is_empty() {
            params.push(("tags", self.tags.join(",")));
        }
        if let Some(zone) = &self.zone {
            params.push(("zone", zone.clone()));
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartOptions {
    pub user_data: Option<String>,
    pub distro_series: Option<String>,
}

impl StartOptions {
    // Empty values are omitted, same as unset ones.
    pub(super) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("op", "start".to_string())];
        if let Some(user_data) = self.user_data.as_ref().filter(|v| !v.is_empty()) {
            params.push(("user_data", user_data.clone()));
        }
        if let Some(series) = self.distro_series.as_ref().filter(|v| !v.is_empty()) {
            params.push(("distro_series", series.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn label_lookup_matches_every_status() {
        let expected = [
            (0, "DECLARED"),
            (1, "COMMISSIONING"),
            (2, "FAILED_TESTS"),
            (3, "MISSING"),
            (4, "READY"),
            (5, "RESERVED"),
            (6, "ALLOCATED"),
            (7, "RETIRED"),
        ];
        for (value, name) in expected {
            assert_eq!(NodeStatus::label(value), Some(name));
        }
    }

    #[test]
    fn label_lookup_is_absent_for_unknown_values() {
        assert_eq!(NodeStatus::label(8), None);
        assert_eq!(NodeStatus::label(-1), None);
        assert_eq!(NodeStatus::from_value(42), None);
    }

    #[test]
    fn status_parses_names_and_codes() {
        assert_eq!("allocated".parse::<NodeStatus>(), Ok(NodeStatus::Allocated));
        assert_eq!("failed-tests".parse::<NodeStatus>(), Ok(NodeStatus::FailedTests));
        assert_eq!("4".parse::<NodeStatus>(), Ok(NodeStatus::Ready));
        assert!("9".parse::<NodeStatus>().is_err());
        assert!("deployed".parse::<NodeStatus>().is_err());
    }

    #[test]
    fn machine_reads_fields_and_defaults() {
        let machine: Machine = serde_json::from_value(json!({
            "system_id": "node-1",
            "hostname": "tiny.maas",
            "architecture": "amd64/generic",
            "status": 6,
            "cpu_count": 4,
            "memory": 2048,
            "storage": 500,
            "macaddress_set": [
                {"mac_address": "00:16:3e:00:00:01", "resource_uri": "/x/"},
                {"mac_address": "00:16:3e:00:00:02", "resource_uri": "/y/"},
            ],
            "owner": "admin",
        }))
        .unwrap();

        assert_eq!(machine.system_id(), "node-1");
        assert_eq!(machine.hostname(), "tiny.maas");
        assert_eq!(machine.architecture(), "amd64/generic");
        assert_eq!(machine.node_status(), Some(NodeStatus::Allocated));
        assert_eq!(machine.status_label(), Some("ALLOCATED"));
        assert_eq!(machine.cpu_count(), 4);
        assert_eq!(machine.memory(), 2048);
        assert_eq!(machine.storage(), 500);
        assert!(machine.tags().is_empty());
        assert!(machine.ip_addresses().is_empty());
        assert_eq!(
            machine.mac_addresses(),
            vec!["00:16:3e:00:00:01", "00:16:3e:00:00:02"]
        );
    }

    #[test]
    fn machine_with_unknown_status_has_no_label() {
        let machine: Machine =
            serde_json::from_value(json!({"system_id": "node-2", "status": 11})).unwrap();
        assert_eq!(machine.status(), 11);
        assert_eq!(machine.status_label(), None);
        assert_eq!(machine.node_status(), None);
    }

    #[test]
    fn start_options_skip_empty_values() {
        let options = StartOptions {
            user_data: Some(String::new()),
            distro_series: Some("trusty".into()),
        };
        assert_eq!(
            options.to_params(),
            vec![("op", "start".to_string()), ("distro_series", "trusty".to_string())]
        );
        assert_eq!(StartOptions::default().to_params(), vec![("op", "start".to_string())]);
    }

    #[test]
    fn node_filter_sends_state_code() {
        let filter = NodeFilter {
            hostnames: vec!["a.maas".into(), "b.maas".into()],
            zone: Some("rack-1".into()),
            ..NodeFilter::with_state(NodeStatus::Allocated)
        };
        assert_eq!(
            filter.to_params(),
            vec![
                ("op", "list".to_string()),
                ("hostname", "a.maas".to_string()),
                ("hostname", "b.maas".to_string()),
                ("zone", "rack-1".to_string()),
                ("state", "6".to_string()),
            ]
        );
    }
}
