//! Per-operation argument structs.
//!
//! Each struct knows its wire parameter names and, where the server would
//! otherwise reject the request, how to validate itself locally. Validation
//! failures are `Error::NotValid`, raised before any network call.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use maas_core::{Error, QueryParams};
use tokio::io::AsyncRead;

use crate::models::{Subnet, Vlan};
use crate::Result;

fn not_valid(message: impl Into<String>) -> Error {
    Error::NotValid(message.into())
}

/// Prefix the message of a `NotValid` error with `context`.
fn annotate(err: Error, context: &str) -> Error {
    match err {
        Error::NotValid(message) => Error::NotValid(format!("{context}: {message}")),
        other => other,
    }
}

/// Filters for listing machines.
#[derive(Debug, Clone, Default)]
pub struct MachinesArgs {
    /// Match any of these hostnames.
    pub hostnames: Vec<String>,
    /// Match any of these MAC addresses.
    pub mac_addresses: Vec<String>,
    /// Match any of these system ids.
    pub system_ids: Vec<String>,
    /// Domain name.
    pub domain: String,
    /// Zone name.
    pub zone: String,
    /// Agent name.
    pub agent_name: String,
    /// Applied client-side: every entry must match the machine's owner data.
    pub owner_data: std::collections::HashMap<String, String>,
}

impl MachinesArgs {
    /// Server-side filter parameters.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.maybe_add_many("hostname", &self.hostnames);
        params.maybe_add_many("mac_address", &self.mac_addresses);
        params.maybe_add_many("id", &self.system_ids);
        params.maybe_add("domain", &self.domain);
        params.maybe_add("zone", &self.zone);
        params.maybe_add("agent_name", &self.agent_name);
        params
    }
}

/// Filters for listing nodes.
#[derive(Debug, Clone, Default)]
pub struct NodesArgs {
    /// Match any of these hostnames.
    pub hostnames: Vec<String>,
    /// Match any of these MAC addresses.
    pub mac_addresses: Vec<String>,
    /// Match any of these system ids.
    pub system_ids: Vec<String>,
    /// Domain name.
    pub domain: String,
    /// Zone name.
    pub zone: String,
    /// Agent name.
    pub agent_name: String,
}

impl NodesArgs {
    /// Server-side filter parameters.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.maybe_add_many("hostname", &self.hostnames);
        params.maybe_add_many("mac_address", &self.mac_addresses);
        params.maybe_add_many("id", &self.system_ids);
        params.maybe_add("domain", &self.domain);
        params.maybe_add("zone", &self.zone);
        params.maybe_add("agent_name", &self.agent_name);
        params
    }
}

/// Filters for listing devices. Same wire shape as [`NodesArgs`].
pub type DevicesArgs = NodesArgs;

/// Arguments for creating a node.
#[derive(Debug, Clone, Default)]
pub struct CreateNodeArgs {
    /// Hostname; generated by the server when empty.
    pub hostname: String,
    /// MAC addresses, at least one.
    pub mac_addresses: Vec<String>,
    /// Domain name.
    pub domain: String,
    /// System id of the parent machine.
    pub parent: String,
}

impl CreateNodeArgs {
    /// Form parameters.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.maybe_add("hostname", &self.hostname);
        params.maybe_add("domain", &self.domain);
        params.maybe_add_many("mac_addresses", &self.mac_addresses);
        params.maybe_add("parent", &self.parent);
        params
    }
}

/// A labelled storage constraint for allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageSpec {
    /// Label used to find the match in the allocation response.
    pub label: String,
    /// Minimum size in GB.
    pub size: u64,
    /// Required disk tags.
    pub tags: Vec<String>,
}

impl StorageSpec {
    /// Check size and tags.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` for a zero size or a tag containing a comma.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(not_valid(format!("Size value {}", self.size)));
        }
        if let Some(tag) = self.tags.iter().find(|tag| tag.contains(',')) {
            return Err(not_valid(format!("tag includes comma ({tag:?})")));
        }
        Ok(())
    }
}

impl fmt::Display for StorageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.label.is_empty() {
            write!(f, "{}:", self.label)?;
        }
        write!(f, "{}", self.size)?;
        if !self.tags.is_empty() {
            write!(f, "({})", self.tags.join(","))?;
        }
        Ok(())
    }
}

/// A labelled interface constraint for allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceSpec {
    /// Label used to find the match in the allocation response.
    pub label: String,
    /// Space the interface must be attached to.
    pub space: String,
}

impl InterfaceSpec {
    /// Check label and space.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` when either is empty.
    pub fn validate(&self) -> Result<()> {
        if self.label.is_empty() {
            return Err(not_valid("missing Label"));
        }
        if self.space.is_empty() {
            return Err(not_valid("empty Space constraint"));
        }
        Ok(())
    }
}

impl fmt::Display for InterfaceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:space={}", self.label, self.space)
    }
}

/// Constraints for allocating a machine.
#[derive(Debug, Clone, Default)]
pub struct AllocateMachineArgs {
    /// Hostname of a specific machine.
    pub hostname: String,
    /// System id of a specific machine.
    pub system_id: String,
    /// Architecture, e.g. `amd64/generic`.
    pub architecture: String,
    /// Minimum CPU count.
    pub min_cpu_count: u32,
    /// Minimum memory in MiB.
    pub min_memory: u64,
    /// Required tags.
    pub tags: Vec<String>,
    /// Excluded tags.
    pub not_tags: Vec<String>,
    /// Required zone.
    pub zone: String,
    /// Excluded zones.
    pub not_in_zone: Vec<String>,
    /// Disks; the first is used as the root disk.
    pub storage: Vec<StorageSpec>,
    /// Required interfaces.
    pub interfaces: Vec<InterfaceSpec>,
    /// Spaces the machine must not be attached to.
    pub not_space: Vec<String>,
    /// Agent name.
    pub agent_name: String,
    /// Comment recorded with the event.
    pub comment: String,
    /// Report the match without allocating.
    pub dry_run: bool,
}

impl AllocateMachineArgs {
    /// Check every spec and that labels are unique.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let mut storage_labels = HashSet::new();
        for spec in &self.storage {
            spec.validate().map_err(|err| annotate(err, "Storage"))?;
            if !spec.label.is_empty() && !storage_labels.insert(spec.label.as_str()) {
                return Err(not_valid(format!("reusing storage Label {:?}", spec.label)));
            }
        }

        let mut interface_labels = HashSet::new();
        for spec in &self.interfaces {
            spec.validate().map_err(|err| annotate(err, "Interfaces"))?;
            if !interface_labels.insert(spec.label.as_str()) {
                return Err(not_valid(format!(
                    "reusing interface Label {:?}",
                    spec.label
                )));
            }
        }

        if self.not_space.iter().any(String::is_empty) {
            return Err(not_valid("empty NotSpace constraint"));
        }
        Ok(())
    }

    /// Form parameters.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let storage = self
            .storage
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let interfaces = self
            .interfaces
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(";");
        let not_subnets: Vec<String> = self
            .not_space
            .iter()
            .map(|space| format!("space:{space}"))
            .collect();

        let mut params = QueryParams::new();
        params.maybe_add("name", &self.hostname);
        params.maybe_add("system_id", &self.system_id);
        params.maybe_add("arch", &self.architecture);
        params.maybe_add_int("cpu_count", self.min_cpu_count);
        params.maybe_add_int("mem", self.min_memory);
        params.maybe_add_many("tags", &self.tags);
        params.maybe_add_many("not_tags", &self.not_tags);
        params.maybe_add("storage", &storage);
        params.maybe_add("interfaces", &interfaces);
        params.maybe_add_many("not_subnets", &not_subnets);
        params.maybe_add("zone", &self.zone);
        params.maybe_add_many("not_in_zone", &self.not_in_zone);
        params.maybe_add("agent_name", &self.agent_name);
        params.maybe_add("comment", &self.comment);
        params.maybe_add_bool("dry_run", self.dry_run);
        params
    }
}

/// Arguments for releasing machines in one batch.
#[derive(Debug, Clone, Default)]
pub struct ReleaseMachinesArgs {
    /// System ids to release.
    pub system_ids: Vec<String>,
    /// Comment recorded with the event.
    pub comment: String,
    /// Erase disks.
    pub erase: bool,
    /// Use secure erase where supported.
    pub secure_erase: bool,
    /// Wipe only the start and end of each disk.
    pub quick_erase: bool,
}

impl ReleaseMachinesArgs {
    /// Form parameters.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.maybe_add_many("machines", &self.system_ids);
        params.maybe_add("comment", &self.comment);
        params.maybe_add_bool("erase", self.erase);
        params.maybe_add_bool("secure_erase", self.secure_erase);
        params.maybe_add_bool("quick_erase", self.quick_erase);
        params
    }
}

/// Arguments for deploying a machine.
#[derive(Debug, Clone, Default)]
pub struct DeployMachineArgs {
    /// Base64 encoded cloud-init user data.
    pub user_data: String,
    /// Distro series to install.
    pub distro_series: String,
    /// Hardware enablement kernel.
    pub kernel: String,
    /// Agent name.
    pub agent_name: String,
    /// Create bridges on every interface.
    pub bridge_all: bool,
    /// Enable STP on created bridges.
    pub bridge_stp: bool,
    /// Bridge forward delay in seconds.
    pub bridge_fd: u32,
    /// Comment recorded with the event.
    pub comment: String,
    /// Install a rack controller.
    pub install_rackd: bool,
}

impl DeployMachineArgs {
    /// Form parameters.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.maybe_add("user_data", &self.user_data);
        params.maybe_add("distro_series", &self.distro_series);
        params.maybe_add("hwe_kernel", &self.kernel);
        params.maybe_add("agent_name", &self.agent_name);
        params.maybe_add_bool("bridge_all", self.bridge_all);
        params.maybe_add_bool("bridge_stp", self.bridge_stp);
        params.maybe_add_int("bridge_fd", self.bridge_fd);
        params.maybe_add("comment", &self.comment);
        params.maybe_add_bool("install_rackd", self.install_rackd);
        params
    }
}

/// Arguments for commissioning a machine.
#[derive(Debug, Clone, Default)]
pub struct CommissionMachineArgs {
    /// Keep SSH enabled during commissioning.
    pub enable_ssh: bool,
    /// Skip BMC configuration.
    pub skip_bmc_config: bool,
    /// Keep the current network configuration.
    pub skip_networking: bool,
    /// Keep the current storage configuration.
    pub skip_storage: bool,
    /// Comma-separated commissioning scripts to run.
    pub commissioning_scripts: String,
    /// Comma-separated testing scripts to run.
    pub testing_scripts: String,
}

impl CommissionMachineArgs {
    /// Form parameters.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.maybe_add_bool("enable_ssh", self.enable_ssh);
        params.maybe_add_bool("skip_bmc_config", self.skip_bmc_config);
        params.maybe_add_bool("skip_networking", self.skip_networking);
        params.maybe_add_bool("skip_storage", self.skip_storage);
        params.maybe_add("commissioning_scripts", &self.commissioning_scripts);
        params.maybe_add("testing_scripts", &self.testing_scripts);
        params
    }
}

/// Arguments for creating a physical interface.
#[derive(Debug, Clone, Default)]
pub struct CreateInterfaceArgs {
    /// Interface name (required).
    pub name: String,
    /// MAC address (required).
    pub mac_address: String,
    /// Untagged VLAN the interface is connected to (required).
    pub vlan: Option<Vlan>,
    /// Tags.
    pub tags: Vec<String>,
    /// MTU.
    pub mtu: u32,
    /// Accept IPv6 router advertisements.
    pub accept_ra: bool,
    /// Perform IPv6 stateless autoconfiguration.
    pub autoconf: bool,
}

impl CreateInterfaceArgs {
    /// Check the required fields.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(not_valid("missing Name"));
        }
        if self.mac_address.is_empty() {
            return Err(not_valid("missing MACAddress"));
        }
        if self.vlan.is_none() {
            return Err(not_valid("missing VLAN"));
        }
        Ok(())
    }

    /// Form parameters.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.add("name", self.name.as_str());
        params.add("mac_address", self.mac_address.as_str());
        params.add(
            "vlan",
            self.vlan.as_ref().map_or(0, |vlan| vlan.id).to_string(),
        );
        params.maybe_add("tags", &self.tags.join(","));
        params.maybe_add_int("mtu", self.mtu);
        params.maybe_add_bool("accept_ra", self.accept_ra);
        params.maybe_add_bool("autoconf", self.autoconf);
        params
    }
}

/// Fields to change on an interface; empty fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateInterfaceArgs {
    /// New name.
    pub name: String,
    /// New MAC address.
    pub mac_address: String,
    /// New untagged VLAN.
    pub vlan: Option<Vlan>,
}

impl UpdateInterfaceArgs {
    /// True when nothing would be changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.mac_address.is_empty() && self.vlan.is_none()
    }

    /// Form parameters.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.maybe_add("name", &self.name);
        params.maybe_add("mac_address", &self.mac_address);
        params.maybe_add_int("vlan", self.vlan.as_ref().map_or(0, |vlan| vlan.id));
        params
    }
}

/// How an interface obtains its address on a linked subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkMode {
    /// Address assigned from the subnet when the machine is deployed.
    Auto,
    /// Address obtained over DHCP.
    Dhcp,
    /// Fixed address.
    Static,
    /// Link is up with no address.
    LinkUp,
}

impl LinkMode {
    /// Wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Dhcp => "DHCP",
            Self::Static => "STATIC",
            Self::LinkUp => "LINK_UP",
        }
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "AUTO" => Ok(Self::Auto),
            "DHCP" => Ok(Self::Dhcp),
            "STATIC" => Ok(Self::Static),
            "LINK_UP" => Ok(Self::LinkUp),
            "" => Err(not_valid("missing Mode")),
            _ => Err(not_valid(format!("unknown Mode value ({value:?})"))),
        }
    }
}

/// Arguments for linking an interface to a subnet.
#[derive(Debug, Clone, Default)]
pub struct LinkSubnetArgs {
    /// Link mode (required).
    pub mode: Option<LinkMode>,
    /// Subnet to link to (required).
    pub subnet: Option<Subnet>,
    /// Fixed address; only valid with `LinkMode::Static`.
    pub ip_address: String,
    /// Use the subnet's gateway as default; only valid with `LinkMode::Static`.
    pub default_gateway: bool,
}

impl LinkSubnetArgs {
    /// Check the mode-specific rules.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        let Some(mode) = self.mode else {
            return Err(not_valid("missing Mode"));
        };
        if self.subnet.is_none() {
            return Err(not_valid("missing Subnet"));
        }
        if !self.ip_address.is_empty() && mode != LinkMode::Static {
            return Err(not_valid("setting IP Address when Mode is not STATIC"));
        }
        if self.default_gateway && mode != LinkMode::Static {
            return Err(not_valid(format!(
                "specifying DefaultGateway for Mode {:?}",
                mode.as_str()
            )));
        }
        Ok(())
    }

    /// Form parameters.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some(mode) = self.mode {
            params.add("mode", mode.as_str());
        }
        if let Some(subnet) = &self.subnet {
            params.add("subnet", subnet.id.to_string());
        }
        params.maybe_add("ip_address", &self.ip_address);
        params.maybe_add_bool("default_gateway", self.default_gateway);
        params
    }
}

/// Arguments for uploading a file.
///
/// Exactly one of `content` or `reader` must be given; `length` is required
/// with a reader and forbidden with content.
#[derive(Default)]
pub struct AddFileArgs<'a> {
    /// Name of the file; must not contain a path separator.
    pub filename: String,
    /// Literal content.
    pub content: Option<Vec<u8>>,
    /// Stream to read the content from.
    pub reader: Option<&'a mut (dyn AsyncRead + Unpin + Send)>,
    /// Number of bytes to read from `reader`.
    pub length: u64,
}

impl AddFileArgs<'_> {
    /// Check mutual exclusivity of the content sources.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.filename.is_empty() {
            return Err(not_valid("missing Filename"));
        }
        if self.filename.contains('/') {
            return Err(not_valid(format!("paths in Filename {:?}", self.filename)));
        }
        match (&self.content, &self.reader) {
            (None, None) => Err(not_valid("missing Content or Reader")),
            (None, Some(_)) if self.length == 0 => Err(not_valid("missing Length")),
            (Some(_), Some(_)) => Err(not_valid("specifying Content and Reader")),
            (Some(_), None) if self.length != 0 => {
                Err(not_valid("specifying Length and Content"))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for AddFileArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddFileArgs")
            .field("filename", &self.filename)
            .field("content", &self.content.as_ref().map(Vec::len))
            .field("reader", &self.reader.is_some())
            .field("length", &self.length)
            .finish()
    }
}

/// Arguments for creating a node as a child of a machine.
#[derive(Debug, Clone, Default)]
pub struct CreateMachineNodeArgs {
    /// Hostname; generated by the server when empty.
    pub hostname: String,
    /// Name for the node's single interface (required).
    pub interface_name: String,
    /// MAC address of that interface (required).
    pub mac_address: String,
    /// Subnet to link the interface to with a static address.
    pub subnet: Option<Subnet>,
    /// VLAN for the interface; defaults to the subnet's VLAN.
    pub vlan: Option<Vlan>,
}

impl CreateMachineNodeArgs {
    /// Check required fields and subnet/VLAN consistency.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.interface_name.is_empty() {
            return Err(not_valid("missing InterfaceName"));
        }
        if self.mac_address.is_empty() {
            return Err(not_valid("missing MACAddress"));
        }
        if let (Some(subnet), Some(vlan)) = (&self.subnet, &self.vlan) {
            let subnet_vlan = subnet.vlan.as_ref().map_or(0, |v| v.id);
            if subnet_vlan != vlan.id {
                return Err(not_valid(format!(
                    "given subnet {:?} on VLAN {subnet_vlan} does not match given VLAN {}",
                    subnet.cidr, vlan.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subnet() -> Subnet {
        Subnet {
            id: 42,
            cidr: "10.0.0.0/24".into(),
            vlan: Some(Vlan {
                id: 5001,
                ..Vlan::default()
            }),
            ..Subnet::default()
        }
    }

    #[test]
    fn machines_params_use_wire_names() {
        let args = MachinesArgs {
            hostnames: vec!["a".into(), "b".into()],
            system_ids: vec!["4y3ha3".into()],
            zone: "default".into(),
            ..MachinesArgs::default()
        };
        let params = args.to_params();
        assert_eq!(params.get_all("hostname"), vec!["a", "b"]);
        assert_eq!(params.get("id"), Some("4y3ha3"));
        assert_eq!(params.get("zone"), Some("default"));
        assert!(params.get("domain").is_none());
        assert!(MachinesArgs::default().to_params().is_empty());
    }

    #[test]
    fn allocate_params_join_specs() {
        let args = AllocateMachineArgs {
            architecture: "amd64/generic".into(),
            min_cpu_count: 4,
            min_memory: 0,
            storage: vec![
                StorageSpec {
                    label: "root".into(),
                    size: 20,
                    tags: vec!["ssd".into(), "fast".into()],
                },
                StorageSpec {
                    label: String::new(),
                    size: 100,
                    tags: vec![],
                },
            ],
            interfaces: vec![
                InterfaceSpec {
                    label: "default".into(),
                    space: "public".into(),
                },
                InterfaceSpec {
                    label: "int".into(),
                    space: "internal".into(),
                },
            ],
            not_space: vec!["dmz".into()],
            dry_run: true,
            ..AllocateMachineArgs::default()
        };
        let params = args.to_params();
        assert_eq!(params.get("arch"), Some("amd64/generic"));
        assert_eq!(params.get("cpu_count"), Some("4"));
        assert!(params.get("mem").is_none());
        assert_eq!(params.get("storage"), Some("root:20(ssd,fast),100"));
        assert_eq!(
            params.get("interfaces"),
            Some("default:space=public;int:space=internal")
        );
        assert_eq!(params.get_all("not_subnets"), vec!["space:dmz"]);
        assert_eq!(params.get("dry_run"), Some("true"));
    }

    #[test]
    fn allocate_validation() {
        let cases: Vec<(AllocateMachineArgs, &str)> = vec![
            (
                AllocateMachineArgs {
                    storage: vec![StorageSpec::default()],
                    ..AllocateMachineArgs::default()
                },
                "Storage: Size value 0 not valid",
            ),
            (
                AllocateMachineArgs {
                    storage: vec![StorageSpec {
                        size: 10,
                        tags: vec!["a,b".into()],
                        ..StorageSpec::default()
                    }],
                    ..AllocateMachineArgs::default()
                },
                "Storage: tag includes comma (\"a,b\") not valid",
            ),
            (
                AllocateMachineArgs {
                    storage: vec![
                        StorageSpec {
                            label: "x".into(),
                            size: 10,
                            tags: vec![],
                        },
                        StorageSpec {
                            label: "x".into(),
                            size: 20,
                            tags: vec![],
                        },
                    ],
                    ..AllocateMachineArgs::default()
                },
                "reusing storage Label \"x\" not valid",
            ),
            (
                AllocateMachineArgs {
                    interfaces: vec![InterfaceSpec {
                        label: "eth".into(),
                        space: String::new(),
                    }],
                    ..AllocateMachineArgs::default()
                },
                "Interfaces: empty Space constraint not valid",
            ),
            (
                AllocateMachineArgs {
                    interfaces: vec![InterfaceSpec::default()],
                    ..AllocateMachineArgs::default()
                },
                "Interfaces: missing Label not valid",
            ),
            (
                AllocateMachineArgs {
                    interfaces: vec![
                        InterfaceSpec {
                            label: "a".into(),
                            space: "s".into(),
                        },
                        InterfaceSpec {
                            label: "a".into(),
                            space: "t".into(),
                        },
                    ],
                    ..AllocateMachineArgs::default()
                },
                "reusing interface Label \"a\" not valid",
            ),
            (
                AllocateMachineArgs {
                    not_space: vec![String::new()],
                    ..AllocateMachineArgs::default()
                },
                "empty NotSpace constraint not valid",
            ),
        ];

        for (args, expected) in cases {
            let err = args.validate().unwrap_err();
            assert!(matches!(err, Error::NotValid(_)), "{err:?}");
            assert_eq!(err.to_string(), expected);
        }

        let unlabelled = AllocateMachineArgs {
            storage: vec![
                StorageSpec {
                    size: 10,
                    ..StorageSpec::default()
                },
                StorageSpec {
                    size: 20,
                    ..StorageSpec::default()
                },
            ],
            ..AllocateMachineArgs::default()
        };
        assert!(unlabelled.validate().is_ok());
    }

    #[test]
    fn release_and_deploy_params_skip_zero_values() {
        let release = ReleaseMachinesArgs {
            system_ids: vec!["a".into(), "b".into()],
            quick_erase: true,
            ..ReleaseMachinesArgs::default()
        };
        let params = release.to_params();
        assert_eq!(params.get_all("machines"), vec!["a", "b"]);
        assert_eq!(params.get("quick_erase"), Some("true"));
        assert!(params.get("erase").is_none());

        let deploy = DeployMachineArgs {
            user_data: "userdata".into(),
            distro_series: "trusty".into(),
            kernel: "kernel".into(),
            comment: "a comment".into(),
            ..DeployMachineArgs::default()
        };
        let params = deploy.to_params();
        assert_eq!(params.len(), 4);
        assert_eq!(params.get("hwe_kernel"), Some("kernel"));
    }

    #[test]
    fn commission_params() {
        let args = CommissionMachineArgs {
            enable_ssh: true,
            skip_storage: true,
            testing_scripts: "smartctl-validate".into(),
            ..CommissionMachineArgs::default()
        };
        let params = args.to_params();
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("testing_scripts"), Some("smartctl-validate"));
    }

    #[test]
    fn create_interface_validation_and_params() {
        let mut args = CreateInterfaceArgs::default();
        assert_eq!(
            args.validate().unwrap_err().to_string(),
            "missing Name not valid"
        );
        args.name = "eth43".into();
        assert_eq!(
            args.validate().unwrap_err().to_string(),
            "missing MACAddress not valid"
        );
        args.mac_address = "52:54:00:55:b6:80".into();
        assert_eq!(
            args.validate().unwrap_err().to_string(),
            "missing VLAN not valid"
        );
        args.vlan = Some(Vlan {
            id: 33,
            ..Vlan::default()
        });
        args.tags = vec!["foo".into(), "bar".into()];
        assert!(args.validate().is_ok());

        let params = args.to_params();
        assert_eq!(params.get("name"), Some("eth43"));
        assert_eq!(params.get("vlan"), Some("33"));
        assert_eq!(params.get("tags"), Some("foo,bar"));
        assert!(params.get("mtu").is_none());
    }

    #[test]
    fn update_interface_emptiness() {
        assert!(UpdateInterfaceArgs::default().is_empty());
        let args = UpdateInterfaceArgs {
            vlan: Some(Vlan {
                id: 7,
                ..Vlan::default()
            }),
            ..UpdateInterfaceArgs::default()
        };
        assert!(!args.is_empty());
        assert_eq!(args.to_params().get("vlan"), Some("7"));
    }

    #[test]
    fn link_mode_parsing() {
        assert_eq!("STATIC".parse::<LinkMode>().unwrap(), LinkMode::Static);
        assert_eq!("link_up".parse::<LinkMode>().unwrap(), LinkMode::LinkUp);
        assert_eq!(
            "foo".parse::<LinkMode>().unwrap_err().to_string(),
            "unknown Mode value (\"foo\") not valid"
        );
        assert_eq!(
            "".parse::<LinkMode>().unwrap_err().to_string(),
            "missing Mode not valid"
        );
    }

    #[test]
    fn link_subnet_validation() {
        let with = |mode: Option<LinkMode>, ip: &str, gateway: bool| LinkSubnetArgs {
            mode,
            subnet: Some(Subnet::default()),
            ip_address: ip.to_string(),
            default_gateway: gateway,
        };

        let cases = vec![
            (LinkSubnetArgs::default(), Some("missing Mode not valid")),
            (
                LinkSubnetArgs {
                    mode: Some(LinkMode::Dhcp),
                    ..LinkSubnetArgs::default()
                },
                Some("missing Subnet not valid"),
            ),
            (with(Some(LinkMode::Dhcp), "", false), None),
            (with(Some(LinkMode::Static), "", false), None),
            (with(Some(LinkMode::LinkUp), "", false), None),
            (
                with(Some(LinkMode::Dhcp), "10.10.10.10", false),
                Some("setting IP Address when Mode is not STATIC not valid"),
            ),
            (with(Some(LinkMode::Static), "10.10.10.10", false), None),
            (
                with(Some(LinkMode::LinkUp), "10.10.10.10", false),
                Some("setting IP Address when Mode is not STATIC not valid"),
            ),
            (
                with(Some(LinkMode::Dhcp), "", true),
                Some("specifying DefaultGateway for Mode \"DHCP\" not valid"),
            ),
            (with(Some(LinkMode::Static), "", true), None),
            (
                with(Some(LinkMode::LinkUp), "", true),
                Some("specifying DefaultGateway for Mode \"LINK_UP\" not valid"),
            ),
        ];

        for (args, expected) in cases {
            match expected {
                None => assert!(args.validate().is_ok(), "{args:?}"),
                Some(text) => assert_eq!(args.validate().unwrap_err().to_string(), text),
            }
        }
    }

    #[test]
    fn link_subnet_params() {
        let args = LinkSubnetArgs {
            mode: Some(LinkMode::Static),
            subnet: Some(subnet()),
            ip_address: "10.10.10.10".into(),
            default_gateway: true,
        };
        let params = args.to_params();
        assert_eq!(params.get("mode"), Some("STATIC"));
        assert_eq!(params.get("subnet"), Some("42"));
        assert_eq!(params.get("ip_address"), Some("10.10.10.10"));
        assert_eq!(params.get("default_gateway"), Some("true"));
    }

    #[test]
    fn add_file_validation() {
        let mut reader: &[u8] = b"test";
        let cases: Vec<(AddFileArgs<'_>, Option<&str>)> = vec![
            (AddFileArgs::default(), Some("missing Filename not valid")),
            (
                AddFileArgs {
                    filename: "/foo".into(),
                    ..AddFileArgs::default()
                },
                Some("paths in Filename \"/foo\" not valid"),
            ),
            (
                AddFileArgs {
                    filename: "a/foo".into(),
                    ..AddFileArgs::default()
                },
                Some("paths in Filename \"a/foo\" not valid"),
            ),
            (
                AddFileArgs {
                    filename: "foo.txt".into(),
                    ..AddFileArgs::default()
                },
                Some("missing Content or Reader not valid"),
            ),
            (
                AddFileArgs {
                    filename: "foo.txt".into(),
                    content: Some(b"foo".to_vec()),
                    length: 20,
                    ..AddFileArgs::default()
                },
                Some("specifying Length and Content not valid"),
            ),
            (
                AddFileArgs {
                    filename: "foo.txt".into(),
                    content: Some(b"foo".to_vec()),
                    ..AddFileArgs::default()
                },
                None,
            ),
        ];

        for (args, expected) in cases {
            match expected {
                None => assert!(args.validate().is_ok(), "{args:?}"),
                Some(text) => assert_eq!(args.validate().unwrap_err().to_string(), text),
            }
        }

        let missing_length = AddFileArgs {
            filename: "foo.txt".into(),
            reader: Some(&mut reader),
            ..AddFileArgs::default()
        };
        assert_eq!(
            missing_length.validate().unwrap_err().to_string(),
            "missing Length not valid"
        );

        let both = AddFileArgs {
            filename: "foo.txt".into(),
            content: Some(b"foo".to_vec()),
            reader: Some(&mut reader),
            ..AddFileArgs::default()
        };
        assert_eq!(
            both.validate().unwrap_err().to_string(),
            "specifying Content and Reader not valid"
        );

        let streamed = AddFileArgs {
            filename: "foo.txt".into(),
            reader: Some(&mut reader),
            length: 4,
            ..AddFileArgs::default()
        };
        assert!(streamed.validate().is_ok());
    }

    #[test]
    fn create_machine_node_validation() {
        let mut args = CreateMachineNodeArgs::default();
        assert_eq!(
            args.validate().unwrap_err().to_string(),
            "missing InterfaceName not valid"
        );
        args.interface_name = "eth1".into();
        assert_eq!(
            args.validate().unwrap_err().to_string(),
            "missing MACAddress not valid"
        );
        args.mac_address = "52:54:00:55:b6:81".into();
        args.subnet = Some(subnet());
        args.vlan = Some(Vlan {
            id: 9,
            ..Vlan::default()
        });
        assert_eq!(
            args.validate().unwrap_err().to_string(),
            "given subnet \"10.0.0.0/24\" on VLAN 5001 does not match given VLAN 9 not valid"
        );
        args.vlan = Some(Vlan {
            id: 5001,
            ..Vlan::default()
        });
        assert!(args.validate().is_ok());
    }
}
