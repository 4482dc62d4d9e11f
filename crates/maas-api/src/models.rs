//! MAAS data models for machines, nodes, devices and their networking and storage.
//!
//! Every entity is plain data decoded from a server response. Missing or `null`
//! fields decode to the type's zero value; nested entities (zone, VLAN, subnet)
//! are embedded snapshots, not live references.

use std::collections::{BTreeSet, HashMap};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use maas_core::Error;
use serde::{Deserialize, Deserializer, Serialize};

use crate::Result;

/// Decode `null` as the type's default value.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A physical or virtual machine managed by MAAS.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Machine {
    /// Addressable handle for follow-up calls.
    #[serde(deserialize_with = "nullable")]
    pub resource_uri: String,
    /// Machine identity.
    #[serde(deserialize_with = "nullable")]
    pub system_id: String,
    /// Short hostname.
    #[serde(deserialize_with = "nullable")]
    pub hostname: String,
    /// Fully qualified domain name.
    #[serde(deserialize_with = "nullable")]
    pub fqdn: String,
    /// Tag names.
    #[serde(rename = "tag_names", deserialize_with = "nullable")]
    pub tags: Vec<String>,
    /// Key/value data stored by the current owner.
    #[serde(deserialize_with = "nullable")]
    pub owner_data: HashMap<String, String>,
    /// Installed operating system, e.g. `ubuntu`.
    #[serde(rename = "osystem", deserialize_with = "nullable")]
    pub operating_system: String,
    /// Distro series, e.g. `jammy`.
    #[serde(deserialize_with = "nullable")]
    pub distro_series: String,
    /// Architecture, e.g. `amd64/generic`.
    #[serde(deserialize_with = "nullable")]
    pub architecture: String,
    /// Hardware enablement kernel.
    #[serde(rename = "hwe_kernel", deserialize_with = "nullable")]
    pub kernel: String,
    /// Memory in MiB.
    #[serde(deserialize_with = "nullable")]
    pub memory: u64,
    /// Number of CPU cores.
    #[serde(deserialize_with = "nullable")]
    pub cpu_count: u32,
    /// Assigned IP addresses.
    #[serde(deserialize_with = "nullable")]
    pub ip_addresses: Vec<String>,
    /// Power state, e.g. `on`.
    #[serde(deserialize_with = "nullable")]
    pub power_state: String,
    /// Lifecycle status, e.g. `Deployed`.
    #[serde(deserialize_with = "nullable")]
    pub status_name: String,
    /// Last status transition message.
    #[serde(deserialize_with = "nullable")]
    pub status_message: String,
    /// Interface the machine PXE booted from.
    pub boot_interface: Option<NetworkInterface>,
    /// All network interfaces.
    #[serde(deserialize_with = "nullable")]
    pub interface_set: Vec<NetworkInterface>,
    /// Availability zone.
    pub zone: Option<Zone>,
    /// Physical disks only.
    #[serde(rename = "physicalblockdevice_set", deserialize_with = "nullable")]
    pub physical_block_devices: Vec<BlockDevice>,
    /// Physical and virtual block devices.
    #[serde(rename = "blockdevice_set", deserialize_with = "nullable")]
    pub block_devices: Vec<BlockDevice>,
}

impl Machine {
    /// Copy the server's view of the merge-set fields onto this machine.
    ///
    /// Interface and block-device lists are left untouched.
    pub fn update_from(&mut self, fresh: Machine) {
        self.resource_uri = fresh.resource_uri;
        self.system_id = fresh.system_id;
        self.hostname = fresh.hostname;
        self.fqdn = fresh.fqdn;
        self.operating_system = fresh.operating_system;
        self.distro_series = fresh.distro_series;
        self.kernel = fresh.kernel;
        self.architecture = fresh.architecture;
        self.memory = fresh.memory;
        self.cpu_count = fresh.cpu_count;
        self.ip_addresses = fresh.ip_addresses;
        self.power_state = fresh.power_state;
        self.status_name = fresh.status_name;
        self.status_message = fresh.status_message;
        self.zone = fresh.zone;
        self.tags = fresh.tags;
        self.owner_data = fresh.owner_data;
    }

    /// Interface with the given id.
    #[must_use]
    pub fn interface(&self, id: i64) -> Option<&NetworkInterface> {
        self.interface_set.iter().find(|iface| iface.id == id)
    }

    /// Physical or virtual block device with the given id.
    #[must_use]
    pub fn block_device(&self, id: i64) -> Option<&BlockDevice> {
        self.block_devices.iter().find(|device| device.id == id)
    }

    /// Physical block device with the given id.
    #[must_use]
    pub fn physical_block_device(&self, id: i64) -> Option<&BlockDevice> {
        self.physical_block_devices
            .iter()
            .find(|device| device.id == id)
    }

    /// True when every `filter` entry is present with the same value in the owner data.
    #[must_use]
    pub fn owner_data_matches(&self, filter: &HashMap<String, String>) -> bool {
        filter
            .iter()
            .all(|(key, value)| self.owner_data.get(key) == Some(value))
    }
}

/// A non-machine node, typically a child of a machine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Node {
    /// Addressable handle for follow-up calls.
    #[serde(deserialize_with = "nullable")]
    pub resource_uri: String,
    /// Node identity.
    #[serde(deserialize_with = "nullable")]
    pub system_id: String,
    /// Short hostname.
    #[serde(deserialize_with = "nullable")]
    pub hostname: String,
    /// Fully qualified domain name.
    #[serde(deserialize_with = "nullable")]
    pub fqdn: String,
    /// System id of the owning machine.
    #[serde(deserialize_with = "nullable")]
    pub parent: String,
    /// Owning user.
    #[serde(deserialize_with = "nullable")]
    pub owner: String,
    /// Assigned IP addresses.
    #[serde(deserialize_with = "nullable")]
    pub ip_addresses: Vec<String>,
    /// Network interfaces.
    #[serde(deserialize_with = "nullable")]
    pub interface_set: Vec<NetworkInterface>,
    /// Availability zone.
    pub zone: Option<Zone>,
    /// Tag names.
    #[serde(rename = "tag_names", deserialize_with = "nullable")]
    pub tags: Vec<String>,
    /// Node type, e.g. `Device`.
    #[serde(rename = "node_type_name", deserialize_with = "nullable")]
    pub node_type: String,
}

/// A device registered with MAAS.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Device {
    /// Addressable handle for follow-up calls.
    #[serde(deserialize_with = "nullable")]
    pub resource_uri: String,
    /// Device identity.
    #[serde(deserialize_with = "nullable")]
    pub system_id: String,
    /// Short hostname.
    #[serde(deserialize_with = "nullable")]
    pub hostname: String,
    /// Fully qualified domain name.
    #[serde(deserialize_with = "nullable")]
    pub fqdn: String,
    /// System id of the owning machine.
    #[serde(deserialize_with = "nullable")]
    pub parent: String,
    /// Owning user.
    #[serde(deserialize_with = "nullable")]
    pub owner: String,
    /// Assigned IP addresses.
    #[serde(deserialize_with = "nullable")]
    pub ip_addresses: Vec<String>,
    /// Network interfaces.
    #[serde(deserialize_with = "nullable")]
    pub interface_set: Vec<NetworkInterface>,
    /// Availability zone.
    pub zone: Option<Zone>,
}

/// Entities that own a list of network interfaces.
pub trait InterfaceHost {
    /// Resource URI of the owner.
    fn resource_uri(&self) -> &str;

    /// Mutable access to the owner's interface list.
    fn interfaces_mut(&mut self) -> &mut Vec<NetworkInterface>;
}

impl InterfaceHost for Machine {
    fn resource_uri(&self) -> &str {
        &self.resource_uri
    }

    fn interfaces_mut(&mut self) -> &mut Vec<NetworkInterface> {
        &mut self.interface_set
    }
}

impl InterfaceHost for Node {
    fn resource_uri(&self) -> &str {
        &self.resource_uri
    }

    fn interfaces_mut(&mut self) -> &mut Vec<NetworkInterface> {
        &mut self.interface_set
    }
}

impl InterfaceHost for Device {
    fn resource_uri(&self) -> &str {
        &self.resource_uri
    }

    fn interfaces_mut(&mut self) -> &mut Vec<NetworkInterface> {
        &mut self.interface_set
    }
}

/// A network interface on a machine, node or device.
///
/// `parents` and `children` hold interface names only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkInterface {
    /// Addressable handle for follow-up calls.
    #[serde(deserialize_with = "nullable")]
    pub resource_uri: String,
    /// Interface id.
    #[serde(deserialize_with = "nullable")]
    pub id: i64,
    /// Interface name, e.g. `eth0`.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Interface type, e.g. `physical`.
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub interface_type: String,
    /// Whether the interface is enabled.
    #[serde(deserialize_with = "nullable")]
    pub enabled: bool,
    /// Tags.
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<String>,
    /// Untagged VLAN the interface is attached to.
    pub vlan: Option<Vlan>,
    /// Subnet attachments.
    #[serde(deserialize_with = "nullable")]
    pub links: Vec<Link>,
    /// MAC address.
    #[serde(deserialize_with = "nullable")]
    pub mac_address: String,
    /// Effective MTU.
    #[serde(deserialize_with = "nullable")]
    pub effective_mtu: u32,
    /// Names of parent interfaces.
    #[serde(deserialize_with = "nullable")]
    pub parents: Vec<String>,
    /// Names of child interfaces.
    #[serde(deserialize_with = "nullable")]
    pub children: Vec<String>,
}

impl NetworkInterface {
    /// Copy every field of the server's fresh copy onto this interface.
    pub fn update_from(&mut self, fresh: NetworkInterface) {
        *self = fresh;
    }

    /// The link attaching this interface to `subnet`, matched by subnet id.
    #[must_use]
    pub fn link_for_subnet(&self, subnet: &Subnet) -> Option<&Link> {
        self.links.iter().find(|link| {
            link.subnet
                .as_ref()
                .is_some_and(|linked| linked.id == subnet.id)
        })
    }
}

/// A subnet attachment on an interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Link {
    /// Link id.
    #[serde(deserialize_with = "nullable")]
    pub id: i64,
    /// Link mode as reported by the server, e.g. `auto`, `dhcp`, `static`, `link_up`.
    #[serde(deserialize_with = "nullable")]
    pub mode: String,
    /// Assigned address, empty when none.
    #[serde(deserialize_with = "nullable")]
    pub ip_address: String,
    /// Snapshot of the linked subnet.
    pub subnet: Option<Subnet>,
}

/// An IP subnet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Subnet {
    /// Addressable handle.
    #[serde(deserialize_with = "nullable")]
    pub resource_uri: String,
    /// Subnet id.
    #[serde(deserialize_with = "nullable")]
    pub id: i64,
    /// Subnet name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Name of the owning space.
    #[serde(deserialize_with = "nullable")]
    pub space: String,
    /// Snapshot of the owning VLAN.
    pub vlan: Option<Vlan>,
    /// Default gateway address.
    #[serde(rename = "gateway_ip", deserialize_with = "nullable")]
    pub gateway: String,
    /// Network in CIDR notation.
    #[serde(deserialize_with = "nullable")]
    pub cidr: String,
    /// DNS servers handed out on this subnet.
    #[serde(deserialize_with = "nullable")]
    pub dns_servers: Vec<String>,
}

/// A VLAN on a fabric.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Vlan {
    /// Addressable handle.
    #[serde(deserialize_with = "nullable")]
    pub resource_uri: String,
    /// VLAN id (database id, not the 802.1Q tag).
    #[serde(deserialize_with = "nullable")]
    pub id: i64,
    /// VLAN name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Name of the owning fabric.
    #[serde(deserialize_with = "nullable")]
    pub fabric: String,
    /// 802.1Q tag; 0 for untagged.
    #[serde(deserialize_with = "nullable")]
    pub vid: u32,
    /// MTU.
    #[serde(deserialize_with = "nullable")]
    pub mtu: u32,
    /// Whether MAAS serves DHCP on this VLAN.
    #[serde(rename = "dhcp_on", deserialize_with = "nullable")]
    pub dhcp: bool,
    /// Primary rack controller system id.
    #[serde(deserialize_with = "nullable")]
    pub primary_rack: String,
    /// Secondary rack controller system id.
    #[serde(deserialize_with = "nullable")]
    pub secondary_rack: String,
}

/// An availability zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Zone {
    /// Zone name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Free-form description.
    #[serde(deserialize_with = "nullable")]
    pub description: String,
}

/// A switching fabric.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Fabric {
    /// Addressable handle.
    #[serde(deserialize_with = "nullable")]
    pub resource_uri: String,
    /// Fabric id.
    #[serde(deserialize_with = "nullable")]
    pub id: i64,
    /// Fabric name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Optional class of the fabric.
    #[serde(deserialize_with = "nullable")]
    pub class_type: String,
    /// VLANs on the fabric.
    #[serde(deserialize_with = "nullable")]
    pub vlans: Vec<Vlan>,
}

/// A network space grouping subnets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Space {
    /// Addressable handle.
    #[serde(deserialize_with = "nullable")]
    pub resource_uri: String,
    /// Space id.
    #[serde(deserialize_with = "nullable")]
    pub id: i64,
    /// Space name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Subnets in the space.
    #[serde(deserialize_with = "nullable")]
    pub subnets: Vec<Subnet>,
}

/// A static route between two subnets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StaticRoute {
    /// Addressable handle.
    #[serde(deserialize_with = "nullable")]
    pub resource_uri: String,
    /// Route id.
    #[serde(deserialize_with = "nullable")]
    pub id: i64,
    /// Source subnet.
    pub source: Option<Subnet>,
    /// Destination subnet.
    pub destination: Option<Subnet>,
    /// Next-hop address.
    #[serde(deserialize_with = "nullable")]
    pub gateway_ip: String,
    /// Route metric.
    #[serde(deserialize_with = "nullable")]
    pub metric: i64,
}

/// A physical or virtual block device.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlockDevice {
    /// Addressable handle.
    #[serde(deserialize_with = "nullable")]
    pub resource_uri: String,
    /// Block device id.
    #[serde(deserialize_with = "nullable")]
    pub id: i64,
    /// Filesystem UUID of the device, if formatted.
    #[serde(deserialize_with = "nullable")]
    pub uuid: String,
    /// Kernel name, e.g. `sda`.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Hardware model.
    #[serde(deserialize_with = "nullable")]
    pub model: String,
    /// Stable `/dev/disk/by-id` path.
    #[serde(deserialize_with = "nullable")]
    pub id_path: String,
    /// `/dev/disk/by-dname` path.
    #[serde(deserialize_with = "nullable")]
    pub path: String,
    /// Human-readable usage summary.
    #[serde(deserialize_with = "nullable")]
    pub used_for: String,
    /// Tags.
    #[serde(deserialize_with = "nullable")]
    pub tags: Vec<String>,
    /// Block size in bytes.
    #[serde(deserialize_with = "nullable")]
    pub block_size: u64,
    /// Bytes in use.
    #[serde(deserialize_with = "nullable")]
    pub used_size: u64,
    /// Total size in bytes.
    #[serde(deserialize_with = "nullable")]
    pub size: u64,
    /// `physical` or `virtual`.
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub device_type: String,
    /// Partitions on the device.
    #[serde(deserialize_with = "nullable")]
    pub partitions: Vec<Partition>,
    /// Filesystem directly on the device.
    pub filesystem: Option<Filesystem>,
}

/// A partition on a block device.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Partition {
    /// Addressable handle.
    #[serde(deserialize_with = "nullable")]
    pub resource_uri: String,
    /// Partition id.
    #[serde(deserialize_with = "nullable")]
    pub id: i64,
    /// Device path.
    #[serde(deserialize_with = "nullable")]
    pub path: String,
    /// Partition UUID.
    #[serde(deserialize_with = "nullable")]
    pub uuid: String,
    /// Human-readable usage summary.
    #[serde(deserialize_with = "nullable")]
    pub used_for: String,
    /// Size in bytes.
    #[serde(deserialize_with = "nullable")]
    pub size: u64,
    /// Filesystem on the partition.
    pub filesystem: Option<Filesystem>,
}

/// A filesystem on a partition or block device.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Filesystem {
    /// Filesystem type, e.g. `ext4`.
    #[serde(rename = "fstype", deserialize_with = "nullable")]
    pub fs_type: String,
    /// Mount point.
    #[serde(deserialize_with = "nullable")]
    pub mount_point: String,
    /// Filesystem label.
    #[serde(deserialize_with = "nullable")]
    pub label: String,
    /// Filesystem UUID.
    #[serde(deserialize_with = "nullable")]
    pub uuid: String,
}

/// A file stored in MAAS.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct File {
    /// Addressable handle.
    #[serde(deserialize_with = "nullable")]
    pub resource_uri: String,
    /// File name.
    #[serde(deserialize_with = "nullable")]
    pub filename: String,
    /// Unauthenticated download URI.
    #[serde(deserialize_with = "nullable")]
    pub anon_resource_uri: String,
    /// Base64 content; only present on single-file fetches.
    #[serde(deserialize_with = "nullable")]
    pub content: String,
}

impl File {
    /// Decode the base64 `content` field.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` if the content is not valid base64.
    pub fn decoded_content(&self) -> Result<Vec<u8>> {
        STANDARD.decode(self.content.trim()).map_err(|err| {
            Error::Decode(format!("file {:?} content: {err}", self.filename))
        })
    }
}

/// A boot image resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BootResource {
    /// Addressable handle.
    #[serde(deserialize_with = "nullable")]
    pub resource_uri: String,
    /// Resource id.
    #[serde(deserialize_with = "nullable")]
    pub id: i64,
    /// Image name, e.g. `ubuntu/jammy`.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// Resource type, e.g. `Synced`.
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub resource_type: String,
    /// Architecture, e.g. `amd64/hwe-22.04`.
    #[serde(deserialize_with = "nullable")]
    pub architecture: String,
    /// Comma-joined supported sub-architectures.
    #[serde(deserialize_with = "nullable")]
    pub subarches: String,
    /// Kernel flavor.
    #[serde(deserialize_with = "nullable")]
    pub kflavor: String,
}

impl BootResource {
    /// The `subarches` field split into a set.
    #[must_use]
    pub fn sub_architectures(&self) -> BTreeSet<String> {
        self.subarches
            .split(',')
            .map(str::trim)
            .filter(|arch| !arch.is_empty())
            .map(str::to_string)
            .collect()
    }
}
