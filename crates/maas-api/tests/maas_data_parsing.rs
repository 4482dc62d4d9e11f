//! Integration tests for parsing MAAS data.
//!
//! These tests validate that the maas-api models can correctly deserialize
//! MAAS 2.0 API response data.

use std::fs;
use std::path::PathBuf;

use maas_api::models::{
    BootResource, Device, Fabric, File, Machine, Node, Space, StaticRoute, Zone,
};
use maas_api::parse_constraint_matches;
use serde::de::DeserializeOwned;

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load a fixture from disk.
fn load_fixture(name: &str) -> String {
    let fixture_path = fixtures_dir().join(name);
    fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    })
}

fn parse<T: DeserializeOwned>(name: &str) -> T {
    let json_data = load_fixture(name);
    serde_json::from_str(&json_data)
        .unwrap_or_else(|e| panic!("Failed to deserialize {name}: {e}\nJSON: {json_data}"))
}

#[test]
fn test_deserialize_machine_list() {
    let machines: Vec<Machine> = parse("machines.json");
    assert_eq!(machines.len(), 2, "Expected 2 machines in test data");

    let machine = &machines[0];
    assert_eq!(machine.system_id, "4y3ha3");
    assert_eq!(machine.resource_uri, "/MAAS/api/2.0/machines/4y3ha3/");
    assert_eq!(machine.hostname, "untasted-markita");
    assert_eq!(machine.fqdn, "untasted-markita.maas");
    assert_eq!(machine.tags, vec!["virtual", "magic"]);
    assert_eq!(machine.operating_system, "ubuntu");
    assert_eq!(machine.distro_series, "trusty");
    assert_eq!(machine.kernel, "hwe-t");
    assert_eq!(machine.architecture, "amd64/generic");
    assert_eq!(machine.memory, 1024);
    assert_eq!(machine.cpu_count, 1);
    assert_eq!(machine.ip_addresses, vec!["192.168.100.4"]);
    assert_eq!(machine.power_state, "on");
    assert_eq!(machine.status_name, "Deployed");
    assert_eq!(machine.status_message, "From 'Deploying' to 'Deployed'");
    assert_eq!(
        machine.owner_data.get("fez").map(String::as_str),
        Some("phil fish")
    );
    assert_eq!(machine.zone.as_ref().map(|z| z.name.as_str()), Some("default"));
}

#[test]
fn test_machine_networking() {
    let machines: Vec<Machine> = parse("machines.json");
    let machine = &machines[0];

    let boot = machine
        .boot_interface
        .as_ref()
        .expect("Should have a boot interface");
    assert_eq!(boot.id, 35);
    assert_eq!(boot.interface_type, "physical");
    assert_eq!(boot.children, vec!["eth0.1", "eth0.2"]);
    let vlan = boot.vlan.as_ref().expect("boot interface VLAN");
    assert!(vlan.dhcp);
    assert_eq!(vlan.primary_rack, "4y3h7n");
    assert_eq!(vlan.secondary_rack, "");

    let link = &boot.links[0];
    assert_eq!(link.mode, "auto");
    let subnet = link.subnet.as_ref().expect("link subnet");
    assert_eq!(subnet.cidr, "192.168.100.0/24");
    assert_eq!(subnet.gateway, "192.168.100.1");

    assert_eq!(machine.interface_set.len(), 2);
    let child = machine.interface(99).expect("interface 99");
    assert_eq!(child.name, "eth0.1");
    assert_eq!(child.parents, vec!["eth0"]);
    assert!(child.tags.is_empty());
    assert!(machine.interface(1).is_none());
}

#[test]
fn test_machine_storage() {
    let machines: Vec<Machine> = parse("machines.json");
    let machine = &machines[0];

    assert_eq!(machine.physical_block_devices.len(), 1);
    assert_eq!(machine.block_devices.len(), 2);

    let disk = machine.physical_block_device(34).expect("disk 34");
    assert_eq!(disk.model, "QEMU HARDDISK");
    assert_eq!(disk.uuid, "");
    assert_eq!(disk.device_type, "physical");
    assert!(disk.filesystem.is_none());

    let partition = &disk.partitions[0];
    assert_eq!(partition.size, 8_581_545_984);
    let fs = partition.filesystem.as_ref().expect("partition filesystem");
    assert_eq!(fs.fs_type, "ext4");
    assert_eq!(fs.mount_point, "/");

    assert!(machine.physical_block_device(36).is_none());
    assert_eq!(
        machine.block_device(36).map(|d| d.device_type.as_str()),
        Some("virtual")
    );
}

#[test]
fn test_machine_nulls_are_zero_values() {
    let machines: Vec<Machine> = parse("machines.json");
    let machine = &machines[1];

    assert!(machine.tags.is_empty());
    assert_eq!(machine.kernel, "");
    assert_eq!(machine.status_message, "");
    assert!(machine.boot_interface.is_none());
    assert!(machine.block_devices.is_empty());
}

#[test]
fn test_deserialize_nodes_and_devices() {
    let nodes: Vec<Node> = parse("nodes.json");
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].parent, "4y3ha3");
    assert_eq!(nodes[0].node_type, "Device");
    assert_eq!(nodes[0].interface_set[0].mac_address, "78:f0:f1:16:a7:46");
    assert!(nodes[0].interface_set[0].vlan.is_none());
    assert_eq!(nodes[1].parent, "");
    assert!(nodes[1].interface_set.is_empty());
    assert!(nodes[1].zone.is_none());

    let devices: Vec<Device> = parse("devices.json");
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].hostname, "plant-pot");
    assert_eq!(devices[0].interface_set[0].id, 49);
}

#[test]
fn test_deserialize_network_topology() {
    let fabrics: Vec<Fabric> = parse("fabrics.json");
    assert_eq!(fabrics.len(), 2);
    assert_eq!(fabrics[0].class_type, "");
    assert_eq!(fabrics[0].vlans.len(), 2);
    assert_eq!(fabrics[0].vlans[1].mtu, 9000);
    assert_eq!(fabrics[1].class_type, "10g");

    let spaces: Vec<Space> = parse("spaces.json");
    assert_eq!(spaces[0].subnets[0].dns_servers, vec!["8.8.8.8", "8.8.4.4"]);
    assert!(spaces[1].subnets.is_empty());

    let routes: Vec<StaticRoute> = parse("static_routes.json");
    let route = &routes[0];
    assert_eq!(route.gateway_ip, "192.168.100.254");
    assert_eq!(route.metric, 0);
    assert_eq!(
        route.destination.as_ref().map(|s| s.cidr.as_str()),
        Some("10.20.19.0/24")
    );

    let zones: Vec<Zone> = parse("zones.json");
    assert_eq!(zones[1].description, "Racks with redundant power");
}

#[test]
fn test_deserialize_files() {
    let files: Vec<File> = parse("files.json");
    assert_eq!(files.len(), 2);
    assert_eq!(files[1].filename, "test-file.txt");
    assert_eq!(files[1].content, "");

    let file: File = parse("file.json");
    assert_eq!(file.decoded_content().unwrap(), b"this is a test\n");
}

#[test]
fn test_deserialize_boot_resources() {
    let resources: Vec<BootResource> = parse("boot_resources.json");
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0].resource_type, "Synced");

    let subarches = resources[0].sub_architectures();
    assert_eq!(subarches.len(), 6);
    assert!(subarches.contains("hwe-t"));
    assert!(resources[1].sub_architectures().is_empty());
}

#[test]
fn test_allocate_response_constraint_matches() {
    let json_data = load_fixture("allocate.json");
    let source: serde_json::Value = serde_json::from_str(&json_data).unwrap();
    let machine: Machine = serde_json::from_value(source.clone()).unwrap();

    let matches = parse_constraint_matches(&source, &machine).unwrap();
    assert_eq!(matches.interfaces["default"][0].name, "eth0");
    assert_eq!(matches.interfaces["vlan"][0].name, "eth0.1");
    assert_eq!(matches.storage["root"][0].name, "sda");
    assert_eq!(matches.storage["scratch"][0].name, "vg0-lv0");
}
