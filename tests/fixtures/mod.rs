// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-virt-topology
//!
//! Provides a deterministic two-role deployment document and a matching
//! virtualization catalog.
//!
//! The document exercises every normalization rule at least once:
//! - a resource whose server role does not exist (dropped)
//! - a server role, interface model, network group, network, NIC mapping
//!   and server group nothing uses (pruned)
//! - a server with an unknown role and a firewall rule over a pruned group
//!   (dropped)
//! - neutron tags declared both by configuration data and on a group

#![allow(dead_code)]

use cim_virt_topology::VirtConfig;
use serde_json::{json, Value};

pub const CLOUD_NAME: &str = "demo";

pub const CLM_NETWORK: &str = "ARDANA-NET";
pub const CLM_POOL_START: &str = "192.168.10.6";
pub const CLM_POOL_END: &str = "192.168.10.249";

pub const CONTROLLER_INTERFACES: &str = "CONTROLLER-INTERFACES";
pub const COMPUTE_INTERFACES: &str = "COMPUTE-INTERFACES";

/// Deployment document with two controllers and two computes
pub fn input_model() -> Value {
    json!({
        "cloud": {"name": CLOUD_NAME},
        "baremetal": {"subnet": "192.168.10.0", "netmask": "255.255.255.0"},
        "control-planes": [{
            "name": "control-plane-1",
            "configuration-data": ["SWIFT-CONFIG-CP1"],
            "clusters": [{
                "name": "cluster0",
                "server-role": "CONTROLLER-ROLE",
                "configuration-data": ["NEUTRON-CONFIG-CP1"],
                "service-components": ["lifecycle-manager", "ntp-server", "keystone-api", "neutron-server"]
            }],
            "resources": [
                {
                    "name": "compute",
                    "server-role": "COMPUTE-ROLE",
                    "service-components": ["ntp-client", "nova-compute", "neutron-openvswitch-agent"]
                },
                {
                    "name": "ghost",
                    "server-role": "MISSING-ROLE",
                    "configuration-data": ["ORPHAN-CONFIG"],
                    "service-components": ["ntp-client"]
                }
            ]
        }],
        "configuration-data": [
            {
                "name": "NEUTRON-CONFIG-CP1",
                "services": ["neutron"],
                "network-tags": [{
                    "network-group": "EXTERNAL-API",
                    "tags": ["neutron.l3_agent.external_network_bridge"]
                }, {
                    "network-group": "MANAGEMENT",
                    "tags": [{"neutron.networking.vlan": {"provider-physical-network": "physnet2"}}]
                }],
                "data": {
                    "neutron_external_networks": [
                        {"name": "ext-net", "cidr": "172.31.0.0/16", "gateway": "172.31.0.1"}
                    ],
                    "neutron_provider_networks": [
                        {"name": "PROVIDER-FLAT", "cidr": "172.30.0.0/24",
                         "provider": [{"network_type": "flat", "physical_network": "physnet1"}]},
                        {"name": "PROVIDER-VLAN", "cidr": "172.29.0.0/24",
                         "provider": [{"network_type": "vlan", "physical_network": "physnet2", "segmentation_id": 106}]},
                        {"name": "PROVIDER-DYNAMIC",
                         "provider": [{"network_type": "vlan", "physical_network": "physnet3"}]},
                        {"name": "PROVIDER-VXLAN",
                         "provider": [{"network_type": "vxlan", "physical_network": "physnet4"}]}
                    ]
                }
            },
            {"name": "SWIFT-CONFIG-CP1", "services": ["swift"], "data": {}},
            {"name": "ORPHAN-CONFIG", "services": ["swift"], "data": {}}
        ],
        "server-roles": [
            {"name": "CONTROLLER-ROLE", "interface-model": CONTROLLER_INTERFACES, "disk-model": "CONTROLLER-DISKS"},
            {"name": "COMPUTE-ROLE", "interface-model": COMPUTE_INTERFACES, "disk-model": "COMPUTE-DISKS"},
            {"name": "UNUSED-ROLE", "interface-model": "UNUSED-INTERFACES", "disk-model": "COMPUTE-DISKS"}
        ],
        "interface-models": [
            {
                "name": CONTROLLER_INTERFACES,
                "network-interfaces": [
                    {
                        "name": "BOND0",
                        "device": {"name": "bond0"},
                        "bond-data": {
                            "provider": "linux",
                            "devices": [{"name": "hed1"}, {"name": "hed2"}],
                            "options": {"mode": "active-backup", "primary": "hed1"}
                        },
                        "network-groups": ["ARDANA", "MANAGEMENT", "INTERNAL-API", "EXTERNAL-API"]
                    },
                    {"name": "HED3", "device": {"name": "hed3"}, "network-groups": ["STORAGE"]},
                    {"name": "HED4", "device": {"name": "hed4"}, "forced-network-groups": ["PROVIDER"]}
                ]
            },
            {
                "name": COMPUTE_INTERFACES,
                "network-interfaces": [
                    {"name": "HED1", "device": {"name": "hed1"}, "network-groups": ["ARDANA", "MANAGEMENT"]},
                    {"name": "HED2", "device": {"name": "hed2"}, "network-groups": ["STORAGE", "PROVIDER"]}
                ]
            },
            {
                "name": "UNUSED-INTERFACES",
                "network-interfaces": [
                    {"name": "HED1", "device": {"name": "hed1"}, "network-groups": ["UNUSED"]}
                ]
            }
        ],
        "disk-models": [
            {
                "name": "CONTROLLER-DISKS",
                "volume-groups": [{"name": "ardana-vg", "physical-volumes": ["/dev/sda_root", "/dev/sdb"]}],
                "device-groups": [{"name": "swiftobj", "devices": [{"name": "/dev/sdc"}]}]
            },
            {
                "name": "COMPUTE-DISKS",
                "volume-groups": [{"name": "ardana-vg", "physical-volumes": ["/dev/sda_root"]}],
                "device-groups": [{"name": "nova", "devices": [{"name": "/dev/sdb"}]}]
            },
            {"name": "UNUSED-DISKS"}
        ],
        "network-groups": [
            {"name": "ARDANA"},
            {"name": "MANAGEMENT", "routes": ["STORAGE"]},
            {"name": "EXTERNAL-API", "routes": ["default"]},
            {"name": "INTERNAL-API", "routes": ["EXTERNAL-API"]},
            {"name": "STORAGE", "routes": ["MANAGEMENT"]},
            {
                "name": "PROVIDER",
                "routes": ["PROVIDER-VLAN", "NOWHERE"],
                "tags": [{"neutron.networking.flat": {"provider-physical-network": "physnet1"}}]
            },
            {"name": "UNUSED"}
        ],
        "networks": [
            {"name": "ARDANA-NET", "network-group": "ARDANA",
             "cidr": "192.168.10.0/24", "gateway-ip": "192.168.10.1"},
            {"name": "MANAGEMENT-NET", "network-group": "MANAGEMENT",
             "cidr": "192.168.245.0/24", "gateway-ip": "192.168.245.1",
             "tagged-vlan": true, "vlanid": 101},
            {"name": "EXTERNAL-API-NET", "network-group": "EXTERNAL-API",
             "cidr": "10.0.1.0/24", "gateway-ip": "10.0.1.1", "vlanid": 102},
            {"name": "INTERNAL-API-NET", "network-group": "INTERNAL-API",
             "cidr": "10.0.2.0/24", "gateway-ip": "10.0.2.1"},
            {"name": "STORAGE-NET", "network-group": "STORAGE",
             "cidr": "10.0.3.0/24", "gateway-ip": "10.0.3.1"},
            {"name": "PROVIDER-NET", "network-group": "PROVIDER",
             "tagged-vlan": false, "vlanid": 103},
            {"name": "UNUSED-NET", "network-group": "UNUSED", "cidr": "10.0.9.0/24"}
        ],
        "servers": [
            {"id": "controller1", "ip-addr": "192.168.10.3", "role": "CONTROLLER-ROLE",
             "server-group": "RACK1", "nic-mapping": "MY-CONTROLLER-MAPPING"},
            {"id": "controller2", "ip-addr": "192.168.10.4", "role": "CONTROLLER-ROLE",
             "server-group": "RACK1", "nic-mapping": "MY-CONTROLLER-MAPPING"},
            {"id": "compute1", "ip-addr": "192.168.10.5", "role": "COMPUTE-ROLE",
             "nic-mapping": "MY-COMPUTE-MAPPING"},
            {"id": "compute2", "ip-addr": "192.168.10.250", "role": "COMPUTE-ROLE",
             "nic-mapping": "MY-COMPUTE-MAPPING", "distro-id": "rhel73"},
            {"id": "orphan", "ip-addr": "192.168.10.9", "role": "UNKNOWN-ROLE",
             "nic-mapping": "UNUSED-MAPPING"}
        ],
        "server-groups": [
            {"name": "CLOUD", "server-groups": ["AZ1", "AZ2"]},
            {"name": "AZ1", "server-groups": ["RACK1"]},
            {"name": "AZ2", "server-groups": ["RACK2"]},
            {"name": "RACK1", "networks": ["MANAGEMENT-NET"]},
            {"name": "RACK2", "networks": ["STORAGE-NET"]}
        ],
        "nic-mappings": [
            {"name": "MY-CONTROLLER-MAPPING", "physical-ports": [
                {"logical-name": "hed1", "type": "simple-port", "bus-address": "0000:01:00.0"}
            ]},
            {"name": "MY-COMPUTE-MAPPING", "physical-ports": []},
            {"name": "UNUSED-MAPPING", "physical-ports": []}
        ],
        "firewall-rules": [
            {"name": "SSH", "network-groups": ["ARDANA", "MANAGEMENT"]},
            {"name": "STALE", "network-groups": ["UNUSED"]}
        ]
    })
}

/// Virtualization catalog matching [`input_model`], as a raw document
pub fn virt_config_document() -> Value {
    json!({
        "images": {
            "default": {"sles12sp3": "cloud-sles12sp3", "rhel73": "cloud-rhel73"},
            "COMPUTE-ROLE": {"sles12sp3": "cloud-compute-sles12sp3"}
        },
        "flavors": {
            "controller2": "cloud-xlarge",
            "default_compute_flavor": "cloud-compute",
            "default_controller_flavor": "cloud-controller",
            "default_clm_flavor": "cloud-clm"
        },
        "disks": {
            "default": 20,
            "CONTROLLER-DISKS": {"vdc": 50}
        },
        "clm_service_components": ["lifecycle-manager", "lifecycle-manager-target", "ntp-server", "ntp-client"],
        "default_distro_id": "sles12sp3"
    })
}

/// Virtualization catalog matching [`input_model`]
pub fn virt_config() -> VirtConfig {
    serde_json::from_value(virt_config_document()).expect("Invalid virtualization catalog fixture")
}

/// Remove a top-level section from a document
pub fn without(mut document: Value, section: &str) -> Value {
    if let Some(sections) = document.as_object_mut() {
        sections.remove(section);
    }
    document
}
