//! MAAS 2.0 API response models.
//!
//! Only the fields this client reads are modeled; the controller returns
//! many more.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::controller::{
    ConstraintMatches, Device, Fabric, Interface, Link, Machine, Subnet, Vlan, Zone,
};

// ============================================================================
// Version
// ============================================================================

/// Response of `GET version/`.
#[derive(Debug, Deserialize)]
pub struct VersionResponse {
    /// API capabilities advertised by the controller.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Controller version string.
    #[serde(default)]
    pub version: String,
}

// ============================================================================
// Network
// ============================================================================

/// Zone resource.
#[derive(Debug, Deserialize)]
pub struct ZoneResource {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// VLAN resource.
#[derive(Debug, Deserialize)]
pub struct VlanResource {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vid: i64,
    #[serde(default)]
    pub mtu: i64,
    #[serde(default)]
    pub dhcp_on: bool,
}

/// Fabric resource.
#[derive(Debug, Deserialize)]
pub struct FabricResource {
    pub id: i64,
    pub name: String,
    pub class_type: Option<String>,
    #[serde(default)]
    pub vlans: Vec<VlanResource>,
}

/// Subnet resource.
#[derive(Debug, Deserialize)]
pub struct SubnetResource {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub cidr: String,
    pub vlan: Option<VlanResource>,
    pub gateway_ip: Option<String>,
    #[serde(default)]
    pub dns_servers: Vec<String>,
}

/// Interface link resource.
#[derive(Debug, Deserialize)]
pub struct LinkResource {
    pub id: i64,
    #[serde(default)]
    pub mode: String,
    pub ip_address: Option<String>,
    pub subnet: Option<SubnetResource>,
}

/// Interface resource.
#[derive(Debug, Deserialize)]
pub struct InterfaceResource {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub interface_type: String,
    #[serde(default)]
    pub mac_address: String,
    #[serde(default)]
    pub enabled: bool,
    pub vlan: Option<VlanResource>,
    #[serde(default)]
    pub links: Vec<LinkResource>,
}

// ============================================================================
// Nodes
// ============================================================================

/// Constraint matches attached to an allocation response.
#[derive(Debug, Default, Deserialize)]
pub struct ConstraintsByType {
    #[serde(default)]
    pub interfaces: BTreeMap<String, Vec<i64>>,
    #[serde(default)]
    pub storage: BTreeMap<String, Vec<i64>>,
}

/// Machine resource.
#[derive(Debug, Deserialize)]
pub struct MachineResource {
    pub system_id: String,
    pub hostname: String,
    #[serde(default)]
    pub fqdn: String,
    #[serde(default)]
    pub osystem: String,
    #[serde(default)]
    pub distro_series: String,
    #[serde(default)]
    pub power_state: String,
    #[serde(default)]
    pub status_name: String,
    pub boot_interface: Option<InterfaceResource>,
    pub constraints_by_type: Option<ConstraintsByType>,
}

/// Device resource.
#[derive(Debug, Deserialize)]
pub struct DeviceResource {
    pub system_id: String,
    pub hostname: String,
    #[serde(default)]
    pub fqdn: String,
    pub parent: Option<String>,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    #[serde(default)]
    pub interface_set: Vec<InterfaceResource>,
}

// ============================================================================
// Files
// ============================================================================

/// File resource. `content` is base64 and only present on `get_by_name`.
#[derive(Debug, Deserialize)]
pub struct FileResource {
    pub filename: String,
    #[serde(default)]
    pub anon_resource_uri: String,
    pub content: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<ZoneResource> for Zone {
    fn from(r: ZoneResource) -> Self {
        Self {
            name: r.name,
            description: r.description,
        }
    }
}

impl From<VlanResource> for Vlan {
    fn from(r: VlanResource) -> Self {
        Self {
            id: r.id,
            name: r.name,
            vid: r.vid,
            mtu: r.mtu,
            dhcp_on: r.dhcp_on,
        }
    }
}

impl From<FabricResource> for Fabric {
    fn from(r: FabricResource) -> Self {
        Self {
            id: r.id,
            name: r.name,
            class_type: r.class_type,
            vlans: r.vlans.into_iter().map(Vlan::from).collect(),
        }
    }
}

impl From<SubnetResource> for Subnet {
    fn from(r: SubnetResource) -> Self {
        Self {
            id: r.id,
            name: r.name,
            cidr: r.cidr,
            vlan: r.vlan.map(Vlan::from),
            gateway: r.gateway_ip,
            dns_servers: r.dns_servers,
        }
    }
}

impl From<LinkResource> for Link {
    fn from(r: LinkResource) -> Self {
        Self {
            id: r.id,
            mode: r.mode,
            ip_address: r.ip_address,
            subnet: r.subnet.map(Subnet::from),
        }
    }
}

impl From<InterfaceResource> for Interface {
    fn from(r: InterfaceResource) -> Self {
        Self {
            id: r.id,
            name: r.name,
            interface_type: r.interface_type,
            mac_address: r.mac_address,
            enabled: r.enabled,
            vlan: r.vlan.map(Vlan::from),
            links: r.links.into_iter().map(Link::from).collect(),
        }
    }
}

impl From<ConstraintsByType> for ConstraintMatches {
    fn from(r: ConstraintsByType) -> Self {
        Self {
            interfaces: r.interfaces,
            storage: r.storage,
        }
    }
}

impl From<MachineResource> for Machine {
    fn from(r: MachineResource) -> Self {
        Self {
            system_id: r.system_id,
            hostname: r.hostname,
            fqdn: r.fqdn,
            operating_system: r.osystem,
            distro_series: r.distro_series,
            power_state: r.power_state,
            status_name: r.status_name,
            boot_interface: r.boot_interface.map(Interface::from),
        }
    }
}

impl From<DeviceResource> for Device {
    fn from(r: DeviceResource) -> Self {
        Self {
            system_id: r.system_id,
            hostname: r.hostname,
            fqdn: r.fqdn,
            parent: r.parent,
            ip_addresses: r.ip_addresses,
            interface_set: r.interface_set.into_iter().map(Interface::from).collect(),
        }
    }
}
