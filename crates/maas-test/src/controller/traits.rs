//! Controller trait and the resource types it hands out.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Errors that can occur while talking to the controller.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The controller rejected the request parameters (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The credentials do not allow this operation (401/403).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The requested resource does not exist (404).
    #[error("no match: {0}")]
    NoMatch(String),

    /// The operation conflicts with the resource's current state (409).
    #[error("cannot complete: {0}")]
    CannotComplete(String),

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The controller answered with something this client cannot use.
    #[error("unexpected response: {0}")]
    Unexpected(String),

    /// The controller does not speak the 2.0 API.
    #[error("unsupported API version: missing capability {0:?}")]
    UnsupportedVersion(String),

    /// Invalid configuration or arguments.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ControllerError {
    /// Short name of the error variant, used in diagnostics.
    #[must_use]
    pub fn variant(&self) -> &'static str {
        match self {
            Self::Http(_) => "Http",
            Self::BadRequest(_) => "BadRequest",
            Self::PermissionDenied(_) => "PermissionDenied",
            Self::NoMatch(_) => "NoMatch",
            Self::CannotComplete(_) => "CannotComplete",
            Self::Api { .. } => "Api",
            Self::Unexpected(_) => "Unexpected",
            Self::UnsupportedVersion(_) => "UnsupportedVersion",
            Self::Config(_) => "Config",
            Self::Url(_) => "Url",
            Self::Serialization(_) => "Serialization",
        }
    }
}

/// A physical availability zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zone {
    /// Zone name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

/// A VLAN on a fabric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vlan {
    /// Database ID.
    pub id: i64,
    /// VLAN name.
    pub name: String,
    /// 802.1Q VLAN ID.
    pub vid: i64,
    /// MTU.
    pub mtu: i64,
    /// Whether the controller serves DHCP on this VLAN.
    pub dhcp_on: bool,
}

/// A switching fabric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fabric {
    /// Database ID.
    pub id: i64,
    /// Fabric name.
    pub name: String,
    /// Optional class type.
    pub class_type: Option<String>,
    /// VLANs on the fabric.
    pub vlans: Vec<Vlan>,
}

/// An IP subnet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subnet {
    /// Database ID.
    pub id: i64,
    /// Subnet name.
    pub name: String,
    /// CIDR notation (e.g. `10.0.0.0/24`).
    pub cidr: String,
    /// VLAN the subnet lives on.
    pub vlan: Option<Vlan>,
    /// Gateway address.
    pub gateway: Option<String>,
    /// DNS servers.
    pub dns_servers: Vec<String>,
}

/// The association of an interface with a subnet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    /// Database ID.
    pub id: i64,
    /// Link mode (`auto`, `dhcp`, `static`, `link_up`).
    pub mode: String,
    /// Assigned address, if any.
    pub ip_address: Option<String>,
    /// Linked subnet. `None` for unconfigured links.
    pub subnet: Option<Subnet>,
}

/// A network interface on a machine or device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interface {
    /// Database ID.
    pub id: i64,
    /// Interface name (e.g. `eth0`).
    pub name: String,
    /// Interface type (`physical`, `bond`, `vlan`, ...).
    pub interface_type: String,
    /// MAC address.
    pub mac_address: String,
    /// Whether the interface is enabled.
    pub enabled: bool,
    /// VLAN the interface is attached to.
    pub vlan: Option<Vlan>,
    /// Subnet links, in controller order.
    pub links: Vec<Link>,
}

/// A bare metal machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Machine {
    /// System identifier.
    pub system_id: String,
    /// Hostname.
    pub hostname: String,
    /// Fully qualified domain name.
    pub fqdn: String,
    /// Operating system.
    pub operating_system: String,
    /// Distro series.
    pub distro_series: String,
    /// Power state (`on`, `off`, `unknown`, ...).
    pub power_state: String,
    /// Allocation/deployment status name.
    pub status_name: String,
    /// Interface the machine PXE boots from.
    pub boot_interface: Option<Interface>,
}

/// A device, standalone or the child of a machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Device {
    /// System identifier.
    pub system_id: String,
    /// Hostname.
    pub hostname: String,
    /// Fully qualified domain name.
    pub fqdn: String,
    /// Parent machine system identifier.
    pub parent: Option<String>,
    /// Assigned IP addresses.
    pub ip_addresses: Vec<String>,
    /// Network interfaces.
    pub interface_set: Vec<Interface>,
}

/// A file in the controller's file store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct File {
    /// Filename, unique within the store.
    pub filename: String,
    /// URL the file can be fetched from without credentials.
    pub anonymous_url: String,
    /// Content, when the controller returned it inline.
    pub content: Option<Vec<u8>>,
}

/// What the controller matched the allocation constraints against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintMatches {
    /// Interface constraint label to matched interface IDs.
    pub interfaces: BTreeMap<String, Vec<i64>>,
    /// Storage constraint label to matched block device IDs.
    pub storage: BTreeMap<String, Vec<i64>>,
}

/// Machine listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachinesArgs {
    /// Only machines with these system IDs.
    pub system_ids: Vec<String>,
    /// Only machines with these hostnames.
    pub hostnames: Vec<String>,
}

/// Device listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevicesArgs {
    /// Only devices with these hostnames.
    pub hostnames: Vec<String>,
    /// Only devices with these MAC addresses.
    pub mac_addresses: Vec<String>,
    /// Only devices with these system IDs.
    pub system_ids: Vec<String>,
}

/// Allocation constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocateMachineArgs {
    /// Hostname of the machine to allocate.
    pub hostname: Option<String>,
    /// Zone to allocate from.
    pub zone: Option<String>,
    /// Tags the machine must carry.
    pub tags: Vec<String>,
}

/// Bulk release request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseMachinesArgs {
    /// Machines to release.
    pub system_ids: Vec<String>,
    /// Comment recorded in the machine event log.
    pub comment: Option<String>,
}

/// Deployment request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartArgs {
    /// Distro series to deploy (e.g. `xenial`).
    pub distro_series: String,
    /// Comment recorded in the machine event log.
    pub comment: Option<String>,
}

/// Standalone device creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateDeviceArgs {
    /// Hostname; the controller picks one when absent.
    pub hostname: Option<String>,
    /// MAC addresses of the device's interfaces.
    pub mac_addresses: Vec<String>,
    /// Parent machine hostname or system ID.
    pub parent: Option<String>,
}

/// Child device creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateMachineDeviceArgs {
    /// Hostname; the controller picks one when absent.
    pub hostname: Option<String>,
    /// Name the device's single interface should carry.
    pub interface_name: String,
    /// MAC address of that interface.
    pub mac_address: String,
    /// Subnet the interface is linked to in static mode.
    pub subnet: Subnet,
}

/// Content of a file upload.
pub enum FileSource {
    /// Fully buffered content.
    Bytes(Vec<u8>),
    /// Streamed content of a declared length.
    Reader {
        /// Content stream.
        reader: Box<dyn AsyncRead + Send + Sync + Unpin>,
        /// Number of bytes the reader yields.
        length: u64,
    },
}

impl std::fmt::Debug for FileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(content) => write!(f, "Bytes({} bytes)", content.len()),
            Self::Reader { length, .. } => write!(f, "Reader({length} bytes)"),
        }
    }
}

/// File upload request.
#[derive(Debug)]
pub struct AddFileArgs {
    /// Filename to store the content under.
    pub filename: String,
    /// Content to upload.
    pub source: FileSource,
}

impl AddFileArgs {
    /// Check the request before anything is sent.
    ///
    /// # Errors
    /// Returns [`ControllerError::Config`] for an empty filename or one that
    /// contains a path separator.
    pub fn validate(&self) -> Result<(), ControllerError> {
        if self.filename.is_empty() {
            return Err(ControllerError::Config("missing filename".to_string()));
        }
        if self.filename.contains('/') {
            return Err(ControllerError::Config(format!(
                "filename {:?} must not contain '/'",
                self.filename
            )));
        }
        Ok(())
    }
}

/// Operations the workflows need from the cluster controller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Controller: Send + Sync {
    /// List physical zones.
    async fn zones(&self) -> Result<Vec<Zone>, ControllerError>;

    /// List fabrics with their VLANs.
    async fn fabrics(&self) -> Result<Vec<Fabric>, ControllerError>;

    /// List machines matching the filter.
    async fn machines(&self, args: MachinesArgs) -> Result<Vec<Machine>, ControllerError>;

    /// Allocate a machine matching the constraints.
    async fn allocate_machine(
        &self,
        args: AllocateMachineArgs,
    ) -> Result<(Machine, ConstraintMatches), ControllerError>;

    /// Release machines in one request.
    async fn release_machines(&self, args: ReleaseMachinesArgs) -> Result<(), ControllerError>;

    /// Deploy an allocated machine.
    async fn start_machine(&self, system_id: &str, args: StartArgs)
        -> Result<(), ControllerError>;

    /// List the devices whose parent is the given machine.
    async fn machine_devices(
        &self,
        system_id: &str,
        args: DevicesArgs,
    ) -> Result<Vec<Device>, ControllerError>;

    /// Create a device under a machine with one named, linked interface.
    async fn create_machine_device(
        &self,
        system_id: &str,
        args: CreateMachineDeviceArgs,
    ) -> Result<Device, ControllerError>;

    /// List devices matching the filter.
    async fn devices(&self, args: DevicesArgs) -> Result<Vec<Device>, ControllerError>;

    /// Create a device.
    async fn create_device(&self, args: CreateDeviceArgs) -> Result<Device, ControllerError>;

    /// Delete a device.
    async fn delete_device(&self, system_id: &str) -> Result<(), ControllerError>;

    /// Remove one link from a device interface.
    async fn unlink_subnet(
        &self,
        system_id: &str,
        interface_id: i64,
        link_id: i64,
    ) -> Result<(), ControllerError>;

    /// List files whose name starts with `prefix`.
    async fn files(&self, prefix: &str) -> Result<Vec<File>, ControllerError>;

    /// Fetch a single file by exact name.
    async fn get_file(&self, filename: &str) -> Result<File, ControllerError>;

    /// Upload a file.
    async fn add_file(&self, args: AddFileArgs) -> Result<(), ControllerError>;

    /// Read a file's full content.
    async fn read_file(&self, file: &File) -> Result<Vec<u8>, ControllerError>;

    /// Delete a file.
    async fn delete_file(&self, filename: &str) -> Result<(), ControllerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_file_args_validation() {
        let ok = AddFileArgs {
            filename: "cloud-init.yaml".to_string(),
            source: FileSource::Bytes(Vec::new()),
        };
        assert!(ok.validate().is_ok());

        let empty = AddFileArgs {
            filename: String::new(),
            source: FileSource::Bytes(b"x".to_vec()),
        };
        assert!(matches!(empty.validate(), Err(ControllerError::Config(_))));

        let nested = AddFileArgs {
            filename: "a/b".to_string(),
            source: FileSource::Bytes(Vec::new()),
        };
        assert!(matches!(nested.validate(), Err(ControllerError::Config(_))));
    }

    #[test]
    fn test_file_source_debug_hides_content() {
        let source = FileSource::Reader {
            reader: Box::new(tokio::io::empty()),
            length: 42,
        };
        assert_eq!(format!("{source:?}"), "Reader(42 bytes)");
        assert_eq!(
            format!("{:?}", FileSource::Bytes(vec![1, 2, 3])),
            "Bytes(3 bytes)"
        );
    }

    #[test]
    fn test_controller_error_variant() {
        assert_eq!(ControllerError::NoMatch("x".into()).variant(), "NoMatch");
        assert_eq!(
            ControllerError::Api {
                status: 500,
                message: "boom".into()
            }
            .variant(),
            "Api"
        );
    }
}
