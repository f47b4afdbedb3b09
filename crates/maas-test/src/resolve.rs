//! Precondition resolution: turn names from the command line into live
//! resources.
//!
//! Each resolver issues at most one listing call and filters locally. A
//! lookup that must be unique fails with [`Cause::AmbiguousResult`] on zero or
//! several matches; a named sub-resource that is missing fails with
//! [`Cause::NotFound`].
//!
//! [`Cause::AmbiguousResult`]: crate::error::Cause::AmbiguousResult
//! [`Cause::NotFound`]: crate::error::Cause::NotFound

use tracing::debug;

use crate::controller::{
    Controller, Device, DevicesArgs, File, Interface, Link, Machine, MachinesArgs,
};
use crate::error::{Annotate, WorkflowError};

/// Take the single element of a listing.
#[track_caller]
fn exactly_one<T>(
    mut items: Vec<T>,
    resource: &'static str,
    key: &str,
) -> Result<T, WorkflowError> {
    if items.len() == 1 {
        if let Some(item) = items.pop() {
            return Ok(item);
        }
    }
    Err(WorkflowError::ambiguous(resource, key, items.len()))
}

/// Resolve the one machine carrying `hostname`.
///
/// # Errors
/// `AmbiguousResult` unless exactly one machine matches; `Remote` if the
/// listing fails.
pub async fn machine_by_hostname(
    controller: &dyn Controller,
    hostname: &str,
) -> Result<Machine, WorkflowError> {
    let machines = controller
        .machines(MachinesArgs {
            hostnames: vec![hostname.to_string()],
            ..MachinesArgs::default()
        })
        .await
        .with_annotation(|| format!("listing machines with hostname {hostname:?}"))?;

    debug!(hostname, count = machines.len(), "Resolved machines by hostname");
    exactly_one(machines, "machine", hostname)
}

/// Resolve the one device carrying `hostname`.
///
/// # Errors
/// `AmbiguousResult` unless exactly one device matches; `Remote` if the
/// listing fails.
pub async fn device_by_hostname(
    controller: &dyn Controller,
    hostname: &str,
) -> Result<Device, WorkflowError> {
    let devices = controller
        .devices(DevicesArgs {
            hostnames: vec![hostname.to_string()],
            ..DevicesArgs::default()
        })
        .await
        .with_annotation(|| format!("listing devices with hostname {hostname:?}"))?;

    debug!(hostname, count = devices.len(), "Resolved devices by hostname");
    exactly_one(devices, "device", hostname)
}

/// Find the interface called `name` on a device.
///
/// # Errors
/// `NotFound` if the device has no such interface.
pub fn interface_by_name<'a>(
    device: &'a Device,
    name: &str,
) -> Result<&'a Interface, WorkflowError> {
    device
        .interface_set
        .iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| {
            WorkflowError::not_found_within("interface", name, format!("device {}", device.hostname))
        })
}

/// Find the link on `iface` whose subnet is called `subnet_name`.
///
/// Links without a subnet never match.
///
/// # Errors
/// `NotFound` if no link's subnet carries that name.
pub fn link_by_subnet_name<'a>(
    device: &Device,
    iface: &'a Interface,
    subnet_name: &str,
) -> Result<&'a Link, WorkflowError> {
    iface
        .links
        .iter()
        .find(|link| link.subnet.as_ref().is_some_and(|s| s.name == subnet_name))
        .ok_or_else(|| {
            WorkflowError::not_found_within(
                "subnet link",
                subnet_name,
                format!("{} interface {}", device.hostname, iface.name),
            )
        })
}

/// Pick the file called exactly `filename` out of a prefix listing.
///
/// # Errors
/// `NotFound` if none of the listed files has that exact name.
pub fn file_by_exact_name(files: Vec<File>, filename: &str) -> Result<File, WorkflowError> {
    files
        .into_iter()
        .find(|f| f.filename == filename)
        .ok_or_else(|| WorkflowError::not_found("file", filename))
}
