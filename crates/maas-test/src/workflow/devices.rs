//! Device workflows: create, delete, container children and subnet unlinks.

use async_trait::async_trait;
use tracing::debug;

use super::{exact_args, Arity, Session, Workflow};
use crate::controller::{CreateDeviceArgs, CreateMachineDeviceArgs, DevicesArgs};
use crate::error::{Annotate, WorkflowError};
use crate::{mac, resolve};

/// Interface label given to container devices.
pub const CONTAINER_INTERFACE: &str = "eth1";

/// `create-device [hostname] [macs...]`: create a device, under the configured
/// parent when one is set.
pub struct CreateDevice;

#[async_trait]
impl Workflow for CreateDevice {
    fn action(&self) -> &'static str {
        "create-device"
    }

    fn arity(&self) -> Arity {
        Arity::Any
    }

    fn usage(&self) -> &'static str {
        "create-device [hostname] [macs...]"
    }

    async fn execute(&self, session: &Session<'_>, args: &[String]) -> Result<(), WorkflowError> {
        let mut create = CreateDeviceArgs {
            parent: session.options.parent.clone(),
            ..CreateDeviceArgs::default()
        };
        if let Some((hostname, macs)) = args.split_first() {
            create.hostname = Some(hostname.clone());
            create.mac_addresses = macs.to_vec();
        }

        let device = session
            .controller
            .create_device(create)
            .await
            .annotate("creating device")?;

        session.say(format!("Device created: {}", device.system_id));
        Ok(())
    }
}

/// `delete-devices <hostname>`: delete every device of a machine, in listing
/// order, stopping at the first failure.
pub struct DeleteDevices;

#[async_trait]
impl Workflow for DeleteDevices {
    fn action(&self) -> &'static str {
        "delete-devices"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn usage(&self) -> &'static str {
        "delete-devices <machine hostname>"
    }

    async fn execute(&self, session: &Session<'_>, args: &[String]) -> Result<(), WorkflowError> {
        let hostname = args
            .first()
            .ok_or_else(|| WorkflowError::validation("expected <machine hostname>"))?;

        let machine = resolve::machine_by_hostname(session.controller, hostname)
            .await
            .annotate("resolving machine")?;

        let devices = session
            .controller
            .machine_devices(&machine.system_id, DevicesArgs::default())
            .await
            .with_annotation(|| format!("listing devices of {hostname}"))?;
        debug!(machine = %machine.system_id, count = devices.len(), "Deleting devices");

        for device in devices {
            session
                .controller
                .delete_device(&device.system_id)
                .await
                .with_annotation(|| format!("deleting device {:?}", device.hostname))?;
            session.say(format!("deleted device {:?}", device.hostname));
        }
        Ok(())
    }
}

/// `container [hostname]`: create a child device of the configured parent on
/// the parent's boot subnet, with a random MAC address.
pub struct Container;

#[async_trait]
impl Workflow for Container {
    fn action(&self) -> &'static str {
        "container"
    }

    fn arity(&self) -> Arity {
        Arity::AtMost(1)
    }

    fn usage(&self) -> &'static str {
        "--parent <hostname> container [hostname]"
    }

    async fn execute(&self, session: &Session<'_>, args: &[String]) -> Result<(), WorkflowError> {
        let parent = session
            .options
            .parent
            .as_deref()
            .ok_or_else(|| WorkflowError::validation("missing parent: set --parent"))?;

        let machine = resolve::machine_by_hostname(session.controller, parent)
            .await
            .annotate("resolving parent machine")?;

        let boot = machine
            .boot_interface
            .as_ref()
            .ok_or_else(|| WorkflowError::not_found("boot interface of machine", parent))?;
        let link = boot.links.first().ok_or_else(|| {
            WorkflowError::not_found_within("link on boot interface", &boot.name, parent)
        })?;
        let subnet = link.subnet.as_ref().ok_or_else(|| {
            WorkflowError::not_found_within(
                "subnet on first link of boot interface",
                &boot.name,
                parent,
            )
        })?;

        let mac_address = mac::random_mac_address();
        debug!(parent, mac = %mac_address, subnet = %subnet.name, "Creating container device");

        let device = session
            .controller
            .create_machine_device(
                &machine.system_id,
                CreateMachineDeviceArgs {
                    hostname: args.first().cloned(),
                    interface_name: CONTAINER_INTERFACE.to_string(),
                    mac_address: mac_address.clone(),
                    subnet: subnet.clone(),
                },
            )
            .await
            .with_annotation(|| format!("creating device on {parent} with MAC {mac_address}"))?;

        session.say(format!("Device {:?} created", device.hostname));
        Ok(())
    }
}

/// `unlink-subnet <device> <interface> <subnet>`: remove one subnet link
/// from a device interface.
pub struct UnlinkSubnet;

#[async_trait]
impl Workflow for UnlinkSubnet {
    fn action(&self) -> &'static str {
        "unlink-subnet"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(3)
    }

    fn usage(&self) -> &'static str {
        "unlink-subnet <device name> <interface name> <subnet name>"
    }

    async fn execute(&self, session: &Session<'_>, args: &[String]) -> Result<(), WorkflowError> {
        let [device_name, interface_name, subnet_name] = exact_args::<3>(args)?;

        let device = resolve::device_by_hostname(session.controller, device_name)
            .await
            .with_annotation(|| format!("resolving device {device_name:?}"))?;
        let iface = resolve::interface_by_name(&device, interface_name)
            .with_annotation(|| format!("resolving interface {interface_name:?}"))?;
        let link = resolve::link_by_subnet_name(&device, iface, subnet_name)
            .with_annotation(|| format!("resolving subnet {subnet_name:?}"))?;

        session
            .controller
            .unlink_subnet(&device.system_id, iface.id, link.id)
            .await
            .with_annotation(|| format!("unlinking link {} from interface {}", link.id, iface.id))?;

        session.say(format!(
            "subnet {subnet_name:?} unlinked from {} interface {interface_name}",
            device.hostname
        ));
        Ok(())
    }
}
