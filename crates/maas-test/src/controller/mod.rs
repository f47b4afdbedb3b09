//! Cluster controller abstraction and its MAAS 2.0 implementation.

pub mod maas;
mod traits;

pub use traits::{
    AddFileArgs, AllocateMachineArgs, ConstraintMatches, Controller, ControllerError,
    CreateDeviceArgs, CreateMachineDeviceArgs, Device, DevicesArgs, Fabric, File, FileSource,
    Interface, Link, Machine, MachinesArgs, ReleaseMachinesArgs, StartArgs, Subnet, Vlan, Zone,
};

#[cfg(test)]
pub use traits::MockController;
