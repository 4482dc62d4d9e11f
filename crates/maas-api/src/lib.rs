//! MAAS client and data models.
//!
//! Provides typed structures and an asynchronous client for enumerating,
//! allocating, deploying and reconfiguring machines and their networking
//! through the MAAS region API.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod args;
pub mod client;
pub mod constraints;
pub mod models;
pub mod operations;

pub use args::{
    AddFileArgs, AllocateMachineArgs, CommissionMachineArgs, CreateInterfaceArgs,
    CreateMachineNodeArgs, CreateNodeArgs, DeployMachineArgs, DevicesArgs, InterfaceSpec,
    LinkMode, LinkSubnetArgs, MachinesArgs, NodesArgs, ReleaseMachinesArgs, StorageSpec,
    UpdateInterfaceArgs,
};
pub use client::{MaasClient, MaasClientBuilder};
pub use constraints::{parse_constraint_matches, ConstraintMatches};
pub use models::{
    BlockDevice, BootResource, Device, Fabric, File, Filesystem, InterfaceHost, Link, Machine,
    NetworkInterface, Node, Partition, Space, StaticRoute, Subnet, Vlan, Zone,
};
pub use operations::{MachineOp, MachinesOp};

/// Convenient result alias sharing the `maas-core` error type.
pub type Result<T> = maas_core::Result<T>;
