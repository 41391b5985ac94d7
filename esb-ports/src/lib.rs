//! Per-environment network allocation.
//!
//! Every value here is a pure function of the environment name (and the project's
//! brand), so differently named environments coexist on one host without any shared
//! allocation registry.

pub mod allocation;
pub mod ports;
pub mod subnet;

pub use allocation::{
    external_subnet_index, hash_mod, runtime_subnet_index, NetworkPlan, DEFAULT_ENV,
};
pub use ports::{LogicalPort, PortTable};
pub use subnet::Subnet;
