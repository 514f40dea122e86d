//! PwnBox container lifecycle
//!
//! - `ports`: forwarding spec parsing
//! - `spec`: translation of the config into runtime parameters
//! - `manager`: create/start/kill/remove of the named container
//! - `x11`: host-side display access

pub mod manager;
pub mod ports;
pub mod spec;
pub mod x11;

pub use manager::{ContainerManager, ContainerState};
pub use ports::{parse_port_mappings, PortMapping};
pub use spec::{BindMount, ContainerSpec, NetworkMode, Platform};
