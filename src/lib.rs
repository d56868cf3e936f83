//! Discovery subsystem for an OPC-UA stack: `FindServers`, `GetEndpoints`,
//! `RegisterServer`/`RegisterServer2`, the periodic self-registration
//! scheduler, and the client-side calls that drive a remote LDS.
//!
//! The wire codec, transport, and secure channel are external collaborators;
//! this crate works with already-decoded request/response values ([`types`])
//! and exposes trait seams ([`services::register::MdnsUpdater`],
//! [`client::Transport`]) where a real stack plugs in.

pub mod client;
pub mod composer;
pub mod config;
pub mod error;
pub mod registry;
pub mod scheduler;
pub mod server;
pub mod services;
pub mod types;

pub use config::DiscoveryConfig;
pub use error::StatusCode;
pub use registry::Registry;
pub use server::DiscoveryServer;
