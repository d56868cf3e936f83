//! The four discovery services, each a pure function over a [`Registry`](crate::registry::Registry)
//! snapshot plus request/config inputs — orchestration (locking, scheduling) lives in [`crate::server`].

pub mod find_servers;
pub mod get_endpoints;
pub mod register;

pub use find_servers::find_servers;
pub use get_endpoints::get_endpoints;
pub use register::{register_server, register_server2, MdnsUpdater, RegisterCallback};
