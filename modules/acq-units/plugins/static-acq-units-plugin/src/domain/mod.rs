//! Domain layer for the static acquisition units plugin.

mod client;
pub mod query;
pub mod service;

pub use service::Service;
