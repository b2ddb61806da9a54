pub mod client;
pub mod common;
pub mod config;
pub mod error;
pub mod events;
pub mod flavor;
pub mod host;
pub mod host_pool;
pub mod image;
pub mod metrics;
pub mod placement;
pub mod placement_policies;
pub mod queue;
pub mod server;
pub mod service;
