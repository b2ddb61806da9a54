//! Error taxonomy of the compute service.

use thiserror::Error;

use crate::core::common::ResourceId;

/// Errors surfaced synchronously to callers of the service and client APIs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComputeError {
    #[error("client is closed")]
    ClientClosed,
    #[error("compute service is closed")]
    ServiceClosed,
    #[error("flavor {0:#x} is not registered")]
    UnknownFlavor(ResourceId),
    #[error("image {0:#x} is not registered")]
    UnknownImage(ResourceId),
    #[error("server {0:#x} is not registered")]
    UnknownServer(ResourceId),
    #[error("server {0:#x} has no pending scheduling request")]
    NoPendingRequest(ResourceId),
    #[error("flavor must provide at least one CPU")]
    InvalidCpuCount,
}

/// Host-side failure to start a guest. The host also announces the failure to
/// its listeners as a terminal server state, so the scheduler only has to
/// revert its speculative reservation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    #[error("host is down")]
    HostDown,
    #[error("host has insufficient free capacity")]
    InsufficientCapacity,
}
