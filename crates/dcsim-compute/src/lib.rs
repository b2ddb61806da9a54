//! Compute scheduling core of the dcsim datacenter simulator.
//!
//! The crate models a cloud compute service: clients mint flavors, images and
//! servers, servers are queued for placement, and a quantum-aligned dispatch
//! loop places them onto hosts under a pluggable allocation policy while
//! keeping live capacity accounting per host.

pub mod core;
pub mod simulation;
