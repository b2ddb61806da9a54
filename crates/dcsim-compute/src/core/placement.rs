//! Allocation policies.

use dcsim_core::Id;

use crate::core::host_pool::HostPool;
use crate::core::placement_policies::active_servers::ActiveServers;
use crate::core::placement_policies::first_fit::FirstFit;
use crate::core::placement_policies::worst_fit::WorstFit;
use crate::core::server::Server;

/// Trait for implementations of server placement policies.
///
/// A policy is a pure function of the pending server and the current fleet
/// state: it returns the id of the preferred host among the available views
/// or `None` if no available host fits. Policies must be side-effect free and
/// must only return hosts whose view can fit the server's flavor; the
/// scheduler independently re-verifies capacity before committing.
pub trait AllocationPolicy {
    fn select_host(&self, server: &Server, pool: &HostPool) -> Option<Id>;
}

/// Resolves a policy by its configuration name.
pub fn allocation_policy_resolver(name: &str) -> Box<dyn AllocationPolicy> {
    match name {
        "ActiveServers" => Box::new(ActiveServers::new()),
        "FirstFit" => Box::new(FirstFit::new()),
        "WorstFit" => Box::new(WorstFit::new()),
        _ => panic!("Can't resolve allocation policy: {}", name),
    }
}
