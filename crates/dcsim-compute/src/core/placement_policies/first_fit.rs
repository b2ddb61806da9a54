//! First Fit policy.

use dcsim_core::Id;

use crate::core::host_pool::HostPool;
use crate::core::placement::AllocationPolicy;
use crate::core::server::Server;

/// Uses the first suitable host in host id order.
#[derive(Default)]
pub struct FirstFit;

impl FirstFit {
    pub fn new() -> Self {
        Default::default()
    }
}

impl AllocationPolicy for FirstFit {
    fn select_host(&self, server: &Server, pool: &HostPool) -> Option<Id> {
        pool.available_views()
            .find(|view| view.can_fit(&server.flavor))
            .map(|view| view.host_id)
    }
}
