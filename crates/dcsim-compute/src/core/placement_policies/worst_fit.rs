//! Worst Fit policy.

use dcsim_core::Id;

use crate::core::host_pool::HostPool;
use crate::core::placement::AllocationPolicy;
use crate::core::server::Server;

/// Uses the suitable host with the most unprovisioned cores, spreading load
/// across the fleet.
#[derive(Default)]
pub struct WorstFit;

impl WorstFit {
    pub fn new() -> Self {
        Default::default()
    }
}

impl AllocationPolicy for WorstFit {
    fn select_host(&self, server: &Server, pool: &HostPool) -> Option<Id> {
        let mut result: Option<Id> = None;
        let mut max_free_cores: u32 = 0;

        for view in pool.available_views() {
            let free_cores = view.cpu_total - view.provisioned_cores;
            if view.can_fit(&server.flavor) && (result.is_none() || free_cores > max_free_cores) {
                max_free_cores = free_cores;
                result = Some(view.host_id);
            }
        }
        result
    }
}
