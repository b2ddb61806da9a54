//! Active Servers policy.

use dcsim_core::Id;

use crate::core::host_pool::HostPool;
use crate::core::placement::AllocationPolicy;
use crate::core::server::Server;

/// Prefers the suitable host with the most active servers, packing load onto
/// already-busy hosts. Ties are broken by the lowest host id.
#[derive(Default)]
pub struct ActiveServers;

impl ActiveServers {
    pub fn new() -> Self {
        Default::default()
    }
}

impl AllocationPolicy for ActiveServers {
    fn select_host(&self, server: &Server, pool: &HostPool) -> Option<Id> {
        let mut result: Option<Id> = None;
        let mut max_active: u32 = 0;

        for view in pool.available_views() {
            if view.can_fit(&server.flavor)
                && (result.is_none() || view.number_of_active_servers > max_active)
            {
                max_active = view.number_of_active_servers;
                result = Some(view.host_id);
            }
        }
        result
    }
}
