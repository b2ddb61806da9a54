//! Scheduler-side mirror of the host fleet.

use std::collections::{BTreeMap, BTreeSet};

use dcsim_core::Id;

use crate::core::flavor::Flavor;
use crate::core::host::HostModel;

/// Live capacity counters for a single registered host.
///
/// Counters are updated speculatively when a server is placed, before the
/// host confirms the spawn, so that later iterations of the same dispatch
/// pass see up-to-date capacity. A failed spawn reverses the deltas.
#[derive(Clone, Debug)]
pub struct HostView {
    pub host_id: Id,
    pub cpu_total: u32,
    pub memory_total: u64,
    pub number_of_active_servers: u32,
    pub provisioned_cores: u32,
    pub available_memory: u64,
}

impl HostView {
    pub fn new(host_id: Id, model: HostModel) -> Self {
        Self {
            host_id,
            cpu_total: model.cpu_count,
            memory_total: model.memory_size,
            number_of_active_servers: 0,
            provisioned_cores: 0,
            available_memory: model.memory_size,
        }
    }

    /// Checks whether the view's remaining capacity covers the flavor.
    pub fn can_fit(&self, flavor: &Flavor) -> bool {
        self.provisioned_cores + flavor.cpu_count <= self.cpu_total
            && flavor.memory_size <= self.available_memory
    }

    pub fn allocate(&mut self, flavor: &Flavor) {
        self.number_of_active_servers += 1;
        self.provisioned_cores += flavor.cpu_count;
        self.available_memory = self.available_memory.saturating_sub(flavor.memory_size);
    }

    pub fn release(&mut self, flavor: &Flavor) {
        self.number_of_active_servers = self.number_of_active_servers.saturating_sub(1);
        self.provisioned_cores = self.provisioned_cores.saturating_sub(flavor.cpu_count);
        self.available_memory = self.memory_total.min(self.available_memory + flavor.memory_size);
    }
}

/// Views of all registered hosts plus the subset currently available for
/// placement (hosts in the UP state).
pub struct HostPool {
    views: BTreeMap<Id, HostView>,
    available: BTreeSet<Id>,
}

impl HostPool {
    pub fn new() -> Self {
        Self {
            views: BTreeMap::new(),
            available: BTreeSet::new(),
        }
    }

    /// Adds a view for the given host. Returns false if the host is already
    /// registered, in which case nothing changes.
    pub fn add_host(&mut self, host_id: Id, model: HostModel, available: bool) -> bool {
        if self.views.contains_key(&host_id) {
            return false;
        }
        self.views.insert(host_id, HostView::new(host_id, model));
        if available {
            self.available.insert(host_id);
        }
        true
    }

    pub fn remove_host(&mut self, host_id: Id) {
        self.views.remove(&host_id);
        self.available.remove(&host_id);
    }

    pub fn contains(&self, host_id: Id) -> bool {
        self.views.contains_key(&host_id)
    }

    /// Marks a registered host as available for placement.
    pub fn set_available(&mut self, host_id: Id) {
        if self.views.contains_key(&host_id) {
            self.available.insert(host_id);
        }
    }

    pub fn set_unavailable(&mut self, host_id: Id) {
        self.available.remove(&host_id);
    }

    pub fn is_available(&self, host_id: Id) -> bool {
        self.available.contains(&host_id)
    }

    pub fn view(&self, host_id: Id) -> Option<&HostView> {
        self.views.get(&host_id)
    }

    /// Iterates the views of available hosts in ascending host id order.
    pub fn available_views(&self) -> impl Iterator<Item = &HostView> {
        self.available.iter().filter_map(|id| self.views.get(id))
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn host_count(&self) -> usize {
        self.views.len()
    }

    /// Checks whether the given host is available and its view fits the flavor.
    pub fn can_fit(&self, host_id: Id, flavor: &Flavor) -> bool {
        self.available.contains(&host_id) && self.views[&host_id].can_fit(flavor)
    }

    pub fn allocate(&mut self, host_id: Id, flavor: &Flavor) {
        if let Some(view) = self.views.get_mut(&host_id) {
            view.allocate(flavor);
        }
    }

    pub fn release(&mut self, host_id: Id, flavor: &Flavor) {
        if let Some(view) = self.views.get_mut(&host_id) {
            view.release(flavor);
        }
    }
}

impl Default for HostPool {
    fn default() -> Self {
        Self::new()
    }
}
