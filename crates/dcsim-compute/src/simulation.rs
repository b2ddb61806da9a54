//! The main entry point for simulation configuration and execution.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use sugars::{rc, refcell};

use dcsim_core::context::SimulationContext;
use dcsim_core::simulation::Simulation;
use dcsim_core::Id;

use crate::core::client::ComputeClient;
use crate::core::config::ComputeConfig;
use crate::core::events::host::SetHostState;
use crate::core::host::{HostState, SimHost};
use crate::core::metrics::MetricsSubscription;
use crate::core::placement::allocation_policy_resolver;
use crate::core::service::ComputeService;

/// Wires the simulation kernel, the compute service and the host fleet, and
/// provides convenient access to all of them.
pub struct ComputeSimulation {
    service: Rc<RefCell<ComputeService>>,
    hosts: BTreeMap<Id, Rc<RefCell<SimHost>>>,
    sim: Simulation,
    ctx: SimulationContext,
    config: Rc<ComputeConfig>,
}

impl ComputeSimulation {
    /// Creates a simulation with the specified config.
    pub fn new(mut sim: Simulation, config: ComputeConfig) -> Self {
        let policy = allocation_policy_resolver(&config.allocation_policy);
        let service_ctx = sim.create_context("compute");
        let service = rc!(refcell!(ComputeService::new(
            policy,
            config.scheduling_quantum,
            config.id_seed,
            service_ctx,
        )));
        sim.add_handler("compute", service.clone());

        let ctx = sim.create_context("simulation");
        let mut this = Self {
            service,
            hosts: BTreeMap::new(),
            sim,
            ctx,
            config: rc!(config),
        };

        // Add hosts from config
        for host_config in this.config.hosts.clone() {
            let count = host_config.count.unwrap_or(1);
            if count == 1 {
                let name = host_config.name.unwrap();
                this.add_host(&name, host_config.cpu_count, host_config.memory_size);
            } else {
                let prefix = host_config.name_prefix.unwrap();
                for i in 0..count {
                    let name = format!("{}{}", prefix, i + 1);
                    this.add_host(&name, host_config.cpu_count, host_config.memory_size);
                }
            }
        }

        this
    }

    /// Creates a new host with the specified name and capacity, registers it
    /// with the compute service and returns the host id.
    pub fn add_host(&mut self, name: &str, cpu_count: u32, memory_size: u64) -> Id {
        let host = rc!(refcell!(SimHost::new(cpu_count, memory_size, self.sim.create_context(name))));
        let id = self.sim.add_handler(name, host.clone());
        self.hosts.insert(id, host.clone());
        self.service.borrow_mut().add_host(host);
        id
    }

    /// Transitions a host between UP and DOWN at the current simulated time.
    pub fn set_host_state(&mut self, host_id: Id, state: HostState) {
        self.hosts[&host_id].borrow_mut().set_state(state);
    }

    /// Schedules a host state transition `delay` milliseconds into the
    /// simulated future.
    pub fn set_host_state_after(&mut self, host_id: Id, state: HostState, delay: f64) {
        self.ctx.emit(SetHostState { state }, host_id, delay);
    }

    /// Returns the reference to the host with the given id.
    pub fn host(&self, host_id: Id) -> Rc<RefCell<SimHost>> {
        self.hosts[&host_id].clone()
    }

    /// Returns the reference to the compute service.
    pub fn service(&self) -> Rc<RefCell<ComputeService>> {
        self.service.clone()
    }

    /// Opens a new client session with the compute service.
    pub fn new_client(&self) -> ComputeClient {
        ComputeClient::new(self.service.clone())
    }

    /// Subscribes to the service's metrics stream.
    pub fn metrics(&self) -> MetricsSubscription {
        self.service.borrow_mut().subscribe()
    }

    /// Returns the simulation config.
    pub fn config(&self) -> Rc<ComputeConfig> {
        self.config.clone()
    }

    /// Performs the specified number of steps through the simulation.
    pub fn steps(&mut self, step_count: u64) -> bool {
        self.sim.steps(step_count)
    }

    /// Steps through the simulation with the given duration limit.
    pub fn step_for_duration(&mut self, duration: f64) -> bool {
        self.sim.step_for_duration(duration)
    }

    /// Steps through the simulation until there are no pending events left.
    pub fn step_until_no_events(&mut self) {
        self.sim.step_until_no_events()
    }

    /// Returns the current simulation time.
    pub fn current_time(&self) -> f64 {
        self.sim.time()
    }

    /// Returns the total number of created events.
    pub fn event_count(&self) -> u64 {
        self.sim.event_count()
    }

    /// Returns the identifier of a component by its name.
    pub fn lookup_id(&self, name: &str) -> Id {
        self.sim.lookup_id(name)
    }
}
