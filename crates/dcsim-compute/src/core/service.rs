//! The compute service: registries, scheduling queue, quantum timer,
//! dispatch loop and host listener.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;

use serde_json::Value;
use sugars::{rc, refcell};

use dcsim_core::context::SimulationContext;
use dcsim_core::event::{Event, EventId};
use dcsim_core::handler::EventHandler;
use dcsim_core::{log_debug, log_trace, log_warn, route, Id};

use crate::core::common::{IdGenerator, ResourceId};
use crate::core::error::ComputeError;
use crate::core::events::host::{HostStateChanged, ServerStateChanged};
use crate::core::events::service::{ScheduleCycle, ServerSubmission};
use crate::core::flavor::Flavor;
use crate::core::host::{Host, HostState};
use crate::core::host_pool::{HostPool, HostView};
use crate::core::image::Image;
use crate::core::metrics::{MetricsAvailable, MetricsBroadcast, MetricsSubscription, ServiceCounters};
use crate::core::placement::AllocationPolicy;
use crate::core::queue::SchedulingRequest;
use crate::core::server::{Server, ServerState};

/// Accepts server provisioning requests, tracks the host fleet through live
/// capacity views and dispatches queued servers at fixed scheduling quanta
/// under the configured allocation policy.
///
/// The service exclusively owns every registry and all counters; hosts are
/// shared by reference and talk back through listener events delivered on the
/// simulation executor.
pub struct ComputeService {
    closed: bool,
    flavors: BTreeMap<ResourceId, Rc<Flavor>>,
    images: BTreeMap<ResourceId, Rc<Image>>,
    servers: BTreeMap<ResourceId, Rc<RefCell<Server>>>,
    hosts: BTreeMap<Id, Rc<RefCell<dyn Host>>>,
    pool: HostPool,
    queue: VecDeque<Rc<SchedulingRequest>>,
    active_servers: BTreeMap<ResourceId, Id>,
    counters: ServiceCounters,
    // largest capacity seen across all hosts ever registered, used to tell
    // structurally unschedulable servers from transient fleet saturation
    max_cores: u32,
    max_memory: u64,
    cycle_event: Option<EventId>,
    scheduling_quantum: f64,
    policy: Box<dyn AllocationPolicy>,
    broadcast: MetricsBroadcast,
    id_gen: IdGenerator,
    ctx: SimulationContext,
}

impl ComputeService {
    pub fn new(
        policy: Box<dyn AllocationPolicy>,
        scheduling_quantum: f64,
        id_seed: u64,
        ctx: SimulationContext,
    ) -> Self {
        assert!(scheduling_quantum > 0., "scheduling quantum must be positive");
        Self {
            closed: false,
            flavors: BTreeMap::new(),
            images: BTreeMap::new(),
            servers: BTreeMap::new(),
            hosts: BTreeMap::new(),
            pool: HostPool::new(),
            queue: VecDeque::new(),
            active_servers: BTreeMap::new(),
            counters: ServiceCounters::default(),
            max_cores: 0,
            max_memory: 0,
            cycle_event: None,
            scheduling_quantum,
            policy,
            broadcast: MetricsBroadcast::new(),
            id_gen: IdGenerator::new(id_seed),
            ctx,
        }
    }

    /// Returns the service's component id, the one hosts should notify.
    pub fn id(&self) -> Id {
        self.ctx.id()
    }

    // FLEET ///////////////////////////////////////////////////////////////////////////////////////

    /// Registers a host with the service and starts listening to its events.
    /// Registering the same host twice is a no-op.
    pub fn add_host(&mut self, host: Rc<RefCell<dyn Host>>) {
        if self.closed {
            return;
        }
        let (host_id, model, state) = {
            let host = host.borrow();
            (host.id(), host.model(), host.state())
        };
        if self.hosts.contains_key(&host_id) {
            return;
        }
        host.borrow_mut().add_listener(self.ctx.id());
        self.hosts.insert(host_id, host);
        self.pool.add_host(host_id, model, state == HostState::Up);
        self.max_cores = self.max_cores.max(model.cpu_count);
        self.max_memory = self.max_memory.max(model.memory_size);
        log_debug!(
            self.ctx,
            "registered host #{} with {} cores and {} bytes of memory",
            host_id,
            model.cpu_count,
            model.memory_size
        );
        self.publish_metrics();
        self.request_cycle();
    }

    /// Unregisters a host. Guests still running on it keep running; their
    /// terminal events settle the counters but release no view capacity.
    pub fn remove_host(&mut self, host_id: Id) {
        if let Some(host) = self.hosts.remove(&host_id) {
            host.borrow_mut().remove_listener(self.ctx.id());
            self.pool.remove_host(host_id);
            log_debug!(self.ctx, "unregistered host #{}", host_id);
            self.publish_metrics();
        }
    }

    pub fn hosts(&self) -> Vec<Id> {
        self.hosts.keys().cloned().collect()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn host_view(&self, host_id: Id) -> Option<HostView> {
        self.pool.view(host_id).cloned()
    }

    // LIFECYCLE ///////////////////////////////////////////////////////////////////////////////////

    /// Subscribes to the stream of metrics snapshots.
    pub fn subscribe(&mut self) -> MetricsSubscription {
        self.broadcast.subscribe()
    }

    pub fn counters(&self) -> ServiceCounters {
        self.counters
    }

    /// Closes the service: pending timer state is dropped, in-flight spawns
    /// are abandoned and all subsequent events and operations are rejected.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(event_id) = self.cycle_event.take() {
            self.ctx.cancel_event(event_id);
        }
        log_debug!(self.ctx, "compute service closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), ComputeError> {
        if self.closed {
            return Err(ComputeError::ServiceClosed);
        }
        Ok(())
    }

    // REGISTRIES //////////////////////////////////////////////////////////////////////////////////

    pub(crate) fn create_flavor(
        &mut self,
        name: &str,
        cpu_count: u32,
        memory_size: u64,
        labels: HashMap<String, String>,
        meta: HashMap<String, Value>,
    ) -> Result<Rc<Flavor>, ComputeError> {
        self.ensure_open()?;
        if cpu_count == 0 {
            return Err(ComputeError::InvalidCpuCount);
        }
        let id = self.id_gen.generate(self.ctx.time());
        let flavor = Rc::new(Flavor {
            id,
            name: name.to_owned(),
            cpu_count,
            memory_size,
            labels,
            meta,
        });
        self.flavors.insert(id, flavor.clone());
        Ok(flavor)
    }

    pub fn find_flavor(&self, id: ResourceId) -> Option<Rc<Flavor>> {
        self.flavors.get(&id).cloned()
    }

    pub fn flavors(&self) -> Vec<Rc<Flavor>> {
        self.flavors.values().cloned().collect()
    }

    pub(crate) fn delete_flavor(&mut self, id: ResourceId) -> Result<(), ComputeError> {
        self.ensure_open()?;
        self.flavors.remove(&id).map(|_| ()).ok_or(ComputeError::UnknownFlavor(id))
    }

    pub(crate) fn create_image(
        &mut self,
        name: &str,
        labels: HashMap<String, String>,
        meta: HashMap<String, Value>,
    ) -> Result<Rc<Image>, ComputeError> {
        self.ensure_open()?;
        let id = self.id_gen.generate(self.ctx.time());
        let image = Rc::new(Image {
            id,
            name: name.to_owned(),
            labels,
            meta,
        });
        self.images.insert(id, image.clone());
        Ok(image)
    }

    pub fn find_image(&self, id: ResourceId) -> Option<Rc<Image>> {
        self.images.get(&id).cloned()
    }

    pub fn images(&self) -> Vec<Rc<Image>> {
        self.images.values().cloned().collect()
    }

    pub(crate) fn delete_image(&mut self, id: ResourceId) -> Result<(), ComputeError> {
        self.ensure_open()?;
        self.images.remove(&id).map(|_| ()).ok_or(ComputeError::UnknownImage(id))
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn create_server(
        &mut self,
        name: &str,
        image_id: ResourceId,
        flavor_id: ResourceId,
        labels: HashMap<String, String>,
        meta: HashMap<String, Value>,
        expected_lifetime: Option<f64>,
        start: bool,
    ) -> Result<Rc<RefCell<Server>>, ComputeError> {
        self.ensure_open()?;
        let flavor = self
            .flavors
            .get(&flavor_id)
            .cloned()
            .ok_or(ComputeError::UnknownFlavor(flavor_id))?;
        let image = self
            .images
            .get(&image_id)
            .cloned()
            .ok_or(ComputeError::UnknownImage(image_id))?;
        let id = self.id_gen.generate(self.ctx.time());
        let server = Server::new(id, name.to_owned(), flavor, image, labels, meta, expected_lifetime);
        Ok(self.admit_server(server, start))
    }

    /// Schedules a full server creation at `now + delay` and returns the id
    /// the server will carry.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn submit_server_after(
        &mut self,
        name: &str,
        image_id: ResourceId,
        flavor_id: ResourceId,
        labels: HashMap<String, String>,
        meta: HashMap<String, Value>,
        expected_lifetime: Option<f64>,
        start: bool,
        delay: f64,
    ) -> Result<ResourceId, ComputeError> {
        self.ensure_open()?;
        if !self.flavors.contains_key(&flavor_id) {
            return Err(ComputeError::UnknownFlavor(flavor_id));
        }
        if !self.images.contains_key(&image_id) {
            return Err(ComputeError::UnknownImage(image_id));
        }
        let server_id = self.id_gen.generate(self.ctx.time() + delay);
        self.ctx.emit_self(
            ServerSubmission {
                server_id,
                name: name.to_owned(),
                flavor_id,
                image_id,
                labels,
                meta,
                expected_lifetime,
                start,
            },
            delay,
        );
        Ok(server_id)
    }

    fn admit_server(&mut self, server: Server, start: bool) -> Rc<RefCell<Server>> {
        let server_id = server.id;
        let server = rc!(refcell!(server));
        self.servers.insert(server_id, server.clone());
        self.counters.submitted += 1;
        log_debug!(self.ctx, "server {:#x} submitted", server_id);
        if start {
            self.counters.queued += 1;
            self.queue.push_back(Rc::new(SchedulingRequest::new(server_id)));
        }
        self.publish_metrics();
        if start {
            self.request_cycle();
        }
        server
    }

    pub fn find_server(&self, id: ResourceId) -> Option<Rc<RefCell<Server>>> {
        self.servers.get(&id).cloned()
    }

    pub fn servers(&self) -> Vec<Rc<RefCell<Server>>> {
        self.servers.values().cloned().collect()
    }

    /// Removes the server record from the registry.
    ///
    /// An active server is evicted from its host and accounted as finished; a
    /// queued server has its request cancelled. Cumulative counters are never
    /// decremented by deletion.
    pub(crate) fn delete_server(&mut self, server_id: ResourceId) -> Result<(), ComputeError> {
        self.ensure_open()?;
        let server = self
            .servers
            .remove(&server_id)
            .ok_or(ComputeError::UnknownServer(server_id))?;
        if let Some(request) = self.queue.iter().find(|r| r.server_id == server_id).cloned() {
            self.cancel_request(&request);
        }
        if let Some(host_id) = self.active_servers.remove(&server_id) {
            self.counters.running -= 1;
            self.counters.finished += 1;
            let flavor = server.borrow().flavor.clone();
            self.pool.release(host_id, &flavor);
            if let Some(host) = self.hosts.get(&host_id).cloned() {
                host.borrow_mut().evict(server_id);
            }
            self.request_cycle();
        }
        server.borrow_mut().set_state(ServerState::Deleted);
        log_debug!(self.ctx, "server {:#x} deleted", server_id);
        self.publish_metrics();
        Ok(())
    }

    // SCHEDULING //////////////////////////////////////////////////////////////////////////////////

    /// Cancels a pending request. The queue slot is reaped lazily when the
    /// request reaches the head of a dispatch pass.
    pub fn cancel_request(&mut self, request: &SchedulingRequest) {
        if request.is_cancelled() || request.is_dispatched() {
            return;
        }
        request.cancel();
        self.counters.queued -= 1;
        log_debug!(self.ctx, "scheduling of server {:#x} cancelled", request.server_id);
        self.publish_metrics();
    }

    /// Locates and cancels the pending request of the given server.
    pub(crate) fn cancel_scheduling(&mut self, server_id: ResourceId) -> Result<(), ComputeError> {
        self.ensure_open()?;
        let request = self
            .queue
            .iter()
            .find(|r| r.server_id == server_id && !r.is_cancelled() && !r.is_dispatched())
            .cloned()
            .ok_or(ComputeError::NoPendingRequest(server_id))?;
        self.cancel_request(&request);
        Ok(())
    }

    /// Arms the dispatch timer for the next quantum boundary. At most one
    /// pass is pending at any time, and nothing is armed while the queue is
    /// empty.
    fn request_cycle(&mut self) {
        if self.closed || self.cycle_event.is_some() || self.queue.is_empty() {
            return;
        }
        let delay = self.scheduling_quantum - self.ctx.time() % self.scheduling_quantum;
        self.cycle_event = Some(self.ctx.emit_self(ScheduleCycle {}, delay));
        log_trace!(self.ctx, "dispatch pass armed in {:.3} ms", delay);
    }

    fn on_schedule_cycle(&mut self) {
        self.cycle_event = None;
        loop {
            let request = match self.queue.front() {
                Some(request) => request.clone(),
                None => break,
            };
            if request.is_cancelled() {
                self.queue.pop_front();
                continue;
            }
            let server = match self.servers.get(&request.server_id) {
                Some(server) => server.clone(),
                None => {
                    self.queue.pop_front();
                    continue;
                }
            };
            let flavor = server.borrow().flavor.clone();
            let selection = self.select_host(&server.borrow(), &flavor);
            match selection {
                Some(host_id) => {
                    self.queue.pop_front();
                    request.mark_dispatched();
                    self.place_server(&server, &flavor, host_id);
                }
                None => {
                    if flavor.cpu_count > self.max_cores || flavor.memory_size > self.max_memory {
                        // no host of the fleet could ever take this server
                        self.queue.pop_front();
                        request.mark_dispatched();
                        self.counters.queued -= 1;
                        self.counters.unscheduled += 1;
                        server.borrow_mut().set_state(ServerState::Error);
                        log_warn!(
                            self.ctx,
                            "server {:#x} demands more than any registered host provides",
                            request.server_id
                        );
                        self.publish_metrics();
                    } else {
                        // fleet is saturated: leave the request at the head,
                        // the next host UP or server termination retriggers us
                        break;
                    }
                }
            }
        }
    }

    fn select_host(&self, server: &Server, flavor: &Flavor) -> Option<Id> {
        let host_id = self.policy.select_host(server, &self.pool)?;
        if !self.pool.can_fit(host_id, flavor) {
            return None;
        }
        if !self.hosts[&host_id].borrow().can_fit(server) {
            return None;
        }
        Some(host_id)
    }

    fn place_server(&mut self, server: &Rc<RefCell<Server>>, flavor: &Flavor, host_id: Id) {
        let server_id = server.borrow().id;
        // reserve before the spawn completes, so later iterations of this
        // pass cannot over-commit the host
        self.pool.allocate(host_id, flavor);
        server.borrow_mut().assign_host(host_id);
        let host = self.hosts[&host_id].clone();
        let spawned = host.borrow_mut().spawn(&server.borrow());
        match spawned {
            Ok(()) => {
                log_debug!(self.ctx, "server {:#x} placed on host #{}", server_id, host_id);
                self.active_servers.insert(server_id, host_id);
                self.counters.queued -= 1;
                self.counters.running += 1;
            }
            Err(err) => {
                log_warn!(
                    self.ctx,
                    "failed to spawn server {:#x} on host #{}: {}",
                    server_id,
                    host_id,
                    err
                );
                self.pool.release(host_id, flavor);
                self.counters.queued -= 1;
            }
        }
        self.publish_metrics();
    }

    // HOST LISTENER ///////////////////////////////////////////////////////////////////////////////

    fn on_host_state_changed(&mut self, host_id: Id, state: HostState) {
        if !self.hosts.contains_key(&host_id) {
            log_trace!(self.ctx, "ignoring state change of unregistered host #{}", host_id);
            return;
        }
        match state {
            HostState::Up => {
                self.pool.set_available(host_id);
                log_debug!(self.ctx, "host #{} became available", host_id);
            }
            HostState::Down => {
                self.pool.set_unavailable(host_id);
                log_debug!(self.ctx, "host #{} became unavailable", host_id);
            }
        }
        self.publish_metrics();
        self.request_cycle();
    }

    fn on_server_state_changed(&mut self, host_id: Id, server_id: ResourceId, state: ServerState) {
        let server = match self.servers.get(&server_id) {
            Some(server) => server.clone(),
            None => {
                log_trace!(self.ctx, "ignoring event for unknown server {:#x}", server_id);
                return;
            }
        };
        if server.borrow().host() != Some(host_id) {
            // stale event from a previous placement
            log_trace!(
                self.ctx,
                "ignoring stale event for server {:#x} from host #{}",
                server_id,
                host_id
            );
            return;
        }
        match state {
            ServerState::Running => {
                server.borrow_mut().set_state(ServerState::Running);
                log_debug!(self.ctx, "server {:#x} is running on host #{}", server_id, host_id);
            }
            ServerState::Terminated | ServerState::Error | ServerState::Deleted => {
                server.borrow_mut().set_state(state);
                if self.active_servers.remove(&server_id).is_some() {
                    self.counters.running -= 1;
                    self.counters.finished += 1;
                    let flavor = server.borrow().flavor.clone();
                    self.pool.release(host_id, &flavor);
                    log_debug!(
                        self.ctx,
                        "server {:#x} reached state {} on host #{}",
                        server_id,
                        state,
                        host_id
                    );
                    self.publish_metrics();
                    self.request_cycle();
                }
            }
            ServerState::Provisioning => {}
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn on_server_submission(
        &mut self,
        server_id: ResourceId,
        name: String,
        image_id: ResourceId,
        flavor_id: ResourceId,
        labels: HashMap<String, String>,
        meta: HashMap<String, Value>,
        expected_lifetime: Option<f64>,
        start: bool,
    ) {
        let flavor = match self.flavors.get(&flavor_id) {
            Some(flavor) => flavor.clone(),
            None => {
                log_warn!(self.ctx, "dropping submission {:#x}: flavor was deleted meanwhile", server_id);
                return;
            }
        };
        let image = match self.images.get(&image_id) {
            Some(image) => image.clone(),
            None => {
                log_warn!(self.ctx, "dropping submission {:#x}: image was deleted meanwhile", server_id);
                return;
            }
        };
        let server = Server::new(server_id, name, flavor, image, labels, meta, expected_lifetime);
        self.admit_server(server, start);
    }

    fn publish_metrics(&mut self) {
        let snapshot = MetricsAvailable {
            time: self.ctx.time(),
            host_count: self.hosts.len() as u32,
            available_host_count: self.pool.available_count() as u32,
            submitted: self.counters.submitted,
            running: self.counters.running,
            finished: self.counters.finished,
            queued: self.counters.queued,
            unscheduled: self.counters.unscheduled,
        };
        self.broadcast.publish(snapshot);
    }
}

impl EventHandler for ComputeService {
    fn on(&mut self, event: Event) {
        if self.closed {
            return;
        }
        route!(match event {
            ScheduleCycle {} => {
                self.on_schedule_cycle();
            }
            ServerSubmission {
                server_id,
                name,
                flavor_id,
                image_id,
                labels,
                meta,
                expected_lifetime,
                start,
            } => {
                self.on_server_submission(server_id, name, image_id, flavor_id, labels, meta, expected_lifetime, start);
            }
            HostStateChanged { host_id, state } => {
                self.on_host_state_changed(host_id, state);
            }
            ServerStateChanged { host_id, server_id, state } => {
                self.on_server_state_changed(host_id, server_id, state);
            }
        })
    }
}
