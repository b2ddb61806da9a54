//! Host contract and the reference host implementation.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};

use serde::Serialize;

use dcsim_core::context::SimulationContext;
use dcsim_core::event::{Event, EventId};
use dcsim_core::handler::EventHandler;
use dcsim_core::{log_debug, log_trace, route, Id};

use crate::core::common::ResourceId;
use crate::core::error::SpawnError;
use crate::core::events::host::{GuestFinished, HostStateChanged, ServerStateChanged, SetHostState};
use crate::core::server::{Server, ServerState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HostState {
    Up,
    Down,
}

impl Display for HostState {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            HostState::Up => write!(f, "up"),
            HostState::Down => write!(f, "down"),
        }
    }
}

/// Static capacity of a host.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct HostModel {
    pub cpu_count: u32,
    pub memory_size: u64,
}

/// Contract of a compute node as consumed by the scheduler.
///
/// The scheduler treats a host as a black box: it reads the static model and
/// the current state, asks for a policy-free capacity check, and hands over
/// servers via [`spawn`](Host::spawn). Everything the host has to say back
/// travels through events to the registered listeners.
pub trait Host {
    fn id(&self) -> Id;

    fn state(&self) -> HostState;

    fn model(&self) -> HostModel;

    fn meta(&self) -> &HashMap<String, String>;

    /// Checks whether the host currently has room for the given server.
    fn can_fit(&self, server: &Server) -> bool;

    /// Starts a guest for the given server.
    ///
    /// Completes asynchronously: on success the server transitions to
    /// `Running` via an emitted [`ServerStateChanged`] event. On failure the
    /// host announces a terminal `Error` state the same way.
    fn spawn(&mut self, server: &Server) -> Result<(), SpawnError>;

    /// Removes a guest without waiting for its lifetime to elapse.
    fn evict(&mut self, server_id: ResourceId);

    fn add_listener(&mut self, listener: Id);

    fn remove_listener(&mut self, listener: Id);
}

struct Guest {
    cpu_count: u32,
    memory_size: u64,
    finish_event: Option<EventId>,
}

/// Reference host implementation used by simulations and tests.
///
/// Accounts allocated CPU/memory for its guests and completes each guest
/// after the server's expected lifetime. Going DOWN fails all guests.
pub struct SimHost {
    state: HostState,
    model: HostModel,
    meta: HashMap<String, String>,
    listeners: Vec<Id>,
    cpu_allocated: u32,
    memory_allocated: u64,
    guests: BTreeMap<ResourceId, Guest>,
    ctx: SimulationContext,
}

impl SimHost {
    pub fn new(cpu_count: u32, memory_size: u64, ctx: SimulationContext) -> Self {
        Self {
            state: HostState::Up,
            model: HostModel { cpu_count, memory_size },
            meta: HashMap::new(),
            listeners: Vec::new(),
            cpu_allocated: 0,
            memory_allocated: 0,
            guests: BTreeMap::new(),
            ctx,
        }
    }

    /// Transitions the host between UP and DOWN, announcing the change to
    /// listeners. Going DOWN fails all current guests.
    pub fn set_state(&mut self, state: HostState) {
        if state == self.state {
            return;
        }
        self.state = state;
        log_debug!(self.ctx, "host #{} is now {}", self.ctx.id(), state);
        if state == HostState::Down {
            self.fail_all_guests();
        }
        let event = HostStateChanged {
            host_id: self.ctx.id(),
            state,
        };
        for listener in &self.listeners {
            self.ctx.emit_now(event.clone(), *listener);
        }
    }

    pub fn guest_count(&self) -> usize {
        self.guests.len()
    }

    pub fn cpu_allocated(&self) -> u32 {
        self.cpu_allocated
    }

    pub fn memory_allocated(&self) -> u64 {
        self.memory_allocated
    }

    fn notify_server_state(&self, server_id: ResourceId, state: ServerState) {
        let event = ServerStateChanged {
            host_id: self.ctx.id(),
            server_id,
            state,
        };
        for listener in &self.listeners {
            self.ctx.emit_now(event.clone(), *listener);
        }
    }

    fn release_guest(&mut self, guest: &Guest) {
        self.cpu_allocated -= guest.cpu_count;
        self.memory_allocated -= guest.memory_size;
    }

    fn fail_all_guests(&mut self) {
        let guests = std::mem::take(&mut self.guests);
        for (server_id, guest) in guests {
            if let Some(event_id) = guest.finish_event {
                self.ctx.cancel_event(event_id);
            }
            self.release_guest(&guest);
            log_debug!(self.ctx, "guest {:#x} failed, host #{} went down", server_id, self.ctx.id());
            self.notify_server_state(server_id, ServerState::Error);
        }
    }

    fn on_guest_finished(&mut self, server_id: ResourceId) {
        if let Some(guest) = self.guests.remove(&server_id) {
            self.release_guest(&guest);
            log_debug!(self.ctx, "guest {:#x} finished on host #{}", server_id, self.ctx.id());
            self.notify_server_state(server_id, ServerState::Terminated);
        }
    }
}

impl Host for SimHost {
    fn id(&self) -> Id {
        self.ctx.id()
    }

    fn state(&self) -> HostState {
        self.state
    }

    fn model(&self) -> HostModel {
        self.model
    }

    fn meta(&self) -> &HashMap<String, String> {
        &self.meta
    }

    fn can_fit(&self, server: &Server) -> bool {
        self.state == HostState::Up
            && server.flavor.cpu_count <= self.model.cpu_count - self.cpu_allocated
            && server.flavor.memory_size <= self.model.memory_size - self.memory_allocated
    }

    fn spawn(&mut self, server: &Server) -> Result<(), SpawnError> {
        if self.state == HostState::Down {
            self.notify_server_state(server.id, ServerState::Error);
            return Err(SpawnError::HostDown);
        }
        if !self.can_fit(server) {
            self.notify_server_state(server.id, ServerState::Error);
            return Err(SpawnError::InsufficientCapacity);
        }
        self.cpu_allocated += server.flavor.cpu_count;
        self.memory_allocated += server.flavor.memory_size;
        let finish_event = server
            .expected_lifetime()
            .map(|lifetime| self.ctx.emit_self(GuestFinished { server_id: server.id }, lifetime));
        self.guests.insert(
            server.id,
            Guest {
                cpu_count: server.flavor.cpu_count,
                memory_size: server.flavor.memory_size,
                finish_event,
            },
        );
        log_debug!(self.ctx, "guest {:#x} spawned on host #{}", server.id, self.ctx.id());
        self.notify_server_state(server.id, ServerState::Running);
        Ok(())
    }

    fn evict(&mut self, server_id: ResourceId) {
        if let Some(guest) = self.guests.remove(&server_id) {
            if let Some(event_id) = guest.finish_event {
                self.ctx.cancel_event(event_id);
            }
            self.release_guest(&guest);
            log_debug!(self.ctx, "guest {:#x} evicted from host #{}", server_id, self.ctx.id());
            self.notify_server_state(server_id, ServerState::Deleted);
        } else {
            log_trace!(self.ctx, "no guest {:#x} to evict on host #{}", server_id, self.ctx.id());
        }
    }

    fn add_listener(&mut self, listener: Id) {
        if !self.listeners.contains(&listener) {
            self.listeners.push(listener);
        }
    }

    fn remove_listener(&mut self, listener: Id) {
        self.listeners.retain(|&id| id != listener);
    }
}

impl EventHandler for SimHost {
    fn on(&mut self, event: Event) {
        route!(match event {
            GuestFinished { server_id } => {
                self.on_guest_finished(server_id);
            }
            SetHostState { state } => {
                self.set_state(state);
            }
        })
    }
}
