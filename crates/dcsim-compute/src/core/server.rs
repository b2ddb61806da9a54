use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

use dcsim_core::Id;

use crate::core::common::ResourceId;
use crate::core::flavor::Flavor;
use crate::core::image::Image;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ServerState {
    Provisioning,
    Running,
    Terminated,
    Error,
    Deleted,
}

impl ServerState {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServerState::Terminated | ServerState::Error | ServerState::Deleted)
    }
}

impl Display for ServerState {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ServerState::Provisioning => write!(f, "provisioning"),
            ServerState::Running => write!(f, "running"),
            ServerState::Terminated => write!(f, "terminated"),
            ServerState::Error => write!(f, "error"),
            ServerState::Deleted => write!(f, "deleted"),
        }
    }
}

/// A virtual machine record owned by the compute service registry.
#[derive(Debug)]
pub struct Server {
    pub id: ResourceId,
    pub name: String,
    pub flavor: Rc<Flavor>,
    pub image: Rc<Image>,
    pub labels: HashMap<String, String>,
    pub meta: HashMap<String, Value>,
    state: ServerState,
    host: Option<Id>,
    expected_lifetime: Option<f64>,
}

impl Server {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ResourceId,
        name: String,
        flavor: Rc<Flavor>,
        image: Rc<Image>,
        labels: HashMap<String, String>,
        meta: HashMap<String, Value>,
        expected_lifetime: Option<f64>,
    ) -> Self {
        Self {
            id,
            name,
            flavor,
            image,
            labels,
            meta,
            state: ServerState::Provisioning,
            host: None,
            expected_lifetime,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Applies a state transition. Transitions out of a terminal state are
    /// ignored.
    pub fn set_state(&mut self, state: ServerState) {
        if self.state.is_terminal() {
            return;
        }
        self.state = state;
    }

    /// The host this server is (or was last) placed on.
    pub fn host(&self) -> Option<Id> {
        self.host
    }

    pub fn assign_host(&mut self, host: Id) {
        self.host = Some(host);
    }

    /// Expected run duration in milliseconds, consumed by the host once the
    /// server is spawned. `None` means the server runs until evicted or the
    /// host fails.
    pub fn expected_lifetime(&self) -> Option<f64> {
        self.expected_lifetime
    }
}
