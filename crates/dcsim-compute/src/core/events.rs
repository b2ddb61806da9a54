//! Standard simulation events.

// SERVICE EVENTS //////////////////////////////////////////////////////////////////////////////////

pub mod service {
    use std::collections::HashMap;

    use serde::Serialize;
    use serde_json::Value;

    use crate::core::common::ResourceId;

    /// Fires a dispatch pass; armed at most once at a time, aligned to the
    /// scheduling quantum.
    #[derive(Clone, Serialize)]
    pub struct ScheduleCycle {}

    /// Deferred server creation, processed by the service at the submission
    /// time chosen by the caller.
    #[derive(Clone, Serialize)]
    pub struct ServerSubmission {
        pub server_id: ResourceId,
        pub name: String,
        pub flavor_id: ResourceId,
        pub image_id: ResourceId,
        pub labels: HashMap<String, String>,
        pub meta: HashMap<String, Value>,
        pub expected_lifetime: Option<f64>,
        pub start: bool,
    }
}

// HOST EVENTS /////////////////////////////////////////////////////////////////////////////////////

pub mod host {
    use serde::Serialize;

    use dcsim_core::Id;

    use crate::core::common::ResourceId;
    use crate::core::host::HostState;
    use crate::core::server::ServerState;

    /// Announced by a host to its listeners on every UP/DOWN transition.
    #[derive(Clone, Serialize)]
    pub struct HostStateChanged {
        pub host_id: Id,
        pub state: HostState,
    }

    /// Announced by a host to its listeners whenever one of its guests
    /// changes lifecycle state.
    #[derive(Clone, Serialize)]
    pub struct ServerStateChanged {
        pub host_id: Id,
        pub server_id: ResourceId,
        pub state: ServerState,
    }

    /// Self-event marking the end of a guest's expected lifetime.
    #[derive(Clone, Serialize)]
    pub struct GuestFinished {
        pub server_id: ResourceId,
    }

    /// Scripted host state change, used to drive UP/DOWN transitions at
    /// chosen points of the simulated timeline.
    #[derive(Clone, Serialize)]
    pub struct SetHostState {
        pub state: HostState,
    }
}
