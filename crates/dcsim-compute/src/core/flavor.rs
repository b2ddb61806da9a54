use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::core::common::ResourceId;

/// A named bundle of resource requirements for servers.
///
/// Flavors are immutable after creation; servers keep a shared reference to
/// the flavor they were created with.
#[derive(Clone, Debug, Serialize)]
pub struct Flavor {
    pub id: ResourceId,
    pub name: String,
    /// Number of CPU cores demanded by a server of this flavor, at least 1.
    pub cpu_count: u32,
    /// Memory size in bytes demanded by a server of this flavor.
    pub memory_size: u64,
    pub labels: HashMap<String, String>,
    pub meta: HashMap<String, Value>,
}
