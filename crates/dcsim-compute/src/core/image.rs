use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::core::common::ResourceId;

/// A machine image, immutable after creation.
#[derive(Clone, Debug, Serialize)]
pub struct Image {
    pub id: ResourceId,
    pub name: String,
    pub labels: HashMap<String, String>,
    pub meta: HashMap<String, Value>,
}
