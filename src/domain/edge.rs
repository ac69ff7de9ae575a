use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Edge kind of the resource-allocation graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Resource → Process: the resource is held by the process
    Assignment,
    /// Process → Resource: the process is waiting for the resource
    Request,
}
