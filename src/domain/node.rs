use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique, never-reused identifier of a process
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ProcessId(pub u32);

/// Unique, never-reused identifier of a resource
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ResourceId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Behavioral class of a process. Only weights victim selection;
/// it never changes what detection reports.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    #[default]
    Cooperative,
    Aggressive,
    Greedy,
    Patient,
}

impl Personality {
    pub const ALL: [Personality; 4] = [
        Personality::Cooperative,
        Personality::Aggressive,
        Personality::Greedy,
        Personality::Patient,
    ];
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Personality::Cooperative => "cooperative",
            Personality::Aggressive => "aggressive",
            Personality::Greedy => "greedy",
            Personality::Patient => "patient",
        };
        f.write_str(s)
    }
}

/// Process node
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    pub id: ProcessId,
    pub personality: Personality,
    pub in_deadlock: bool,
}

impl Process {
    pub fn new(id: ProcessId, personality: Personality) -> Self {
        Self {
            id,
            personality,
            in_deadlock: false,
        }
    }
}

/// Resource node (single instance)
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
}

/// Polymorphic node type of the allocation graph
#[derive(Debug, Clone)]
pub enum Node {
    Process(Process),
    Resource(Resource),
}

impl Node {
    pub fn as_process(&self) -> Option<&Process> {
        match self {
            Node::Process(p) => Some(p),
            Node::Resource(_) => None,
        }
    }

    pub fn as_process_mut(&mut self) -> Option<&mut Process> {
        match self {
            Node::Process(p) => Some(p),
            Node::Resource(_) => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Node::Resource(r) => Some(r),
            Node::Process(_) => None,
        }
    }
}
