//! Node representation in the visualized graph

use super::RangeViolation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node
///
/// Serializes as a plain string (UUID or semantic ID like "actor_claude")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new random NodeId (UUID-based)
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a NodeId from a string (semantic ID)
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The five node families of the graph schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Actor,
    Moment,
    Narrative,
    Space,
    Thing,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Actor => "actor",
            Self::Moment => "moment",
            Self::Narrative => "narrative",
            Self::Space => "space",
            Self::Thing => "thing",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a moment node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MomentStatus {
    Possible,
    Active,
    Completed,
}

/// Fields carried only by moment nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentState {
    pub status: MomentStatus,
    pub tick_created: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_resolved: Option<u64>,
}

/// A node in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// Display name
    pub name: String,
    /// Node family
    pub node_type: NodeType,
    /// Free-form subtype within the family
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    pub weight: f64,
    pub energy: f64,

    /// Condensed meaning of the node
    #[serde(default)]
    pub synthesis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Layout position, if the front end has placed the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,

    /// Present iff `node_type` is `Moment`
    #[serde(flatten)]
    pub moment: Option<MomentState>,
}

impl Node {
    /// Create a new node with a random id
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            node_type,
            subtype: None,
            weight: 1.0,
            energy: 0.0,
            synthesis: String::new(),
            content: None,
            x: None,
            y: None,
            moment: None,
        }
    }

    /// Create a moment node in the given status
    pub fn moment(name: impl Into<String>, status: MomentStatus, tick_created: u64) -> Self {
        let mut node = Self::new(name, NodeType::Moment);
        node.moment = Some(MomentState {
            status,
            tick_created,
            tick_resolved: None,
        });
        node
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_synthesis(mut self, synthesis: impl Into<String>) -> Self {
        self.synthesis = synthesis.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Layout position, only when both coordinates are set
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.x?, self.y?))
    }

    pub fn is_moment(&self) -> bool {
        self.node_type == NodeType::Moment
    }

    /// Check the node against the schema's value constraints.
    ///
    /// Weight and energy must be finite and non-negative. Moment state is
    /// required on moment nodes and forbidden elsewhere; a resolved moment
    /// cannot resolve before it was created.
    pub fn check(&self) -> Result<(), RangeViolation> {
        RangeViolation::check("weight", self.weight, 0.0, f64::MAX)?;
        RangeViolation::check("energy", self.energy, 0.0, f64::MAX)?;

        match (&self.moment, self.is_moment()) {
            (None, true) => Err(RangeViolation::Missing("moment status")),
            (Some(_), false) => Err(RangeViolation::Unexpected("moment status")),
            (Some(state), true) => match state.tick_resolved {
                Some(resolved) if resolved < state.tick_created => Err(RangeViolation::OutOfRange {
                    field: "tick_resolved",
                    value: resolved as f64,
                    min: state.tick_created as f64,
                    max: f64::MAX,
                }),
                _ => Ok(()),
            },
            (None, false) => Ok(()),
        }
    }
}
