//! Flow events delivered to the visualization layer
//!
//! Nine event kinds, each with its own payload shape. Events are immutable
//! once built; their order is the temporal log of the graph.
//!
//! Wire shape: `{"type": "<kind>", "timestamp": <ms>, "payload": {...}}`.

use crate::graph::{GraphSnapshot, Link, LinkId, Node, NodeId, RangeViolation};
use serde::{Deserialize, Serialize};

/// Discriminant of a [`FlowEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowEventKind {
    NodeCreated,
    NodeUpdated,
    NodeDeleted,
    LinkCreated,
    LinkUpdated,
    LinkDeleted,
    EnergyPulse,
    TraversalStep,
    HealthUpdate,
}

impl FlowEventKind {
    pub const ALL: [FlowEventKind; 9] = [
        Self::NodeCreated,
        Self::NodeUpdated,
        Self::NodeDeleted,
        Self::LinkCreated,
        Self::LinkUpdated,
        Self::LinkDeleted,
        Self::EnergyPulse,
        Self::TraversalStep,
        Self::HealthUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodeCreated => "node_created",
            Self::NodeUpdated => "node_updated",
            Self::NodeDeleted => "node_deleted",
            Self::LinkCreated => "link_created",
            Self::LinkUpdated => "link_updated",
            Self::LinkDeleted => "link_deleted",
            Self::EnergyPulse => "energy_pulse",
            Self::TraversalStep => "traversal_step",
            Self::HealthUpdate => "health_update",
        }
    }
}

impl std::fmt::Display for FlowEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node lifecycle change. The node body is optional: deletions usually
/// carry only the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeChange {
    pub node_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<Node>,
}

impl NodeChange {
    pub fn id_only(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            node: None,
        }
    }

    pub fn from_node(node: Node) -> Self {
        Self {
            node_id: node.id.clone(),
            node: Some(node),
        }
    }
}

/// A link lifecycle change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkChange {
    pub link_id: LinkId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

impl LinkChange {
    pub fn id_only(link_id: impl Into<LinkId>) -> Self {
        Self {
            link_id: link_id.into(),
            link: None,
        }
    }

    pub fn from_link(link: Link) -> Self {
        Self {
            link_id: link.id.clone(),
            link: Some(link),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyPulse {
    pub node_id: NodeId,
    pub energy_delta: f64,
    pub new_energy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraversalStep {
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub via_link: LinkId,
    pub energy_transferred: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subentity_id: Option<String>,
}

/// Aggregate graph counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthUpdate {
    pub node_count: u64,
    pub link_count: u64,
    pub total_energy: f64,
    pub active_subentities: u64,
}

impl HealthUpdate {
    /// All counters zero; the terminal marker of an exhausted replay
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Counters describing a snapshot
    pub fn from_snapshot(snapshot: &GraphSnapshot, active_subentities: u64) -> Self {
        Self {
            node_count: snapshot.nodes.len() as u64,
            link_count: snapshot.links.len() as u64,
            total_energy: snapshot.total_energy(),
            active_subentities,
        }
    }
}

/// Kind-dependent body of a [`FlowEvent`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum FlowPayload {
    NodeCreated(NodeChange),
    NodeUpdated(NodeChange),
    NodeDeleted(NodeChange),
    LinkCreated(LinkChange),
    LinkUpdated(LinkChange),
    LinkDeleted(LinkChange),
    EnergyPulse(EnergyPulse),
    TraversalStep(TraversalStep),
    HealthUpdate(HealthUpdate),
}

impl FlowPayload {
    pub fn kind(&self) -> FlowEventKind {
        match self {
            Self::NodeCreated(_) => FlowEventKind::NodeCreated,
            Self::NodeUpdated(_) => FlowEventKind::NodeUpdated,
            Self::NodeDeleted(_) => FlowEventKind::NodeDeleted,
            Self::LinkCreated(_) => FlowEventKind::LinkCreated,
            Self::LinkUpdated(_) => FlowEventKind::LinkUpdated,
            Self::LinkDeleted(_) => FlowEventKind::LinkDeleted,
            Self::EnergyPulse(_) => FlowEventKind::EnergyPulse,
            Self::TraversalStep(_) => FlowEventKind::TraversalStep,
            Self::HealthUpdate(_) => FlowEventKind::HealthUpdate,
        }
    }
}

/// A single timestamped event in the flow log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEvent {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(flatten)]
    pub payload: FlowPayload,
}

impl FlowEvent {
    /// Build an event stamped with the current time
    pub fn now(payload: FlowPayload) -> Self {
        Self::at(chrono::Utc::now().timestamp_millis(), payload)
    }

    pub fn at(timestamp: i64, payload: FlowPayload) -> Self {
        Self { timestamp, payload }
    }

    pub fn kind(&self) -> FlowEventKind {
        self.payload.kind()
    }

    /// The zero-valued health update returned once a replay is exhausted
    pub fn terminal() -> Self {
        Self::now(FlowPayload::HealthUpdate(HealthUpdate::zero()))
    }

    /// True for a health update whose counters are all zero
    pub fn is_terminal(&self) -> bool {
        matches!(&self.payload, FlowPayload::HealthUpdate(h) if h.is_zero())
    }

    pub fn timestamp_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Check the payload against the schema's value constraints.
    pub fn check(&self) -> Result<(), RangeViolation> {
        match &self.payload {
            FlowPayload::NodeCreated(change)
            | FlowPayload::NodeUpdated(change)
            | FlowPayload::NodeDeleted(change) => match &change.node {
                Some(node) if node.id != change.node_id => {
                    Err(RangeViolation::Unexpected("node body with mismatched id"))
                }
                Some(node) => node.check(),
                None => Ok(()),
            },
            FlowPayload::LinkCreated(change)
            | FlowPayload::LinkUpdated(change)
            | FlowPayload::LinkDeleted(change) => match &change.link {
                Some(link) if link.id != change.link_id => {
                    Err(RangeViolation::Unexpected("link body with mismatched id"))
                }
                Some(link) => link.check_ranges(),
                None => Ok(()),
            },
            FlowPayload::EnergyPulse(pulse) => {
                RangeViolation::finite("energy_delta", pulse.energy_delta)?;
                RangeViolation::finite("new_energy", pulse.new_energy)
            }
            FlowPayload::TraversalStep(step) => {
                RangeViolation::finite("energy_transferred", step.energy_transferred)
            }
            FlowPayload::HealthUpdate(health) => {
                RangeViolation::check("total_energy", health.total_energy, 0.0, f64::MAX)
            }
        }
    }
}
