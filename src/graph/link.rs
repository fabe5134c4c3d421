//! Link representation with physics and semantic axes

use super::node::NodeId;
use super::RangeViolation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a link
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(String);

impl LinkId {
    /// Create a new random LinkId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LinkId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LinkId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A link between two nodes
///
/// Links are undirected in storage; direction lives in `polarity`, which
/// carries one strength per traversal direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Unique identifier
    pub id: LinkId,
    pub node_a: NodeId,
    pub node_b: NodeId,

    pub weight: f64,
    pub energy: f64,

    /// `[a→b, b→a]`, each in [0, 1]
    pub polarity: [f64; 2],
    /// [-1, 1]: -1 = contains, +1 = elaborates
    pub hierarchy: f64,
    /// [0, 1]: 0 = speculative, 1 = definitive
    pub permanence: f64,

    // Plutchik axes, each in [-1, 1]
    pub joy_sadness: f64,
    pub trust_disgust: f64,
    pub fear_anger: f64,
    pub surprise_anticipation: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<String>,
}

impl Link {
    /// Create a neutral link between two nodes
    pub fn new(node_a: impl Into<NodeId>, node_b: impl Into<NodeId>) -> Self {
        Self {
            id: LinkId::new(),
            node_a: node_a.into(),
            node_b: node_b.into(),
            weight: 1.0,
            energy: 0.0,
            polarity: [0.5, 0.5],
            hierarchy: 0.0,
            permanence: 0.5,
            joy_sadness: 0.0,
            trust_disgust: 0.0,
            fear_anger: 0.0,
            surprise_anticipation: 0.0,
            synthesis: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<LinkId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_polarity(mut self, a_to_b: f64, b_to_a: f64) -> Self {
        self.polarity = [a_to_b, b_to_a];
        self
    }

    pub fn with_hierarchy(mut self, hierarchy: f64) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    pub fn with_permanence(mut self, permanence: f64) -> Self {
        self.permanence = permanence;
        self
    }

    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_synthesis(mut self, synthesis: impl Into<String>) -> Self {
        self.synthesis = Some(synthesis.into());
        self
    }

    /// Whether the link touches the given node at either end
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.node_a == node || &self.node_b == node
    }

    /// The endpoint opposite `node`, if `node` is an endpoint
    pub fn other_end(&self, node: &NodeId) -> Option<&NodeId> {
        if &self.node_a == node {
            Some(&self.node_b)
        } else if &self.node_b == node {
            Some(&self.node_a)
        } else {
            None
        }
    }

    /// Check every axis against its declared range.
    ///
    /// Returns the first violation found, in field declaration order.
    pub fn check_ranges(&self) -> Result<(), RangeViolation> {
        RangeViolation::check("weight", self.weight, 0.0, f64::MAX)?;
        RangeViolation::check("energy", self.energy, 0.0, f64::MAX)?;
        RangeViolation::check("polarity[0]", self.polarity[0], 0.0, 1.0)?;
        RangeViolation::check("polarity[1]", self.polarity[1], 0.0, 1.0)?;
        RangeViolation::check("hierarchy", self.hierarchy, -1.0, 1.0)?;
        RangeViolation::check("permanence", self.permanence, 0.0, 1.0)?;
        RangeViolation::check("joy_sadness", self.joy_sadness, -1.0, 1.0)?;
        RangeViolation::check("trust_disgust", self.trust_disgust, -1.0, 1.0)?;
        RangeViolation::check("fear_anger", self.fear_anger, -1.0, 1.0)?;
        RangeViolation::check("surprise_anticipation", self.surprise_anticipation, -1.0, 1.0)
    }
}
