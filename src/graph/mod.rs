//! Graph data shapes shared by every data source

mod link;
mod node;

pub use link::{Link, LinkId};
pub use node::{MomentState, MomentStatus, Node, NodeId, NodeType};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A value that falls outside the range its schema declares.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RangeViolation {
    #[error("{field} = {value} is outside {}", bounds(.min, .max))]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} is not allowed here")]
    Unexpected(&'static str),
}

/// Interval notation, with `f64::MIN`/`f64::MAX` standing for an open end
fn bounds(min: &f64, max: &f64) -> String {
    let lower = if *min <= f64::MIN {
        "(-∞".to_string()
    } else {
        format!("[{}", min)
    };
    let upper = if *max >= f64::MAX {
        "∞)".to_string()
    } else {
        format!("{}]", max)
    };
    format!("{}, {}", lower, upper)
}

impl RangeViolation {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            Self::OutOfRange { field, .. } => *field,
            Self::Missing(field) | Self::Unexpected(field) => *field,
        }
    }

    /// Inclusive range check. NaN and infinities never pass.
    pub(crate) fn check(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), Self> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Self::OutOfRange {
                field,
                value,
                min,
                max,
            })
        }
    }

    /// Any finite value passes
    pub(crate) fn finite(field: &'static str, value: f64) -> Result<(), Self> {
        Self::check(field, value, f64::MIN, f64::MAX)
    }
}

/// The full node/link state as understood by a data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self { nodes, links }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    /// Sum of node energy, the figure reported by health updates
    pub fn total_energy(&self) -> f64 {
        self.nodes.iter().map(|n| n.energy).sum()
    }
}
