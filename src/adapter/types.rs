//! Request and response types of the adapter contract
//!
//! - SearchOpts: optional knobs for semantic search
//! - SearchResult: a node with its similarity score and optional path
//! - StepResult: what one replay step hands back to the driver
//!
//! `SearchOpts::rank` is for sources with a real similarity backend: they
//! hand it their raw scored hits and return its output from `search`. The
//! local adapter has no such backend and ignores the options.

use super::events::FlowEvent;
use crate::graph::{GraphSnapshot, Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Similarity threshold applied when a search does not set one
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Options for `GraphSource::search`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOpts {
    /// Minimum similarity in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f64>,
    /// Expand results by this many hops
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hops: Option<usize>,
    /// Maximum number of results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    /// Keep only nodes of these types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_types: Option<HashSet<NodeType>>,
}

impl SearchOpts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    pub fn with_max_hops(mut self, hops: usize) -> Self {
        self.max_hops = Some(hops);
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    pub fn with_node_types(mut self, types: impl IntoIterator<Item = NodeType>) -> Self {
        self.node_types = Some(types.into_iter().collect());
        self
    }

    /// Effective threshold
    pub fn threshold(&self) -> f64 {
        self.similarity_threshold
            .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD)
    }

    /// Whether a node type passes the type filter
    pub fn admits(&self, node_type: NodeType) -> bool {
        self.node_types
            .as_ref()
            .map_or(true, |types| types.contains(&node_type))
    }

    /// Shape raw scored hits into the contract's ranked list.
    ///
    /// Drops hits below the threshold or outside the type filter, orders by
    /// descending score (ties keep their input order) and applies `top_k`.
    pub fn rank(&self, hits: Vec<SearchResult>) -> Vec<SearchResult> {
        let threshold = self.threshold();
        let mut ranked: Vec<SearchResult> = hits
            .into_iter()
            .filter(|hit| hit.score >= threshold && self.admits(hit.node.node_type))
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        if let Some(k) = self.top_k {
            ranked.truncate(k);
        }
        ranked
    }
}

/// A single search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub node: Node,
    /// Similarity score
    pub score: f64,
    /// Path from the query context, when the hit came from hop expansion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<NodeId>>,
}

impl SearchResult {
    pub fn new(node: Node, score: f64) -> Self {
        Self {
            node,
            score,
            path: None,
        }
    }

    pub fn with_path(mut self, path: Vec<NodeId>) -> Self {
        self.path = Some(path);
        self
    }
}

/// The outcome of one replay step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// The event just emitted, or the terminal health update
    pub event: FlowEvent,
    /// Graph state fetched after the event was emitted
    pub state: GraphSnapshot,
    /// Whether another scripted event remains
    pub has_more: bool,
}
