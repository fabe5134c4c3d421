//! Adapter traits — the contract data sources implement
//!
//! `GraphSource` is the base capability every source offers to the
//! visualization layer. `Replayable` is the optional stepper capability;
//! callers discover it through `GraphSource::as_replayable` and treat `None`
//! as live mode.

use super::events::FlowEvent;
use super::registry::{EventHandler, Subscription};
use super::types::{SearchOpts, SearchResult, StepResult};
use crate::graph::{GraphSnapshot, Link, Node};
use crate::script::Script;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors a data source may surface from its read operations.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
}

/// Read access plus realtime updates for one graph data source.
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Short identifier used in logs and diagnostics
    fn id(&self) -> &str;

    /// Every node in the graph
    async fn get_nodes(&self) -> Result<Vec<Node>, SourceError>;

    /// Every link in the graph
    async fn get_links(&self) -> Result<Vec<Link>, SourceError>;

    /// Semantic search, ranked by descending score
    async fn search(&self, query: &str, opts: &SearchOpts)
        -> Result<Vec<SearchResult>, SourceError>;

    /// Register a handler for future flow events.
    fn subscribe(&self, handler: EventHandler) -> Subscription;

    /// Release everything tied to this source. Safe to call repeatedly.
    async fn disconnect(&self);

    /// The stepper capability, if this source supports deterministic replay
    fn as_replayable(&self) -> Option<&dyn Replayable> {
        None
    }

    /// Nodes and links fetched together
    async fn snapshot(&self) -> Result<GraphSnapshot, SourceError> {
        let nodes = self.get_nodes().await?;
        let links = self.get_links().await?;
        Ok(GraphSnapshot::new(nodes, links))
    }

    /// `subscribe` for a plain closure
    fn subscribe_fn<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&FlowEvent) + Send + Sync + 'static,
        Self: Sized,
    {
        self.subscribe(Arc::new(handler))
    }
}

/// Deterministic replay of a recorded event script.
#[async_trait]
pub trait Replayable: Send + Sync {
    /// Emit the next scripted event to subscribers and return it with a
    /// fresh snapshot. Once the script is exhausted, returns a zero-valued
    /// health update with `has_more = false` and emits nothing.
    async fn next_step(&self) -> Result<StepResult, SourceError>;

    /// Rewind to the first event. Subscribers are kept.
    async fn restart(&self);

    /// Replace the script and rewind. Emits nothing.
    async fn load_script(&self, script: Script);
}
