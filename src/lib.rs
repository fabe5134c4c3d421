//! Connectome: graph data sources for the Connectome visualization
//!
//! The visualization layer talks to every data source through one contract
//! and never depends on which concrete source is active.
//!
//! # Core Concepts
//!
//! - **GraphSource**: nodes, links, semantic search and realtime flow events
//! - **Replayable**: optional deterministic replay of a recorded script
//! - **Script**: an ordered, finite log of flow events
//!
//! # Example
//!
//! ```
//! use connectome::{FlowEvent, FlowPayload, GraphSource, HealthUpdate, LocalAdapter, Script};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let adapter = LocalAdapter::default();
//!     let replay = adapter.as_replayable().expect("local adapter replays scripts");
//!
//!     let event = FlowEvent::at(0, FlowPayload::HealthUpdate(HealthUpdate::zero()));
//!     replay.load_script(Script::new(vec![event])).await;
//!
//!     let step = replay.next_step().await.unwrap();
//!     assert!(!step.has_more);
//! });
//! ```

pub mod adapter;
pub mod config;
pub mod graph;
pub mod script;

pub use adapter::{
    Diagnostic, Diagnostics, EventHandler, FlowEvent, FlowEventKind, FlowPayload, GraphSource,
    HealthUpdate, LocalAdapter, Replayable, SearchOpts, SearchResult, SourceError, StepResult,
    Subscription,
};
pub use config::{ConfigError, ConfigOverrides, LocalAdapterConfig};
pub use graph::{GraphSnapshot, Link, LinkId, Node, NodeId, NodeType};
pub use script::{Script, ScriptError, ScriptRecorder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
