//! LocalAdapter — graph source for a local graph database, with script replay
//!
//! Database reads are not wired up yet: `get_nodes`, `get_links` and
//! `search` return empty results and report a `NotImplemented` diagnostic.
//! The stepper is fully functional and is what debugging tools drive.

use super::diagnostics::{Diagnostic, Diagnostics, TracingDiagnostics};
use super::events::FlowEvent;
use super::registry::{EventHandler, SubscriberRegistry, Subscription};
use super::stepper::{ScriptStepper, StepperState};
use super::traits::{GraphSource, Replayable, SourceError};
use super::types::{SearchOpts, SearchResult, StepResult};
use crate::config::LocalAdapterConfig;
use crate::graph::{Link, Node};
use crate::script::Script;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const ADAPTER_ID: &str = "LocalAdapter";

/// Graph source backed by a local graph database.
///
/// `next_step`, `load_script`, `restart` and `disconnect` are serialized
/// through one lock, held for the whole of a step, so concurrent callers see
/// steps in script order.
pub struct LocalAdapter {
    config: LocalAdapterConfig,
    diagnostics: Arc<dyn Diagnostics>,
    subscribers: SubscriberRegistry,
    stepper: Mutex<ScriptStepper>,
}

impl LocalAdapter {
    /// Create an adapter reporting diagnostics through `tracing`
    pub fn new(config: LocalAdapterConfig) -> Self {
        Self::with_diagnostics(config, Arc::new(TracingDiagnostics))
    }

    pub fn with_diagnostics(config: LocalAdapterConfig, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            config,
            diagnostics,
            subscribers: SubscriberRegistry::new(),
            stepper: Mutex::new(ScriptStepper::new()),
        }
    }

    pub fn config(&self) -> &LocalAdapterConfig {
        &self.config
    }

    pub async fn stepper_state(&self) -> StepperState {
        self.stepper.lock().await.state()
    }

    /// Index of the next scripted event
    pub async fn cursor(&self) -> usize {
        self.stepper.lock().await.cursor()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn not_implemented(&self, operation: &'static str) {
        self.diagnostics.report(Diagnostic::NotImplemented {
            adapter: ADAPTER_ID,
            operation,
        });
    }
}

impl Default for LocalAdapter {
    fn default() -> Self {
        Self::new(LocalAdapterConfig::default())
    }
}

#[async_trait]
impl GraphSource for LocalAdapter {
    fn id(&self) -> &str {
        ADAPTER_ID
    }

    async fn get_nodes(&self) -> Result<Vec<Node>, SourceError> {
        self.not_implemented("get_nodes");
        Ok(Vec::new())
    }

    async fn get_links(&self) -> Result<Vec<Link>, SourceError> {
        self.not_implemented("get_links");
        Ok(Vec::new())
    }

    async fn search(
        &self,
        query: &str,
        _opts: &SearchOpts,
    ) -> Result<Vec<SearchResult>, SourceError> {
        debug!(query, "search requested");
        self.not_implemented("search");
        Ok(Vec::new())
    }

    fn subscribe(&self, handler: EventHandler) -> Subscription {
        self.subscribers.subscribe(handler)
    }

    async fn disconnect(&self) {
        let mut stepper = self.stepper.lock().await;
        self.subscribers.clear();
        stepper.clear();
        debug!(adapter = ADAPTER_ID, "disconnected");
    }

    fn as_replayable(&self) -> Option<&dyn Replayable> {
        Some(self)
    }
}

#[async_trait]
impl Replayable for LocalAdapter {
    async fn next_step(&self) -> Result<StepResult, SourceError> {
        let mut stepper = self.stepper.lock().await;

        let Some(event) = stepper.advance() else {
            let state = self.snapshot().await?;
            return Ok(StepResult {
                event: FlowEvent::terminal(),
                state,
                has_more: false,
            });
        };

        let has_more = stepper.has_more();
        debug!(
            cursor = stepper.cursor(),
            total = stepper.len(),
            kind = %event.kind(),
            "replay step"
        );

        self.subscribers.emit(&event, self.diagnostics.as_ref());
        let state = self.snapshot().await?;
        Ok(StepResult {
            event,
            state,
            has_more,
        })
    }

    async fn restart(&self) {
        self.stepper.lock().await.restart();
        debug!("replay restarted");
    }

    async fn load_script(&self, script: Script) {
        let events = script.len();
        self.stepper.lock().await.load(script);
        debug!(events, "script loaded");
    }
}
