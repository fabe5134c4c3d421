//! Data-source adapter layer
//!
//! Every data source the visualization consumes implements `GraphSource`.
//! Sources that can replay a recorded script also implement `Replayable`,
//! discovered at runtime through `GraphSource::as_replayable`.

mod diagnostics;
mod events;
#[cfg(test)]
mod integration_tests;
mod local;
mod registry;
mod stepper;
mod traits;
mod types;

pub use diagnostics::{CollectingDiagnostics, Diagnostic, Diagnostics, TracingDiagnostics};
pub use events::{
    EnergyPulse, FlowEvent, FlowEventKind, FlowPayload, HealthUpdate, LinkChange, NodeChange,
    TraversalStep,
};
pub use local::LocalAdapter;
pub use registry::{EventHandler, SubscriberRegistry, Subscription, SubscriptionId};
pub use stepper::{ScriptStepper, StepperState};
pub use traits::{GraphSource, Replayable, SourceError};
pub use types::{SearchOpts, SearchResult, StepResult, DEFAULT_SIMILARITY_THRESHOLD};
