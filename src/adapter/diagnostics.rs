//! Caller-supplied diagnostics hook
//!
//! Degraded paths (unimplemented reads, misbehaving subscribers) never fail
//! the caller. They are reported here instead, so the adapter core carries no
//! hidden I/O side channel.

use super::registry::SubscriptionId;
use std::sync::Mutex;

/// A non-fatal condition observed by an adapter
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A read operation has no backing implementation and returned empty
    NotImplemented {
        adapter: &'static str,
        operation: &'static str,
    },
    /// A subscriber panicked while handling an event; later subscribers
    /// still received it
    HandlerPanicked {
        subscription: SubscriptionId,
        message: String,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotImplemented { adapter, operation } => {
                write!(f, "{}.{}() not yet implemented", adapter, operation)
            }
            Self::HandlerPanicked {
                subscription,
                message,
            } => write!(f, "subscriber {} panicked: {}", subscription, message),
        }
    }
}

/// Sink for [`Diagnostic`]s
pub trait Diagnostics: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::NotImplemented { adapter, operation } => {
                tracing::warn!(adapter, operation, "{}", diagnostic);
            }
            Diagnostic::HandlerPanicked { subscription, .. } => {
                tracing::warn!(subscription = subscription.get(), "{}", diagnostic);
            }
        }
    }
}

/// Keeps every diagnostic in memory, in report order.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything reported so far
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Drain everything reported so far
    pub fn take(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(diagnostic);
        }
    }
}
