//! Replay scripts — recorded flow-event sessions
//!
//! A script is an ordered, finite list of flow events. Scripts load from
//! JSON (an array), JSON Lines (one event per line) or YAML, chosen by file
//! extension, and are validated on load.

use crate::adapter::{FlowEvent, FlowEventKind, GraphSource, Subscription};
use crate::graph::RangeViolation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Errors that can occur while reading, writing or validating a script
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON error on line {line}: {source}")]
    JsonLine {
        line: usize,
        source: serde_json::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported script format: {0}")]
    UnsupportedFormat(String),

    #[error("event {index} ({kind}) is invalid: {reason}")]
    InvalidEvent {
        index: usize,
        kind: FlowEventKind,
        reason: RangeViolation,
    },
}

/// Result type for script operations
pub type ScriptResult<T> = Result<T, ScriptError>;

/// On-disk script encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFormat {
    Json,
    JsonLines,
    Yaml,
}

impl ScriptFormat {
    /// Pick a format from the file extension
    pub fn from_path(path: &Path) -> ScriptResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ScriptError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// An ordered, finite sequence of flow events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script(Vec<FlowEvent>);

impl Script {
    pub fn new(events: Vec<FlowEvent>) -> Self {
        Self(events)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn events(&self) -> &[FlowEvent] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlowEvent> {
        self.0.iter()
    }

    pub fn into_events(self) -> Vec<FlowEvent> {
        self.0
    }

    /// Parse a JSON array, or JSON Lines when the text is not an array.
    /// A leading byte-order mark and blank lines are skipped.
    pub fn from_json_str(text: &str) -> ScriptResult<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        if text.trim_start().starts_with('[') {
            return Ok(serde_json::from_str(text)?);
        }

        let mut events = Vec::new();
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str(line)
                .map_err(|source| ScriptError::JsonLine { line: i + 1, source })?;
            events.push(event);
        }
        Ok(Self(events))
    }

    /// Parse a YAML sequence of events
    pub fn from_yaml_str(text: &str) -> ScriptResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read, parse and validate a script file
    pub fn load(path: impl AsRef<Path>) -> ScriptResult<Self> {
        let path = path.as_ref();
        let format = ScriptFormat::from_path(path)?;
        let text = std::fs::read_to_string(path)?;
        let script = match format {
            ScriptFormat::Json | ScriptFormat::JsonLines => Self::from_json_str(&text)?,
            ScriptFormat::Yaml => Self::from_yaml_str(&text)?,
        };
        script.validate()?;
        tracing::debug!(path = %path.display(), events = script.len(), "script loaded from file");
        Ok(script)
    }

    /// Write the script in the format implied by the extension
    pub fn save(&self, path: impl AsRef<Path>) -> ScriptResult<()> {
        let path = path.as_ref();
        let text = match ScriptFormat::from_path(path)? {
            ScriptFormat::Json => serde_json::to_string_pretty(self)?,
            ScriptFormat::JsonLines => {
                let mut out = String::new();
                for event in &self.0 {
                    out.push_str(&serde_json::to_string(event)?);
                    out.push('\n');
                }
                out
            }
            ScriptFormat::Yaml => serde_yaml::to_string(self)?,
        };
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Check every event; the first bad one is reported with its index.
    pub fn validate(&self) -> ScriptResult<()> {
        for (index, event) in self.0.iter().enumerate() {
            event.check().map_err(|reason| ScriptError::InvalidEvent {
                index,
                kind: event.kind(),
                reason,
            })?;
        }
        Ok(())
    }

    pub fn summary(&self) -> ScriptSummary {
        let mut by_kind = BTreeMap::new();
        let mut out_of_order = 0;
        let mut previous: Option<i64> = None;

        for event in &self.0 {
            *by_kind.entry(event.kind()).or_insert(0) += 1;
            if previous.is_some_and(|p| event.timestamp < p) {
                out_of_order += 1;
            }
            previous = Some(event.timestamp);
        }

        ScriptSummary {
            events: self.0.len(),
            by_kind,
            first_timestamp: self.0.iter().map(|e| e.timestamp).min(),
            last_timestamp: self.0.iter().map(|e| e.timestamp).max(),
            out_of_order,
        }
    }
}

impl From<Vec<FlowEvent>> for Script {
    fn from(events: Vec<FlowEvent>) -> Self {
        Self(events)
    }
}

impl FromIterator<FlowEvent> for Script {
    fn from_iter<I: IntoIterator<Item = FlowEvent>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Script {
    type Item = &'a FlowEvent;
    type IntoIter = std::slice::Iter<'a, FlowEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Counts and time span of a script
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptSummary {
    pub events: usize,
    pub by_kind: BTreeMap<FlowEventKind, usize>,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    /// Events stamped earlier than the event before them
    pub out_of_order: usize,
}

impl ScriptSummary {
    /// Milliseconds between the earliest and latest event
    pub fn span_ms(&self) -> i64 {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => last - first,
            _ => 0,
        }
    }
}

impl std::fmt::Display for ScriptSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} events over {} ms", self.events, self.span_ms())?;
        for (kind, count) in &self.by_kind {
            writeln!(f, "  {:<16} {:>6}", kind.as_str(), count)?;
        }
        if self.out_of_order > 0 {
            writeln!(f, "  warning: {} events out of timestamp order", self.out_of_order)?;
        }
        Ok(())
    }
}

/// Records every event a source delivers, producing a replayable script.
pub struct ScriptRecorder {
    events: Arc<Mutex<Vec<FlowEvent>>>,
    subscription: Subscription,
}

impl ScriptRecorder {
    /// Start recording from `source`
    pub fn attach(source: &dyn GraphSource) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let subscription = source.subscribe(Arc::new(move |event: &FlowEvent| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.clone());
        }));
        Self {
            events,
            subscription,
        }
    }

    /// Number of events recorded so far
    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop recording and return what was captured
    pub fn finish(self) -> Script {
        self.subscription.unsubscribe();
        let events = std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner));
        Script::new(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{EnergyPulse, FlowPayload, HealthUpdate, LinkChange, TraversalStep};
    use crate::graph::{Link, LinkId, NodeId};

    fn pulse(ts: i64, new_energy: f64) -> FlowEvent {
        FlowEvent::at(
            ts,
            FlowPayload::EnergyPulse(EnergyPulse {
                node_id: NodeId::from("n"),
                energy_delta: 0.5,
                new_energy,
            }),
        )
    }

    fn step(ts: i64) -> FlowEvent {
        FlowEvent::at(
            ts,
            FlowPayload::TraversalStep(TraversalStep {
                from_node: NodeId::from("a"),
                to_node: NodeId::from("b"),
                via_link: LinkId::from("ab"),
                energy_transferred: 0.1,
                subentity_id: Some("explorer".to_string()),
            }),
        )
    }

    #[test]
    fn parses_json_array() {
        let script = Script::from_json_str(
            r#"[
                {"type":"energy_pulse","timestamp":1,"payload":{"node_id":"n","energy_delta":1,"new_energy":2}},
                {"type":"health_update","timestamp":2,"payload":{"node_count":1,"link_count":0,"total_energy":2,"active_subentities":0}}
            ]"#,
        )
        .unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.events()[1].kind(), FlowEventKind::HealthUpdate);
    }

    #[test]
    fn parses_json_lines_skipping_blanks() {
        let text = concat!(
            r#"{"type":"node_deleted","timestamp":5,"payload":{"node_id":"gone"}}"#,
            "\n\n",
            r#"{"type":"link_deleted","timestamp":6,"payload":{"link_id":"l"}}"#,
            "\n",
        );
        let script = Script::from_json_str(text).unwrap();
        let kinds: Vec<FlowEventKind> = script.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![FlowEventKind::NodeDeleted, FlowEventKind::LinkDeleted]);
    }

    #[test]
    fn json_lines_error_reports_line_number() {
        let text = "{\"type\":\"node_deleted\",\"timestamp\":5,\"payload\":{\"node_id\":\"a\"}}\nnot json\n";
        match Script::from_json_str(text) {
            Err(ScriptError::JsonLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected JsonLine error, got {:?}", other),
        }
    }

    #[test]
    fn parses_yaml() {
        let yaml = r#"
- type: traversal_step
  timestamp: 10
  payload:
    from_node: a
    to_node: b
    via_link: ab
    energy_transferred: 0.1
"#;
        let script = Script::from_yaml_str(yaml).unwrap();
        assert_eq!(script.len(), 1);
        assert_eq!(script.events()[0].kind(), FlowEventKind::TraversalStep);
    }

    #[test]
    fn json_with_byte_order_mark_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.json");
        let body = serde_json::to_string(&Script::new(vec![pulse(1, 1.0), step(2)])).unwrap();
        std::fs::write(&path, format!("\u{feff}{}", body)).unwrap();

        let script = Script::load(&path).unwrap();
        assert_eq!(script.len(), 2);

        let health = serde_json::to_string(&FlowEvent::at(
            0,
            FlowPayload::HealthUpdate(HealthUpdate::zero()),
        ))
        .unwrap();
        let lines = Script::from_json_str(&format!("\u{feff}{}\n", health)).unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn validate_reports_first_bad_index() {
        let bad_link = Link::new("a", "b").with_id("ab").with_permanence(2.0);
        let script = Script::new(vec![
            pulse(1, 1.0),
            FlowEvent::at(2, FlowPayload::LinkUpdated(LinkChange::from_link(bad_link))),
            pulse(3, -1.0),
        ]);
        match script.validate() {
            Err(ScriptError::InvalidEvent { index, kind, reason }) => {
                assert_eq!(index, 1);
                assert_eq!(kind, FlowEventKind::LinkUpdated);
                assert_eq!(reason.field(), "permanence");
            }
            other => panic!("expected InvalidEvent, got {:?}", other),
        }
    }

    #[test]
    fn summary_counts_kinds_and_disorder() {
        let script = Script::new(vec![pulse(10, 1.0), step(30), pulse(20, 1.0)]);
        let summary = script.summary();
        assert_eq!(summary.events, 3);
        assert_eq!(summary.by_kind[&FlowEventKind::EnergyPulse], 2);
        assert_eq!(summary.by_kind[&FlowEventKind::TraversalStep], 1);
        assert_eq!(summary.span_ms(), 20);
        assert_eq!(summary.out_of_order, 1);
        assert!(summary.to_string().contains("energy_pulse"));
    }

    #[test]
    fn empty_summary_has_zero_span() {
        let summary = Script::default().summary();
        assert_eq!(summary.events, 0);
        assert_eq!(summary.span_ms(), 0);
    }

    #[test]
    fn save_and_load_each_format() {
        let dir = tempfile::tempdir().unwrap();
        let script = Script::new(vec![
            pulse(1, 1.0),
            step(2),
            FlowEvent::at(3, FlowPayload::HealthUpdate(HealthUpdate::zero())),
        ]);

        for name in ["s.json", "s.jsonl", "s.yaml"] {
            let path = dir.path().join(name);
            script.save(&path).unwrap();
            assert_eq!(Script::load(&path).unwrap(), script, "format of {}", name);
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.txt");
        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(
            Script::load(&path),
            Err(ScriptError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn load_rejects_invalid_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let negative = HealthUpdate {
            total_energy: -5.0,
            ..HealthUpdate::zero()
        };
        Script::new(vec![FlowEvent::at(1, FlowPayload::HealthUpdate(negative))])
            .save(&path)
            .unwrap();
        assert!(matches!(
            Script::load(&path),
            Err(ScriptError::InvalidEvent { index: 0, .. })
        ));
    }
}
