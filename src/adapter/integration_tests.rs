//! Integration tests for replay stepping, subscriptions and disconnect

#[cfg(test)]
mod tests {
    use crate::adapter::diagnostics::CollectingDiagnostics;
    use crate::adapter::events::{
        EnergyPulse, FlowEvent, FlowEventKind, FlowPayload, HealthUpdate, NodeChange,
        TraversalStep,
    };
    use crate::adapter::local::LocalAdapter;
    use crate::adapter::stepper::StepperState;
    use crate::adapter::traits::{GraphSource, Replayable};
    use crate::config::LocalAdapterConfig;
    use crate::graph::{LinkId, Node, NodeId, NodeType};
    use crate::script::Script;
    use std::sync::{Arc, Mutex};

    fn pulse(ts: i64) -> FlowEvent {
        FlowEvent::at(
            ts,
            FlowPayload::EnergyPulse(EnergyPulse {
                node_id: NodeId::from("n"),
                energy_delta: 0.5,
                new_energy: 1.0,
            }),
        )
    }

    fn traversal(ts: i64) -> FlowEvent {
        FlowEvent::at(
            ts,
            FlowPayload::TraversalStep(TraversalStep {
                from_node: NodeId::from("a"),
                to_node: NodeId::from("b"),
                via_link: LinkId::from("ab"),
                energy_transferred: 0.2,
                subentity_id: None,
            }),
        )
    }

    fn created(ts: i64, id: &str) -> FlowEvent {
        FlowEvent::at(
            ts,
            FlowPayload::NodeCreated(NodeChange::from_node(
                Node::new(id, NodeType::Thing).with_id(id),
            )),
        )
    }

    fn adapter() -> LocalAdapter {
        LocalAdapter::with_diagnostics(
            LocalAdapterConfig::default(),
            Arc::new(CollectingDiagnostics::new()),
        )
    }

    fn recorder(adapter: &LocalAdapter) -> (crate::adapter::Subscription, Arc<Mutex<Vec<FlowEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = adapter.subscribe_fn(move |e| sink.lock().unwrap().push(e.clone()));
        (sub, seen)
    }

    /// Drive a replay to exhaustion, returning (event, has_more) per step.
    async fn drain(replay: &dyn Replayable) -> Vec<(FlowEvent, bool)> {
        let mut steps = Vec::new();
        loop {
            let step = replay.next_step().await.unwrap();
            steps.push((step.event, step.has_more));
            if !step.has_more {
                break;
            }
        }
        steps
    }

    // ================================================================
    // Stepping
    // ================================================================

    // === Scenario: two-event script, then terminal results ===
    #[tokio::test]
    async fn two_event_script_then_terminal() {
        let adapter = adapter();
        let e1 = pulse(1);
        let e2 = traversal(2);
        adapter.load_script(Script::new(vec![e1.clone(), e2.clone()])).await;

        let s1 = adapter.next_step().await.unwrap();
        assert_eq!(s1.event, e1);
        assert!(s1.has_more);

        let s2 = adapter.next_step().await.unwrap();
        assert_eq!(s2.event, e2);
        assert!(!s2.has_more);

        let s3 = adapter.next_step().await.unwrap();
        assert_eq!(s3.event.kind(), FlowEventKind::HealthUpdate);
        assert_eq!(s3.event.payload, FlowPayload::HealthUpdate(HealthUpdate::zero()));
        assert!(!s3.has_more);
    }

    // === Scenario: N events give N-1 has_more=true, then repeated terminal ===
    #[tokio::test]
    async fn has_more_is_true_on_all_but_last_step() {
        for n in 0..6i64 {
            let adapter = adapter();
            adapter.load_script((0..n).map(pulse).collect()).await;

            let mut flags = Vec::new();
            for _ in 0..n {
                flags.push(adapter.next_step().await.unwrap().has_more);
            }
            let expected: Vec<bool> = (0..n).map(|i| i < n - 1).collect();
            assert_eq!(flags, expected, "script of length {}", n);

            for _ in 0..3 {
                let step = adapter.next_step().await.unwrap();
                assert!(step.event.is_terminal());
                assert!(!step.has_more);
            }
        }
    }

    // === Scenario: empty script is immediately exhausted ===
    #[tokio::test]
    async fn empty_script_returns_terminal_immediately() {
        let adapter = adapter();
        let (_sub, seen) = recorder(&adapter);
        adapter.load_script(Script::default()).await;
        assert_eq!(adapter.stepper_state().await, StepperState::Empty);

        let step = adapter.next_step().await.unwrap();
        assert!(!step.has_more);
        assert!(step.event.is_terminal());
        assert!(seen.lock().unwrap().is_empty());
    }

    // === Scenario: restart reproduces a fresh load ===
    #[tokio::test]
    async fn restart_replays_identically() {
        let script = Script::new(vec![created(1, "a"), pulse(2), traversal(3)]);

        let fresh = adapter();
        fresh.load_script(script.clone()).await;
        let expected = drain(&fresh).await;

        let adapter = adapter();
        adapter.load_script(script).await;
        adapter.next_step().await.unwrap();
        adapter.next_step().await.unwrap();
        adapter.restart().await;
        let replayed = drain(&adapter).await;

        assert_eq!(replayed, expected);

        // Restart after exhaustion behaves the same
        adapter.next_step().await.unwrap();
        adapter.restart().await;
        assert_eq!(drain(&adapter).await, expected);
    }

    // === Scenario: restart keeps subscribers and emits nothing itself ===
    #[tokio::test]
    async fn restart_keeps_subscribers() {
        let adapter = adapter();
        let (_sub, seen) = recorder(&adapter);
        adapter.load_script(Script::new(vec![pulse(1)])).await;

        adapter.next_step().await.unwrap();
        adapter.restart().await;
        assert_eq!(seen.lock().unwrap().len(), 1);

        adapter.next_step().await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    // === Scenario: loading a script emits nothing ===
    #[tokio::test]
    async fn load_script_does_not_emit() {
        let adapter = adapter();
        let (_sub, seen) = recorder(&adapter);
        adapter.load_script(Script::new(vec![pulse(1), pulse(2)])).await;
        assert!(seen.lock().unwrap().is_empty());
    }

    // ================================================================
    // Subscriptions
    // ================================================================

    // === Scenario: subscribe, load one event, step -> handler sees it once ===
    #[tokio::test]
    async fn subscriber_receives_step_exactly_once() {
        let adapter = adapter();
        let (_sub, seen) = recorder(&adapter);
        let e1 = pulse(1);
        adapter.load_script(Script::new(vec![e1.clone()])).await;

        adapter.next_step().await.unwrap();
        adapter.next_step().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![e1]);
    }

    // === Scenario: unsubscribed handler receives nothing further ===
    #[tokio::test]
    async fn unsubscribe_before_step_stops_delivery() {
        let adapter = adapter();
        let (sub, seen) = recorder(&adapter);
        adapter.load_script(Script::new(vec![pulse(1), pulse(2)])).await;

        adapter.next_step().await.unwrap();
        sub.unsubscribe();
        sub.unsubscribe();
        adapter.next_step().await.unwrap();

        let timestamps: Vec<i64> = seen.lock().unwrap().iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![1]);
    }

    // === Scenario: late subscriber does not see earlier events ===
    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let adapter = adapter();
        adapter.load_script(Script::new(vec![pulse(1), pulse(2), pulse(3)])).await;
        adapter.next_step().await.unwrap();

        let (_sub, seen) = recorder(&adapter);
        adapter.next_step().await.unwrap();
        adapter.next_step().await.unwrap();

        let timestamps: Vec<i64> = seen.lock().unwrap().iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![2, 3]);
    }

    // === Scenario: every subscriber receives each event, in registration order ===
    #[tokio::test]
    async fn all_subscribers_notified_in_registration_order() {
        let adapter = adapter();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in 0..3 {
            let order = order.clone();
            adapter.subscribe_fn(move |e| order.lock().unwrap().push((e.timestamp, tag)));
        }
        adapter.load_script(Script::new(vec![pulse(1), pulse(2)])).await;
        drain(&adapter).await;

        assert_eq!(
            *order.lock().unwrap(),
            vec![(1, 0), (1, 1), (1, 2), (2, 0), (2, 1), (2, 2)]
        );
    }

    // === Scenario: a panicking subscriber does not stop the replay ===
    #[tokio::test]
    async fn panicking_subscriber_is_isolated() {
        let diagnostics = Arc::new(CollectingDiagnostics::new());
        let adapter =
            LocalAdapter::with_diagnostics(LocalAdapterConfig::default(), diagnostics.clone());
        adapter.subscribe_fn(|_| panic!("handler failure"));
        let (_sub, seen) = recorder(&adapter);

        adapter.load_script(Script::new(vec![pulse(1)])).await;
        let step = adapter.next_step().await.unwrap();

        assert_eq!(step.event.timestamp, 1);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(diagnostics.entries().iter().any(|d| matches!(
            d,
            crate::adapter::Diagnostic::HandlerPanicked { message, .. } if message == "handler failure"
        )));
    }

    // ================================================================
    // Disconnect
    // ================================================================

    // === Scenario: disconnect clears subscribers and script ===
    #[tokio::test]
    async fn disconnect_clears_subscribers_and_script() {
        let adapter = adapter();
        let (sub, seen) = recorder(&adapter);
        adapter.load_script(Script::new(vec![pulse(1), pulse(2)])).await;
        adapter.next_step().await.unwrap();

        adapter.disconnect().await;
        assert!(!sub.is_active());
        assert_eq!(adapter.stepper_state().await, StepperState::Empty);

        let step = adapter.next_step().await.unwrap();
        assert!(step.event.is_terminal());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    // === Scenario: adapter is reusable after disconnect ===
    #[tokio::test]
    async fn reload_after_disconnect_replays_to_new_subscribers_only() {
        let adapter = adapter();
        let (_old, old_seen) = recorder(&adapter);
        adapter.load_script(Script::new(vec![pulse(1)])).await;
        adapter.disconnect().await;

        let (_new, new_seen) = recorder(&adapter);
        adapter.load_script(Script::new(vec![pulse(1), pulse(2)])).await;
        let steps = drain(&adapter).await;

        assert_eq!(steps.len(), 2);
        assert!(old_seen.lock().unwrap().is_empty());
        assert_eq!(new_seen.lock().unwrap().len(), 2);
    }

    // ================================================================
    // Capability query
    // ================================================================

    struct LiveOnly;

    #[async_trait::async_trait]
    impl GraphSource for LiveOnly {
        fn id(&self) -> &str {
            "live-only"
        }
        async fn get_nodes(&self) -> Result<Vec<Node>, crate::adapter::SourceError> {
            Ok(vec![Node::new("x", NodeType::Space).with_id("x")])
        }
        async fn get_links(&self) -> Result<Vec<crate::graph::Link>, crate::adapter::SourceError> {
            Ok(Vec::new())
        }
        async fn search(
            &self,
            _query: &str,
            _opts: &crate::adapter::SearchOpts,
        ) -> Result<Vec<crate::adapter::SearchResult>, crate::adapter::SourceError> {
            Ok(Vec::new())
        }
        fn subscribe(&self, _handler: crate::adapter::EventHandler) -> crate::adapter::Subscription {
            crate::adapter::SubscriberRegistry::new().subscribe(Arc::new(|_: &FlowEvent| {}))
        }
        async fn disconnect(&self) {}
    }

    // === Scenario: sources without a stepper report live mode ===
    #[tokio::test]
    async fn sources_are_queried_for_replay_capability() {
        let sources: Vec<Box<dyn GraphSource>> = vec![Box::new(adapter()), Box::new(LiveOnly)];
        let modes: Vec<(&str, bool)> = sources
            .iter()
            .map(|s| (s.id(), s.as_replayable().is_some()))
            .collect();
        assert_eq!(modes, vec![("LocalAdapter", true), ("live-only", false)]);

        let snapshot = sources[1].snapshot().await.unwrap();
        assert_eq!(snapshot.nodes.len(), 1);
    }
}
