//! End-to-end tests for the coordinator against scripted producers.

#[cfg(test)]
mod tests {
    use crate::cancellation::CancellationToken;
    use crate::config::RelayConfig;
    use crate::contracts::ContractValidator;
    use crate::coordinator::{Coordinator, EMPTY_ERROR_MESSAGE};
    use crate::core::{EventKind, StreamEvent};
    use crate::errors::ConfigError;
    use crate::events::{names, CollectingEventSink};
    use crate::producer::{ProducerRegistry, ProducerRequest};
    use crate::reliability::RetryPolicy;
    use crate::testing::{
        assert_ends_with_error, assert_kinds, assert_no_error, assert_well_formed,
        collect_events, fast_policy, ScriptStep, ScriptedProducer,
    };
    use futures::StreamExt;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready_eq};

    fn coordinator(producer: &Arc<ScriptedProducer>, max_attempts: usize) -> Coordinator {
        Coordinator::new(producer.clone()).with_policy(fast_policy(max_attempts))
    }

    async fn run(coordinator: &Coordinator) -> Vec<StreamEvent> {
        collect_events(coordinator.invoke(ProducerRequest::prompt("hello"), None)).await
    }

    #[tokio::test]
    async fn test_happy_path_relays_events_verbatim() {
        let events = vec![
            StreamEvent::thinking("planning"),
            StreamEvent::data("Hello, "),
            StreamEvent::tool_call("search", Some("{\"q\":\"rust\"}".to_string())),
            StreamEvent::data("world"),
            StreamEvent::terminal_result("corr-1"),
        ];
        let producer = Arc::new(ScriptedProducer::new("mock").then_emit(events.clone()));

        let output = run(&coordinator(&producer, 3)).await;

        assert_eq!(output, events);
        assert_eq!(producer.invocations(), 1);
    }

    #[tokio::test]
    async fn test_attempt_budget_is_exhausted_exactly() {
        let producer = Arc::new(ScriptedProducer::new("mock").then_fail("socket hang up"));

        let output = run(&coordinator(&producer, 3)).await;

        let message = assert_ends_with_error(&output);
        assert_eq!(output.len(), 1);
        assert_eq!(producer.invocations(), 3);
        assert_eq!(
            message,
            "mock failed after 3 attempts, last error: socket hang up"
        );
    }

    #[tokio::test]
    async fn test_second_attempt_succeeds() {
        let producer = Arc::new(
            ScriptedProducer::new("mock")
                .then_fail("ECONNRESET")
                .then_emit(vec![StreamEvent::data("recovered")]),
        );

        let output = run(&coordinator(&producer, 3)).await;

        assert_eq!(output, vec![StreamEvent::data("recovered")]);
        assert_eq!(producer.invocations(), 2);
    }

    #[tokio::test]
    async fn test_terminal_failure_is_not_retried() {
        let producer = Arc::new(ScriptedProducer::new("mock").then_fail("401 unauthorized"));

        let output = run(&coordinator(&producer, 5)).await;

        let message = assert_ends_with_error(&output);
        assert_eq!(producer.invocations(), 1);
        assert_eq!(
            message,
            "mock failed with a non-retryable error: 401 unauthorized"
        );
    }

    #[tokio::test]
    async fn test_failure_after_first_event_is_reported_not_retried() {
        let producer = Arc::new(ScriptedProducer::new("mock").then(vec![
            ScriptStep::Emit(StreamEvent::data("partial")),
            ScriptStep::Fail("socket hang up".to_string()),
        ]));

        let output = run(&coordinator(&producer, 5)).await;

        let message = assert_ends_with_error(&output);
        assert_eq!(output[0], StreamEvent::data("partial"));
        assert_eq!(output.len(), 2);
        assert_eq!(producer.invocations(), 1);
        assert_eq!(message, "mock failed mid-stream: socket hang up");
    }

    #[tokio::test]
    async fn test_in_band_error_during_setup_is_classified() {
        let producer = Arc::new(
            ScriptedProducer::new("mock")
                .then_emit(vec![StreamEvent::error("upstream overloaded")])
                .then_emit(vec![StreamEvent::error("model gpt-9 does not exist")]),
        );

        let output = run(&coordinator(&producer, 5)).await;

        let message = assert_ends_with_error(&output);
        assert_eq!(producer.invocations(), 2);
        assert!(message.contains("non-retryable"), "{message}");
        assert!(message.contains("model gpt-9 does not exist"), "{message}");
    }

    #[tokio::test]
    async fn test_empty_in_band_error_uses_default_message() {
        let producer = Arc::new(
            ScriptedProducer::new("mock").then_emit(vec![StreamEvent::new(EventKind::Error)]),
        );

        let output = run(&coordinator(&producer, 2)).await;

        let message = assert_ends_with_error(&output);
        assert_eq!(producer.invocations(), 2);
        assert!(message.ends_with(EMPTY_ERROR_MESSAGE), "{message}");
    }

    #[tokio::test]
    async fn test_in_band_error_during_relay_ends_sequence() {
        let producer = Arc::new(ScriptedProducer::new("mock").then_emit(vec![
            StreamEvent::data("a"),
            StreamEvent::error("tool crashed"),
            StreamEvent::data("never relayed"),
        ]));

        let output = run(&coordinator(&producer, 3)).await;

        assert_kinds(&output, &[EventKind::Data, EventKind::Error]);
        assert_eq!(
            assert_ends_with_error(&output),
            "mock failed mid-stream: tool crashed"
        );
        assert_eq!(producer.invocations(), 1);
    }

    #[tokio::test]
    async fn test_contract_violation_is_always_terminal() {
        // The kind name alone would classify as retryable.
        let unknown = StreamEvent::new(EventKind::Unknown("timeout".to_string()));
        let producer = Arc::new(ScriptedProducer::new("mock").then_emit(vec![unknown]));

        let output = run(&coordinator(&producer, 5)).await;

        let message = assert_ends_with_error(&output);
        assert_eq!(output.len(), 1);
        assert_eq!(producer.invocations(), 1);
        assert!(message.contains("contract validation failed"), "{message}");
    }

    #[tokio::test]
    async fn test_terminal_result_without_correlation_id_is_terminal() {
        let producer = Arc::new(
            ScriptedProducer::new("mock")
                .then_emit(vec![StreamEvent::new(EventKind::TerminalResult)]),
        );

        let output = run(&coordinator(&producer, 5)).await;

        let message = assert_ends_with_error(&output);
        assert_eq!(producer.invocations(), 1);
        assert!(message.contains("missing a correlation id"), "{message}");
    }

    #[tokio::test]
    async fn test_contract_violation_during_relay() {
        let producer = Arc::new(ScriptedProducer::new("mock").then_emit(vec![
            StreamEvent::data("a"),
            StreamEvent::terminal_result(""),
        ]));

        let output = run(&coordinator(&producer, 3)).await;

        assert_kinds(&output, &[EventKind::Data, EventKind::Error]);
        assert_eq!(producer.invocations(), 1);
    }

    #[tokio::test]
    async fn test_disabled_validator_relays_unknown_kinds() {
        let unknown = StreamEvent::new(EventKind::Unknown("telepathy".to_string()));
        let producer = Arc::new(ScriptedProducer::new("mock").then_emit(vec![unknown.clone()]));
        let coordinator = coordinator(&producer, 3).with_validator(ContractValidator::disabled());

        let output = run(&coordinator).await;

        assert_eq!(output, vec![unknown]);
    }

    #[tokio::test]
    async fn test_empty_producer_completes_silently() {
        let producer = Arc::new(ScriptedProducer::new("mock"));
        let sink = Arc::new(CollectingEventSink::new());
        let coordinator = coordinator(&producer, 3).with_sink(sink.clone());

        let output = run(&coordinator).await;

        assert!(output.is_empty());
        assert_eq!(producer.invocations(), 1);
        assert_eq!(
            sink.names(),
            vec![names::ATTEMPT_STARTED, names::COMPLETED]
        );
    }

    #[tokio::test]
    async fn test_no_double_output_across_scripts() {
        let scripts: Vec<Vec<ScriptStep>> = vec![
            vec![ScriptStep::Fail("glitch".into())],
            vec![ScriptStep::Fail("403 forbidden".into())],
            vec![ScriptStep::Emit(StreamEvent::error("glitch"))],
            vec![
                ScriptStep::Emit(StreamEvent::data("x")),
                ScriptStep::Fail("glitch".into()),
            ],
            vec![
                ScriptStep::Emit(StreamEvent::data("x")),
                ScriptStep::Emit(StreamEvent::error("late")),
                ScriptStep::Emit(StreamEvent::data("y")),
            ],
            vec![ScriptStep::Emit(StreamEvent::data("x"))],
        ];

        for first in &scripts {
            for second in &scripts {
                let producer = Arc::new(
                    ScriptedProducer::new("mock")
                        .then(first.clone())
                        .then(second.clone()),
                );
                let output = run(&coordinator(&producer, 2)).await;
                assert_well_formed(&output);
                assert!(producer.invocations() <= 2);
            }
        }
    }

    #[tokio::test]
    async fn test_retry_boundary_holds_once_output_flows() {
        let producer = Arc::new(
            ScriptedProducer::new("mock")
                .then(vec![
                    ScriptStep::Emit(StreamEvent::system_note("connected")),
                    ScriptStep::Fail("ECONNRESET".to_string()),
                ])
                .then_emit(vec![StreamEvent::data("second run")]),
        );

        let output = run(&coordinator(&producer, 5)).await;

        assert_eq!(output[0], StreamEvent::system_note("connected"));
        assert_ends_with_error(&output);
        assert_eq!(producer.invocations(), 1);
    }

    #[tokio::test]
    async fn test_resume_token_reaches_every_attempt() {
        let producer = Arc::new(
            ScriptedProducer::new("mock")
                .then_fail("network unreachable")
                .then_emit(vec![StreamEvent::data("ok")]),
        );

        let stream = coordinator(&producer, 3)
            .invoke(ProducerRequest::prompt("hi"), Some("resume-42".to_string()));
        let output = collect_events(stream).await;

        assert_no_error(&output);
        assert_eq!(
            producer.resume_tokens(),
            vec![Some("resume-42".to_string()), Some("resume-42".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_precedes_remaining_attempts() {
        let producer = Arc::new(ScriptedProducer::new("slow").then(vec![
            ScriptStep::Delay(Duration::from_secs(10)),
            ScriptStep::Emit(StreamEvent::data("too late")),
        ]));
        let policy = RetryPolicy::new()
            .with_max_attempts(5)
            .with_backoff(false)
            .with_timeout_ms(200);
        // Window is max(200, 6 * 500) = 3000ms.
        assert_eq!(policy.retry_window(), Duration::from_millis(3000));
        let coordinator = Coordinator::new(producer.clone()).with_policy(policy);

        let started = tokio::time::Instant::now();
        let output = run(&coordinator).await;

        let message = assert_ends_with_error(&output);
        assert_eq!(message, "slow timed out after 3000ms waiting for its first event");
        assert_eq!(producer.invocations(), 1);
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
        assert!(producer.cancel_tokens()[0].is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_producer_cancelling_its_own_token_is_still_retried() {
        let producer = Arc::new(
            ScriptedProducer::new("selfcancel")
                .then(vec![
                    ScriptStep::Cancel("producer-internal abort".to_string()),
                    ScriptStep::Fail("socket hang up".to_string()),
                ])
                .then_emit(vec![StreamEvent::data("recovered")]),
        );

        let output = run(&coordinator(&producer, 3)).await;

        assert_eq!(output, vec![StreamEvent::data("recovered")]);
        assert_eq!(producer.invocations(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_self_cancelled_failures_exhaust_attempts_not_time() {
        let producer = Arc::new(ScriptedProducer::new("selfcancel").then(vec![
            ScriptStep::Cancel("producer-internal abort".to_string()),
            ScriptStep::Fail("socket hang up".to_string()),
        ]));

        let output = run(&coordinator(&producer, 3)).await;

        let message = assert_ends_with_error(&output);
        assert_eq!(
            message,
            "selfcancel failed after 3 attempts, last error: socket hang up"
        );
        assert_eq!(producer.invocations(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_interrupts_backoff_sleep() {
        let producer = Arc::new(ScriptedProducer::new("mock").then_fail("glitch"));
        let policy = RetryPolicy::new()
            .with_max_attempts(3)
            .with_backoff(false)
            .with_base_delay_ms(5_000)
            .with_max_delay_ms(5_000);
        let coordinator = Coordinator::new(producer.clone()).with_policy(policy);

        let output = run(&coordinator).await;

        let message = assert_ends_with_error(&output);
        assert!(message.contains("timed out after 2000ms"), "{message}");
        assert_eq!(producer.invocations(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_is_disarmed_after_first_event() {
        let producer = Arc::new(ScriptedProducer::new("mock").then(vec![
            ScriptStep::Emit(StreamEvent::data("first")),
            ScriptStep::Delay(Duration::from_secs(120)),
            ScriptStep::Emit(StreamEvent::data("second")),
        ]));

        let output = run(&coordinator(&producer, 3)).await;

        assert_eq!(
            output,
            vec![StreamEvent::data("first"), StreamEvent::data("second")]
        );
        assert!(!producer.cancel_tokens()[0].is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_stream_releases_deadline() {
        let producer = Arc::new(ScriptedProducer::new("mock").then(vec![
            ScriptStep::Delay(Duration::from_millis(10)),
            ScriptStep::Emit(StreamEvent::data("first")),
        ]));
        let mut stream = coordinator(&producer, 3).invoke(ProducerRequest::prompt("hi"), None);

        let mut task = tokio_test::task::spawn(stream.next());
        assert_pending!(task.poll());
        drop(task);
        drop(stream);

        tokio::time::advance(Duration::from_secs(600)).await;
        let token: Arc<CancellationToken> = producer.cancel_tokens()[0].clone();
        assert!(!token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_is_pending_until_producer_delivers() {
        let producer = Arc::new(ScriptedProducer::new("mock").then(vec![
            ScriptStep::Delay(Duration::from_millis(100)),
            ScriptStep::Emit(StreamEvent::data("late")),
        ]));
        let stream = coordinator(&producer, 3).invoke(ProducerRequest::prompt("hi"), None);
        let mut task = tokio_test::task::spawn(stream);

        assert_pending!(task.poll_next());
        tokio::time::advance(Duration::from_millis(150)).await;
        assert_ready_eq!(task.poll_next(), Some(StreamEvent::data("late")));
    }

    #[tokio::test]
    async fn test_lifecycle_events_for_retry_then_success() {
        let producer = Arc::new(
            ScriptedProducer::new("mock")
                .then_fail("timeout")
                .then_emit(vec![StreamEvent::data("ok")]),
        );
        let sink = Arc::new(CollectingEventSink::new());
        let coordinator = coordinator(&producer, 3).with_sink(sink.clone());

        run(&coordinator).await;

        assert_eq!(
            sink.names(),
            vec![
                names::ATTEMPT_STARTED,
                names::ATTEMPT_FAILED,
                names::RETRY_SCHEDULED,
                names::ATTEMPT_STARTED,
                names::FIRST_EVENT,
                names::COMPLETED,
            ]
        );
        let failed = sink.events_named(names::ATTEMPT_FAILED);
        assert_eq!(failed[0].attempt, Some(1));
        assert_eq!(failed[0].detail.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_from_config_selects_registered_producer() {
        let registry = ProducerRegistry::new();
        registry.register(Arc::new(
            ScriptedProducer::new("primary").then_emit(vec![StreamEvent::data("hi")]),
        ));

        let mut config = RelayConfig::default();
        config.producer = Some("primary".to_string());
        config.retry = fast_policy(2);
        config.validate_contract = false;

        let coordinator = Coordinator::from_config(&config, &registry).unwrap();
        assert_eq!(coordinator.producer_name(), "primary");
        assert_eq!(coordinator.policy().max_attempts, 2);
        assert!(!coordinator.validator().is_enabled());
        assert_eq!(run(&coordinator).await, vec![StreamEvent::data("hi")]);

        config.producer = Some("missing".to_string());
        let err = Coordinator::from_config(&config, &registry).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProducer { .. }));

        config.producer = None;
        let err = Coordinator::from_config(&config, &registry).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
