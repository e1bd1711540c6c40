//! Circuit breaker + health probe behavior across multiple queues.

use std::sync::Arc;
use std::time::Duration;

use conveyor_core::application::{event_channel, ConsumerScheduler, HealthAggregator, HealthStatus};
use conveyor_core::domain::QueueConfig;
use conveyor_core::port::handler::mocks::MockHandler;
use conveyor_core::port::{HandlerRegistry, QueueClient};
use conveyor_infra_memory::InMemoryQueueClient;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn fast_config(label: &str, max_failures: u32) -> QueueConfig {
    let mut config = QueueConfig::new(label, format!("{}-queue", label));
    config.poll_interval_secs = 0;
    config.failure_backoff_secs = 0;
    config.max_consecutive_failures = max_failures;
    config
}

async fn wait_for(description: &str, condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {}", description);
}

#[tokio::test]
async fn failing_queue_goes_down_without_touching_the_healthy_one() {
    init_tracing();

    let failing_queue = InMemoryQueueClient::new();
    failing_queue.fail_next_receives(2);

    let healthy_queue = InMemoryQueueClient::new();

    let mut registry = HandlerRegistry::new();
    registry.register("failing", Arc::new(MockHandler::new_success()));
    registry.register("healthy", Arc::new(MockHandler::new_success()));

    let (events, events_rx) = event_channel();
    let aggregator = HealthAggregator::new();
    aggregator.spawn_listener(events_rx);

    let clients = [
        ("failing", failing_queue.clone()),
        ("healthy", healthy_queue.clone()),
    ];
    let scheduler = ConsumerScheduler::from_configs(
        vec![fast_config("failing", 2), fast_config("healthy", 2)],
        &registry,
        move |config| {
            let client = clients
                .iter()
                .find(|(label, _)| *label == config.label)
                .map(|(_, client)| client.clone())
                .unwrap();
            Arc::new(client) as Arc<dyn QueueClient>
        },
        events,
    )
    .unwrap();

    scheduler.start();

    let agg = aggregator.clone();
    wait_for("failing queue stopped, healthy queue started", || {
        let report = agg.report();
        report.status == HealthStatus::Down && report.started == vec!["healthy"]
    })
    .await;

    let report = aggregator.report();
    assert_eq!(report.stopped, vec!["failing"]);
    assert_eq!(report.started, vec!["healthy"]);

    // Driving one queue to disablement leaves the other untouched
    let failing = scheduler
        .consumers()
        .iter()
        .find(|c| c.label() == "failing")
        .unwrap();
    let healthy = scheduler
        .consumers()
        .iter()
        .find(|c| c.label() == "healthy")
        .unwrap();

    assert!(!failing.is_enabled());
    assert!(healthy.is_enabled());
    assert_eq!(healthy.consecutive_failures(), 0);

    scheduler.shutdown();
    scheduler.join().await;
}

#[tokio::test]
async fn transient_failures_below_threshold_keep_the_queue_up() {
    init_tracing();

    let queue = InMemoryQueueClient::new();
    queue.fail_next_receives(2);
    queue.push("survives the hiccup");

    let handler = Arc::new(MockHandler::new_success());
    let mut registry = HandlerRegistry::new();
    registry.register("sturdy", handler.clone());

    let (events, events_rx) = event_channel();
    let aggregator = HealthAggregator::new();
    aggregator.spawn_listener(events_rx);

    let client = queue.clone();
    let scheduler = ConsumerScheduler::from_configs(
        vec![fast_config("sturdy", 3)],
        &registry,
        move |_| Arc::new(client.clone()) as Arc<dyn QueueClient>,
        events,
    )
    .unwrap();

    scheduler.start();

    let consumer = &scheduler.consumers()[0];
    wait_for("message handled and failure count reset", || {
        handler.call_count() == 1 && consumer.consecutive_failures() == 0
    })
    .await;

    assert!(consumer.is_enabled());
    assert!(aggregator.report().is_up());

    scheduler.shutdown();
    scheduler.join().await;
}

#[tokio::test]
async fn down_status_latches_for_the_rest_of_the_run() {
    init_tracing();

    let queue = InMemoryQueueClient::new();
    queue.fail_next_receives(1);

    let mut registry = HandlerRegistry::new();
    registry.register("flaky", Arc::new(MockHandler::new_success()));

    let (events, events_rx) = event_channel();
    let aggregator = HealthAggregator::new();
    aggregator.spawn_listener(events_rx);

    let client = queue.clone();
    let scheduler = ConsumerScheduler::from_configs(
        vec![fast_config("flaky", 1)],
        &registry,
        move |_| Arc::new(client.clone()) as Arc<dyn QueueClient>,
        events,
    )
    .unwrap();

    scheduler.start();
    scheduler.join().await;

    // The worker published its events before exiting; give the listener
    // time to apply them
    let agg = aggregator.clone();
    wait_for("stopped event applied", || {
        agg.report().status == HealthStatus::Down
    })
    .await;

    let report = aggregator.report();
    assert_eq!(report.status, HealthStatus::Down);
    assert_eq!(report.stopped, vec!["flaky"]);
    assert!(report.started.is_empty());

    // Disablement is terminal: the queue would succeed now, but never polls again
    assert_eq!(queue.pending_count(), 0);
    queue.push("too late");
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(queue.pending_count(), 1);
    assert_eq!(aggregator.report().status, HealthStatus::Down);
}
