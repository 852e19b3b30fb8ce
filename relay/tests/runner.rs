use relay::concurrency::shutdown::create_shutdown_channel;
use relay::error::ErrorKind;
use relay::test_utils::runnable::CountingTask;
use relay::workers::base::{Worker, WorkerHandle};
use relay::workers::runner::{TaskRunner, TaskRunnerState};
use std::sync::Arc;
use std::time::Duration;
use telemetry::init_test_tracing;
use tokio::time::{Instant, sleep};

#[tokio::test(start_paused = true)]
async fn runs_immediately_then_on_every_tick() {
    init_test_tracing();

    let task = CountingTask::new("users", Duration::from_millis(50));
    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

    let handle = TaskRunner::new(Arc::new(task.clone()), shutdown_rx)
        .start()
        .await
        .unwrap();

    sleep(Duration::from_millis(175)).await;
    shutdown_tx.shutdown();
    handle.wait().await.unwrap();

    // Runs at 0, 50, 100 and 150 ms.
    assert_eq!(task.started_runs(), 4);
    assert_eq!(task.finished_runs(), 4);
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_a_run_lets_it_complete() {
    init_test_tracing();

    let task = CountingTask::new("users", Duration::from_millis(250))
        .with_run_time(Duration::from_millis(120));
    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let started = Instant::now();

    let handle = TaskRunner::new(Arc::new(task.clone()), shutdown_rx)
        .start()
        .await
        .unwrap();

    sleep(Duration::from_millis(60)).await;
    assert_eq!(task.started_runs(), 1);
    assert_eq!(task.finished_runs(), 0);

    shutdown_tx.shutdown();
    handle.wait().await.unwrap();

    assert_eq!(task.started_runs(), 1);
    assert_eq!(task.finished_runs(), 1);
    assert!(started.elapsed() >= Duration::from_millis(120));
    assert!(started.elapsed() < Duration::from_millis(250));

    // No tick fires once the runner has returned.
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(task.started_runs(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_runs_never_overlap() {
    init_test_tracing();

    let task = CountingTask::new("users", Duration::from_millis(50))
        .with_run_time(Duration::from_millis(80));
    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

    let handle = TaskRunner::new(Arc::new(task.clone()), shutdown_rx)
        .start()
        .await
        .unwrap();

    for _ in 0..20 {
        sleep(Duration::from_millis(15)).await;
        let in_flight = task.started_runs() - task.finished_runs();
        assert!(in_flight <= 1, "{in_flight} runs in flight");
    }

    shutdown_tx.shutdown();
    handle.wait().await.unwrap();

    assert!(task.started_runs() >= 2);
    assert_eq!(task.started_runs(), task.finished_runs());
}

#[tokio::test(start_paused = true)]
async fn shutdown_before_start_skips_every_run() {
    init_test_tracing();

    let task = CountingTask::new("users", Duration::from_millis(50));
    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    shutdown_tx.shutdown();

    let handle = TaskRunner::new(Arc::new(task.clone()), shutdown_rx)
        .start()
        .await
        .unwrap();
    handle.wait().await.unwrap();

    assert_eq!(task.started_runs(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_runs_do_not_stop_the_runner() {
    init_test_tracing();

    let task = CountingTask::new("users", Duration::from_millis(50)).failing();
    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

    let handle = TaskRunner::new(Arc::new(task.clone()), shutdown_rx)
        .start()
        .await
        .unwrap();

    sleep(Duration::from_millis(75)).await;
    assert_eq!(
        handle.state(),
        TaskRunnerState {
            runs: 2,
            failed_runs: 2
        }
    );

    shutdown_tx.shutdown();
    handle.wait().await.unwrap();
}

#[tokio::test]
async fn zero_interval_is_rejected() {
    let task = CountingTask::new("users", Duration::ZERO);
    let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();

    let err = TaskRunner::new(Arc::new(task), shutdown_rx)
        .start()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
}
