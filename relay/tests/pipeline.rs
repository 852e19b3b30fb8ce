use relay::error::ErrorKind;
use relay::pipeline::Pipeline;
use relay::test_utils::runnable::CountingTask;
use std::time::Duration;
use telemetry::init_test_tracing;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn tasks_run_independently_on_their_own_interval() {
    init_test_tracing();

    let fast = CountingTask::new("users", Duration::from_millis(40));
    let slow = CountingTask::new("orders", Duration::from_millis(100))
        .with_run_time(Duration::from_millis(30));

    let mut pipeline = Pipeline::new(vec![fast.clone(), slow.clone()]).unwrap();
    pipeline.start().await.unwrap();

    sleep(Duration::from_millis(210)).await;

    let states = pipeline.runner_states();
    assert_eq!(states.len(), 2);
    assert_eq!(states[0].0, "users");

    pipeline.shutdown_and_wait().await.unwrap();

    // users: 0, 40, 80, 120, 160, 200. orders: 0, 130.
    assert_eq!(fast.started_runs(), 6);
    assert_eq!(slow.started_runs(), 2);
    assert_eq!(slow.finished_runs(), 2);
}

#[tokio::test]
async fn duplicate_task_names_are_rejected() {
    let tasks = vec![
        CountingTask::new("users", Duration::from_millis(10)),
        CountingTask::new("users", Duration::from_millis(20)),
    ];

    let err = Pipeline::new(tasks).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
}

#[tokio::test]
async fn waiting_on_a_pipeline_that_never_started_returns() {
    let pipeline = Pipeline::new(vec![CountingTask::new("users", Duration::from_secs(1))]).unwrap();

    assert!(pipeline.runner_states().is_empty());
    pipeline.wait().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn starting_twice_fails() {
    let mut pipeline =
        Pipeline::new(vec![CountingTask::new("users", Duration::from_secs(1))]).unwrap();
    pipeline.start().await.unwrap();

    let err = pipeline.start().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn external_shutdown_handle_stops_every_runner() {
    init_test_tracing();

    let task = CountingTask::new("users", Duration::from_millis(50));
    let mut pipeline = Pipeline::new(vec![task.clone()]).unwrap();
    let shutdown_tx = pipeline.shutdown_tx();
    pipeline.start().await.unwrap();

    sleep(Duration::from_millis(10)).await;
    shutdown_tx.shutdown();
    pipeline.wait().await.unwrap();

    assert_eq!(task.started_runs(), 1);
}
