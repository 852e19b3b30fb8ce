use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};

static REGISTER_METRICS: Once = Once::new();

pub const RELAY_ROWS_PUBLISHED_TOTAL: &str = "relay_rows_published_total";
pub const RELAY_ROW_FAILURES_TOTAL: &str = "relay_row_failures_total";
pub const RELAY_STREAM_ERRORS_TOTAL: &str = "relay_stream_errors_total";
pub const RELAY_CHECKPOINT_ADVANCES_TOTAL: &str = "relay_checkpoint_advances_total";
pub const RELAY_TASK_RUN_DURATION_SECONDS: &str = "relay_task_run_duration_seconds";
pub const TASK: &str = "task";
pub const STAGE: &str = "stage";
pub const ENCODE: &str = "encode";
pub const PUBLISH: &str = "publish";

/// Registers the metrics emitted by the relay. Safe to call more than once.
pub(crate) fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_counter!(
            RELAY_ROWS_PUBLISHED_TOTAL,
            Unit::Count,
            "Total number of rows published to their topic"
        );

        describe_counter!(
            RELAY_ROW_FAILURES_TOTAL,
            Unit::Count,
            "Total number of rows skipped because encoding or publishing failed"
        );

        describe_counter!(
            RELAY_STREAM_ERRORS_TOTAL,
            Unit::Count,
            "Total number of task runs whose row stream ended with an error"
        );

        describe_counter!(
            RELAY_CHECKPOINT_ADVANCES_TOTAL,
            Unit::Count,
            "Total number of checkpoints written"
        );

        describe_histogram!(
            RELAY_TASK_RUN_DURATION_SECONDS,
            Unit::Seconds,
            "Time taken by a single task run"
        );
    });
}
