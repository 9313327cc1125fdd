//! Stage execution metrics
//!
//! 每个阶段调度、结束以及整条管道结束时记录指标。

use std::time::Duration;

use contracts::Stage;
use metrics::{counter, gauge, histogram};

/// Record a stage dispatch
pub fn record_stage_started(stage: Stage) {
    counter!("ml_pipeline_stage_started_total", "stage" => stage.as_str()).increment(1);
    gauge!("ml_pipeline_current_stage_position").set(stage.position() as f64);
}

/// Record a stage completion (success or failure)
pub fn record_stage_finished(stage: Stage, success: bool, elapsed: Duration) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "ml_pipeline_stage_finished_total",
        "stage" => stage.as_str(),
        "status" => status
    )
    .increment(1);

    histogram!("ml_pipeline_stage_duration_seconds", "stage" => stage.as_str())
        .record(elapsed.as_secs_f64());
}

/// Record the terminal state of one pipeline invocation
pub fn record_pipeline_finished(status: &'static str, stages_run: usize, elapsed: Duration) {
    counter!("ml_pipeline_runs_total", "status" => status).increment(1);
    gauge!("ml_pipeline_last_run_stages").set(stages_run as f64);
    histogram!("ml_pipeline_run_duration_seconds").record(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        // 未安装 recorder 时宏调用应当静默
        record_stage_started(Stage::Download);
        record_stage_finished(Stage::Download, true, Duration::from_millis(10));
        record_pipeline_finished("completed", 1, Duration::from_millis(10));
    }
}
