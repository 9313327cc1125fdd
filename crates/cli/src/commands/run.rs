//! Pipeline run with graceful interruption.

use contracts::StageRunner;
use orchestrator::Orchestrator;
use tracing::{info, warn};

use crate::error::{CliError, Result};
use crate::pipeline::print_summary;

/// Run the pipeline until it completes, fails, or is interrupted.
///
/// Interruption drops the in-flight run, which kills the stage process and
/// removes any hand-off file.
pub async fn run_pipeline<R: StageRunner>(orchestrator: &Orchestrator<R>) -> Result<()> {
    let stages: Vec<&str> = orchestrator
        .active_stages()
        .iter()
        .map(|stage| stage.as_str())
        .collect();
    info!(stages = ?stages, runner = orchestrator.runner().name(), "Starting pipeline...");

    let shutdown_signal = setup_shutdown_signal();

    tokio::select! {
        report = orchestrator.run() => {
            print_summary(&report);
            report.into_result()?;
            info!("Pipeline completed successfully");
            Ok(())
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, aborting in-flight stage");
            Err(CliError::Interrupted)
        }
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{RunContext, Stage};
    use stage_runner::MockStageRunner;

    const CONFIG: &str = r#"{
        "main": {
            "project_name": "nyc_airbnb",
            "experiment_name": "development",
            "steps": "download,basic_cleaning,data_check",
            "components_repository": "https://example.com/components"
        },
        "etl": {"sample": "sample1.csv", "min_price": 10, "max_price": 350},
        "data_check": {"kl_threshold": 0.2},
        "modeling": {
            "test_size": 0.2, "val_size": 0.2, "random_seed": 42,
            "stratify_by": "none", "max_tfidf_features": 5,
            "random_forest": {"n_estimators": 100}
        }
    }"#;

    fn orchestrator(runner: MockStageRunner) -> Orchestrator<MockStageRunner> {
        let config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Json).unwrap();
        let ctx = RunContext::from_config(&config, ".");
        Orchestrator::new(config, ctx, runner).unwrap()
    }

    #[tokio::test]
    async fn test_completed_run() {
        let orch = orchestrator(MockStageRunner::new());
        run_pipeline(&orch).await.unwrap();
        assert_eq!(orch.runner().invocation_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_run_maps_to_stage_error() {
        let orch = orchestrator(MockStageRunner::failing(&[Stage::DataCheck]));
        let err = run_pipeline(&orch).await.unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(matches!(
            err,
            CliError::StageFailed {
                stage: Stage::DataCheck,
                ..
            }
        ));
    }
}
