//! Command implementations.

mod plan;
mod run;

pub use plan::print_plan;
pub use run::run_pipeline;

use config_loader::ConfigLoader;
use contracts::RunContext;
use orchestrator::Orchestrator;
use stage_runner::ProcessStageRunner;
use tracing::info;

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Load configuration, then either print the plan or run the pipeline
pub async fn execute(cli: &Cli) -> Result<()> {
    let orchestrator = prepare(cli)?;

    if cli.dry_run {
        info!("Dry run mode - printing plan, no stage will be launched");
        return print_plan(&orchestrator, cli.json);
    }

    run_pipeline(&orchestrator).await
}

/// Build an orchestrator backed by the external process runner
pub fn prepare(cli: &Cli) -> Result<Orchestrator<ProcessStageRunner>> {
    info!(
        config = %cli.config.display(),
        overrides = cli.overrides.len(),
        "Loading configuration"
    );

    let config = ConfigLoader::load_with_overrides(&cli.config, &cli.overrides)
        .map_err(CliError::Configuration)?;

    let root_dir = cli.root_dir();
    info!(
        project = %config.main.project_name,
        run_group = %config.main.experiment_name,
        steps = %config.main.steps,
        root_dir = %root_dir.display(),
        "Configuration loaded"
    );

    let ctx = RunContext::from_config(&config, root_dir);
    let runner = ProcessStageRunner::new(cli.runner.as_str());
    Orchestrator::new(config, ctx, runner).map_err(CliError::Configuration)
}
