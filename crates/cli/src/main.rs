//! # ml-pipeline CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与覆盖
//! - 阶段计划预览 (dry-run)
//! - 管道执行与优雅中断

mod cli;
mod commands;
mod error;
mod pipeline;

use std::process::ExitCode;

use clap::Parser;
use observability::ObservabilityConfig;
use tracing::{error, info};

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on CLI options
    let observability = ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: cli.metrics_port(),
        ..Default::default()
    }
    .with_verbosity(cli.verbose, cli.quiet);

    if let Err(e) = observability::init_with_config(observability) {
        eprintln!("Failed to initialize observability: {e:#}");
        return ExitCode::FAILURE;
    }

    info!(version = env!("CARGO_PKG_VERSION"), "ml-pipeline starting");

    match commands::execute(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, exit_code = e.exit_code(), "Pipeline did not complete");
            if let Some(source) = std::error::Error::source(&e) {
                error!(cause = %source, "Caused by");
            }
            ExitCode::from(e.exit_code())
        }
    }
}
