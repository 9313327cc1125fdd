//! # Orchestrator
//!
//! 管道编排：步骤选择、工件引用解析、参数构建、超参数交接与状态机。
//!
//! ## 使用示例
//!
//! ```ignore
//! use orchestrator::Orchestrator;
//!
//! let ctx = RunContext::from_config(&config, root_dir);
//! let orchestrator = Orchestrator::new(config, ctx, ProcessStageRunner::default())?;
//! let report = orchestrator.run().await;
//! ```

mod engine;
mod handoff;
mod params;
mod resolver;
mod selector;

pub use engine::{Orchestrator, PipelineReport, PipelineState, StagePlan};
pub use handoff::{HandoffCodec, JsonCodec};
