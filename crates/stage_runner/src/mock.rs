//! Mock stage runner
//!
//! 用于编排器测试的 mock 实现：记录每次调用，支持注入失败场景。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use contracts::{ContractError, ExitSignal, Parameters, RunContext, RunId, Stage, StageRunner};
use tracing::instrument;

/// Mock 运行器配置
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// 应该失败的阶段
    pub fail_stages: Vec<Stage>,
    /// 失败阶段报告的退出码
    pub exit_code: i32,
    /// 读取调用时该参数指向的文件内容 (用于检查交接文件)
    pub capture_file_param: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            fail_stages: Vec::new(),
            exit_code: 1,
            capture_file_param: None,
        }
    }
}

/// One observed call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedInvocation {
    pub stage: Stage,
    pub params: Parameters,
    pub project: String,
    pub run_group: String,
    /// Content of the captured file param, when configured and readable
    pub captured_file: Option<String>,
}

/// Mock stage runner
pub struct MockStageRunner {
    config: MockConfig,
    /// Run ID 计数器
    next_run: AtomicU64,
    /// 调用记录
    invocations: Mutex<Vec<RecordedInvocation>>,
}

impl MockStageRunner {
    /// 创建默认 mock 运行器
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// 使用配置创建 mock 运行器
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            next_run: AtomicU64::new(1000),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// 让指定阶段失败
    pub fn failing(stages: &[Stage]) -> Self {
        Self::with_config(MockConfig {
            fail_stages: stages.to_vec(),
            ..Default::default()
        })
    }

    /// 获取所有调用记录
    pub fn invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// 按调用顺序返回阶段
    pub fn invoked_stages(&self) -> Vec<Stage> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|inv| inv.stage)
            .collect()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    fn capture_file(&self, params: &Parameters) -> Option<String> {
        let key = self.config.capture_file_param.as_ref()?;
        let path = params.get(key)?.as_str()?;
        std::fs::read_to_string(path).ok()
    }
}

impl Default for MockStageRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl StageRunner for MockStageRunner {
    fn name(&self) -> &str {
        "mock"
    }

    #[instrument(name = "mock_stage_run", skip(self, ctx, params), fields(stage = %stage))]
    async fn run(
        &self,
        ctx: &RunContext,
        stage: Stage,
        params: &Parameters,
    ) -> Result<RunId, ContractError> {
        self.invocations.lock().unwrap().push(RecordedInvocation {
            stage,
            params: params.clone(),
            project: ctx.project_name().to_string(),
            run_group: ctx.run_group().to_string(),
            captured_file: self.capture_file(params),
        });

        stage.definition().check_parameters(params)?;

        if self.config.fail_stages.contains(&stage) {
            return Err(ContractError::stage_execution(
                stage,
                ExitSignal::Code(self.config.exit_code),
            ));
        }

        let n = self.next_run.fetch_add(1, Ordering::SeqCst);
        Ok(RunId::new(format!("mock-run-{n}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> RunContext {
        RunContext::new("proj", "group", "repo", "conda", ".")
    }

    fn test_params() -> Parameters {
        let mut params = Parameters::new();
        params.insert("mlflow_model".into(), json!("proj/random_forest_export:prod"));
        params.insert("test_dataset".into(), json!("proj/test_data.csv:latest"));
        params
    }

    #[tokio::test]
    async fn test_records_and_issues_distinct_ids() {
        let runner = MockStageRunner::new();
        let a = runner
            .run(&ctx(), Stage::TestRegressionModel, &test_params())
            .await
            .unwrap();
        let b = runner
            .run(&ctx(), Stage::TestRegressionModel, &test_params())
            .await
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(runner.invocation_count(), 2);

        let first = &runner.invocations()[0];
        assert_eq!(first.project, "proj");
        assert_eq!(first.run_group, "group");
        assert_eq!(first.params, test_params());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let runner = MockStageRunner::with_config(MockConfig {
            fail_stages: vec![Stage::TestRegressionModel],
            exit_code: 3,
            ..Default::default()
        });
        let err = runner
            .run(&ctx(), Stage::TestRegressionModel, &test_params())
            .await
            .unwrap_err();
        assert_eq!(err.failed_stage(), Some(Stage::TestRegressionModel));
        assert!(err.to_string().contains("exit code 3"), "got: {err}");
        assert_eq!(runner.invoked_stages(), vec![Stage::TestRegressionModel]);
    }

    #[tokio::test]
    async fn test_missing_parameters_fail() {
        let runner = MockStageRunner::new();
        let err = runner
            .run(&ctx(), Stage::TestRegressionModel, &Parameters::new())
            .await
            .unwrap_err();
        assert!(err.is_execution());
    }

    #[tokio::test]
    async fn test_captures_file_param() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("handoff.json");
        std::fs::write(&file, "{\"a\":1}").unwrap();

        let runner = MockStageRunner::with_config(MockConfig {
            capture_file_param: Some("test_dataset".into()),
            ..Default::default()
        });
        let mut params = test_params();
        params.insert("test_dataset".into(), json!(file.display().to_string()));
        runner
            .run(&ctx(), Stage::TestRegressionModel, &params)
            .await
            .unwrap();

        assert_eq!(
            runner.invocations()[0].captured_file.as_deref(),
            Some("{\"a\":1}")
        );
    }
}
