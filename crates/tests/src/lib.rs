//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 阶段目录契约测试
//! - 模拟 e2e 测试（配置 → 编排器 → mock runner，无需外部后端）
//! - 进程后端 e2e 测试（以 shell 脚本代替 mlflow）

#[cfg(test)]
mod contract_tests {
    use contracts::{ArtifactReference, Stage};

    #[test]
    fn test_stage_tokens_snapshot() {
        let tokens: Vec<&str> = Stage::CANONICAL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            tokens,
            vec![
                "download",
                "basic_cleaning",
                "data_check",
                "data_split",
                "train_random_forest",
                "test_regression_model"
            ]
        );
    }

    #[test]
    fn test_declared_outputs_are_referenceable() {
        for stage in Stage::CANONICAL {
            for output in stage.definition().outputs {
                let text = format!("nyc_airbnb/{}:latest", output.name);
                let parsed: ArtifactReference = text.parse().unwrap();
                assert_eq!(parsed.name, output.name);
            }
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ArtifactReference, ParamKind, PipelineConfig, RunContext, Stage};
    use orchestrator::{Orchestrator, PipelineState};
    use serde_json::{Map, Value};
    use stage_runner::{MockConfig, MockStageRunner};

    const CONFIG: &str = r#"
main:
  project_name: nyc_airbnb
  experiment_name: development
  steps: all
  components_repository: "https://github.com/udacity/build-ml-pipeline-for-short-term-rental-prices#components"
etl:
  sample: "sample1.csv"
  min_price: 10
  max_price: 350
data_check:
  kl_threshold: 0.2
modeling:
  test_size: 0.2
  val_size: 0.2
  random_seed: 42
  stratify_by: "neighbourhood_group"
  max_tfidf_features: 5
  random_forest:
    n_estimators: 100
    max_depth: 15
    min_samples_split: 4
    min_samples_leaf: 3
    n_jobs: -1
    criterion: squared_error
    max_features: 0.5
    oob_score: true
"#;

    fn load(overrides: &[&str]) -> PipelineConfig {
        ConfigLoader::load_from_str_with_overrides(CONFIG, ConfigFormat::Yaml, overrides).unwrap()
    }

    fn build(config: PipelineConfig, runner: MockStageRunner) -> Orchestrator<MockStageRunner> {
        let ctx = RunContext::from_config(&config, "/srv/pipeline");
        Orchestrator::new(config, ctx, runner).unwrap()
    }

    /// End-to-end test: config override -> orchestrator -> single mock invocation
    #[tokio::test]
    async fn test_e2e_single_stage() {
        let orch = build(load(&["main.steps=download"]), MockStageRunner::new());
        let report = orch.run().await;
        assert_eq!(report.state, PipelineState::Completed);

        let calls = orch.runner().invocations();
        assert_eq!(calls.len(), 1);
        let params = &calls[0].params;
        assert_eq!(params.len(), 4);
        assert_eq!(params["sample"], "sample1.csv");
        assert_eq!(params["artifact_name"], "sample.csv");
        assert_eq!(params["artifact_type"], "raw_data");
        assert_eq!(params["artifact_description"], "Raw file as downloaded");
    }

    /// 全流程：每个工件参数都能解析，且引用更早阶段声明的输出
    #[tokio::test]
    async fn test_e2e_full_pipeline() {
        let orch = build(load(&[]), MockStageRunner::new());
        let report = orch.run().await;

        assert!(report.is_success());
        assert_eq!(report.transitions.len(), 7);
        assert_eq!(orch.runner().invoked_stages(), Stage::DEFAULT.to_vec());

        for call in orch.runner().invocations() {
            assert_eq!(call.project, "nyc_airbnb");
            assert_eq!(call.run_group, "development");

            for spec in call.stage.definition().parameters {
                if spec.kind != ParamKind::Artifact {
                    continue;
                }
                let text = call.params[spec.name].as_str().unwrap();
                let reference: ArtifactReference = text.parse().unwrap();
                assert_eq!(reference.namespace, "nyc_airbnb");

                let produced_earlier = Stage::CANONICAL[..call.stage.position()]
                    .iter()
                    .any(|s| s.definition().outputs.iter().any(|o| o.name == reference.name));
                assert!(produced_earlier, "{}: {text}", call.stage);
            }
        }
    }

    #[tokio::test]
    async fn test_e2e_failure_stops_pipeline() {
        let orch = build(
            load(&["main.steps=download,basic_cleaning,data_check"]),
            MockStageRunner::failing(&[Stage::BasicCleaning]),
        );
        let report = orch.run().await;

        assert_eq!(report.state, PipelineState::Failed(Stage::BasicCleaning));
        assert!(!orch.runner().invoked_stages().contains(&Stage::DataCheck));
        let err = report.into_result().unwrap_err();
        assert!(err.is_execution());
    }

    #[test]
    fn test_e2e_unknown_step_is_configuration_error() {
        let config = load(&["main.steps=download,downlaod"]);
        let ctx = RunContext::from_config(&config, ".");
        let err = Orchestrator::new(config, ctx, MockStageRunner::new())
            .err()
            .unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("downlaod"), "got: {err}");
    }

    #[tokio::test]
    async fn test_e2e_custom_namespace() {
        let orch = build(
            load(&[
                "main.steps=test_regression_model",
                "+main.artifact_namespace=team/nyc_airbnb",
            ]),
            MockStageRunner::new(),
        );
        orch.run().await;

        let params = &orch.runner().invocations()[0].params;
        assert_eq!(
            params["mlflow_model"],
            "team/nyc_airbnb/random_forest_export:prod"
        );
        assert_eq!(params["test_dataset"], "team/nyc_airbnb/test_data.csv:latest");
    }

    #[tokio::test]
    async fn test_e2e_handoff_reflects_overrides() {
        let config = load(&[
            "main.steps=train_random_forest",
            "modeling.random_forest.max_depth=20",
        ]);
        let expected = config.modeling.random_forest.clone();
        assert_eq!(expected["max_depth"], 20);

        let runner = MockStageRunner::with_config(MockConfig {
            capture_file_param: Some("rf_config".into()),
            ..Default::default()
        });
        let orch = build(config, runner);
        assert!(orch.run().await.is_success());

        let call = &orch.runner().invocations()[0];
        let captured: Map<String, Value> =
            serde_json::from_str(call.captured_file.as_deref().unwrap()).unwrap();
        assert_eq!(captured, expected);

        let path = call.params["rf_config"].as_str().unwrap();
        assert!(!std::path::Path::new(path).exists());
    }

    #[tokio::test]
    async fn test_e2e_repeated_runs() {
        let orch = build(load(&["main.steps=data_check,data_split"]), MockStageRunner::new());
        let first = orch.run().await;
        let second = orch.run().await;

        assert_ne!(first.run_ids(), second.run_ids());
        let params = |r: &orchestrator::PipelineReport| {
            r.invocations.iter().map(|i| i.parameters.clone()).collect::<Vec<_>>()
        };
        assert_eq!(params(&first), params(&second));
    }
}

#[cfg(all(test, unix))]
mod process_tests {
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::RunContext;
    use orchestrator::{Orchestrator, PipelineState};
    use stage_runner::ProcessStageRunner;

    const CONFIG: &str = r#"
[main]
project_name = "nyc_airbnb"
experiment_name = "development"
steps = "download,basic_cleaning"
components_repository = "https://example.com/components"

[etl]
sample = "sample1.csv"
min_price = 10
max_price = 350

[data_check]
kl_threshold = 0.2

[modeling]
test_size = 0.2
val_size = 0.2
random_seed = 42
stratify_by = "neighbourhood_group"
max_tfidf_features = 5

[modeling.random_forest]
n_estimators = 100
"#;

    /// Stand-in backend appending its environment and arguments to `log`
    fn fake_backend(dir: &Path, log: &Path, exit_code: i32) -> String {
        let script = dir.join("fake-mlflow");
        let body = format!(
            "#!/bin/sh\necho \"$WANDB_PROJECT|$WANDB_RUN_GROUP|$*\" >> '{}'\nexit {exit_code}\n",
            log.display()
        );
        std::fs::write(&script, body).unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();
        script.display().to_string()
    }

    #[tokio::test]
    async fn test_process_backend_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let program = fake_backend(dir.path(), &log, 0);

        let config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let ctx = RunContext::from_config(&config, "/srv/pipeline");
        let orch = Orchestrator::new(config, ctx, ProcessStageRunner::new(program)).unwrap();

        let report = orch.run().await;
        assert_eq!(report.state, PipelineState::Completed);

        let lines: Vec<String> = std::fs::read_to_string(&log)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        assert_eq!(lines.len(), 2);

        assert!(lines[0].starts_with("nyc_airbnb|development|run https://example.com/components/get_data -e main --env-manager conda -v main"));
        assert!(lines[0].contains("-P sample=sample1.csv"), "{}", lines[0]);
        assert!(lines[1].contains("src/basic_cleaning"), "{}", lines[1]);
        assert!(
            lines[1].contains("-P input_artifact=nyc_airbnb/sample.csv:latest"),
            "{}",
            lines[1]
        );
        assert!(lines[1].contains("-P min_price=10 "), "{}", lines[1]);
        assert!(lines[1].contains("-P max_price=350 "), "{}", lines[1]);
    }

    #[tokio::test]
    async fn test_process_backend_failure_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let program = fake_backend(dir.path(), &log, 3);

        let config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let ctx = RunContext::from_config(&config, dir.path());
        let orch = Orchestrator::new(config, ctx, ProcessStageRunner::new(program)).unwrap();

        let report = orch.run().await;
        assert_eq!(report.state, PipelineState::Failed(contracts::Stage::Download));
        assert_eq!(std::fs::read_to_string(&log).unwrap().lines().count(), 1);

        let err = report.into_result().unwrap_err();
        assert!(err.to_string().contains("exit code 3"), "got: {err}");
    }
}
