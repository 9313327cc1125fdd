//! Command line construction for the process backend

use contracts::{Parameters, RunContext, Stage};
use serde_json::Value;

/// Fully rendered external invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

impl StageCommand {
    /// `<program> run <location> -e <entry> --env-manager <env> [-v <version>] -P k=v ...`
    pub fn build(program: &str, ctx: &RunContext, stage: Stage, params: &Parameters) -> Self {
        let definition = stage.definition();

        let mut args = vec![
            "run".to_string(),
            ctx.stage_location(stage),
            "-e".to_string(),
            definition.entry_point.to_string(),
            "--env-manager".to_string(),
            ctx.env_manager().to_string(),
        ];

        if let Some(version) = definition.version {
            args.push("-v".to_string());
            args.push(version.to_string());
        }

        for (key, value) in params {
            args.push("-P".to_string());
            args.push(format!("{key}={}", render_value(value)));
        }

        let envs = ctx
            .environment()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            program: program.to_string(),
            args,
            envs,
        }
    }

    /// Shell-like rendering for logs
    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                parts.push(format!("'{arg}'"));
            } else {
                parts.push(arg.clone());
            }
        }
        parts.join(" ")
    }
}

/// Strings go through unquoted, everything else as compact JSON
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
