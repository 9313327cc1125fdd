//! Dry-run plan output.

use anyhow::Context;
use contracts::{StageRunner, ALL_STEPS};
use orchestrator::{Orchestrator, StagePlan};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Plan document for JSON output
#[derive(Serialize)]
struct PlanDocument<'a> {
    project: &'a str,
    run_group: &'a str,
    runner: &'a str,
    stages: Vec<StagePlan>,
}

/// Print the ordered stage plan
pub fn print_plan<R: StageRunner>(orchestrator: &Orchestrator<R>, json: bool) -> Result<()> {
    let ctx = orchestrator.context();
    let document = PlanDocument {
        project: ctx.project_name(),
        run_group: ctx.run_group(),
        runner: orchestrator.runner().name(),
        stages: orchestrator.plan(),
    };

    if json {
        let json =
            serde_json::to_string_pretty(&document).context("Failed to serialize stage plan")?;
        println!("{}", json);
    } else {
        print_text(&document);
    }
    Ok(())
}

fn print_text(document: &PlanDocument<'_>) {
    println!("\n=== Pipeline Plan ===\n");
    println!("Project:   {}", document.project);
    println!("Run group: {}", document.run_group);
    println!("Runner:    {}", document.runner);

    if document.stages.is_empty() {
        println!("\nNo stages selected (use main.steps={ALL_STEPS} for the default stages).\n");
        return;
    }

    for (idx, plan) in document.stages.iter().enumerate() {
        println!("\n{}. {}", idx + 1, plan.stage);
        println!("   location: {}", plan.location);
        match plan.version {
            Some(version) => println!("   entry:    {} (version {})", plan.entry_point, version),
            None => println!("   entry:    {}", plan.entry_point),
        }
        for (key, value) in &plan.parameters {
            println!("   - {key} = {}", display_value(value));
        }
    }
    println!();
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("nyc_airbnb/sample.csv:latest")), "nyc_airbnb/sample.csv:latest");
        assert_eq!(display_value(&json!(0.2)), "0.2");
        assert_eq!(display_value(&json!(42)), "42");
    }
}
