//! Summary printed at the end of a run.

use std::fmt::Write;

use contracts::InvocationOutcome;
use orchestrator::PipelineReport;

/// Print detailed summary
pub fn print_summary(report: &PipelineReport) {
    print!("{}", render_summary(report));
}

/// Render the summary as text
pub fn render_summary(report: &PipelineReport) -> String {
    let mut out = String::new();
    // 写入 String 不会失败
    let _ = write_summary(&mut out, report);
    out
}

fn write_summary(out: &mut String, report: &PipelineReport) -> std::fmt::Result {
    writeln!(out, "\n╔══════════════════════════════════════════════════════════════╗")?;
    writeln!(out, "║                      Pipeline Summary                        ║")?;
    writeln!(out, "╚══════════════════════════════════════════════════════════════╝\n")?;

    writeln!(out, "Overview")?;
    writeln!(out, "   ├─ State: {}", report.state)?;
    writeln!(out, "   ├─ Duration: {:.2}s", report.duration.as_secs_f64())?;
    writeln!(out, "   ├─ Stages run: {}", report.invocations.len())?;
    let path: Vec<String> = report.transitions.iter().map(|s| s.to_string()).collect();
    writeln!(out, "   └─ Transitions: {}", path.join(" -> "))?;

    if !report.invocations.is_empty() {
        writeln!(out, "\nStages")?;
        let last = report.invocations.len() - 1;
        for (idx, invocation) in report.invocations.iter().enumerate() {
            let branch = if idx == last { "└─" } else { "├─" };
            let outcome = match &invocation.outcome {
                InvocationOutcome::Succeeded(run_id) => format!("ok, run {run_id}"),
                InvocationOutcome::Failed(exit) => format!("FAILED, {exit}"),
            };
            writeln!(
                out,
                "   {branch} {:<22} {:>8.2}s  {outcome}",
                invocation.stage.as_str(),
                invocation.elapsed.as_secs_f64()
            )?;
        }
    }

    if let Some(err) = &report.error {
        writeln!(out, "\nError: {err}")?;
    }

    writeln!(out)
}
