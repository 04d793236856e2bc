//! # Report Output
//!
//! Summary table for the terminal and JSON export.

use crate::runtime::HostError;
use sim_scheduler::{RunReport, TaskReport};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Renders the end-of-run summary table
pub fn render_summary(report: &RunReport) -> String {
    let mut out = String::from("\n=== Task Summary ===\n");
    for task in &report.tasks {
        out.push_str(&render_row(task));
        out.push('\n');
    }
    if let Some(mean) = report.mean_turnaround_ms() {
        out.push_str(&format!(
            "{}/{} finished | Mean turnaround: {}ms | Policy: {} | Seed: {}\n",
            report.finished_count(),
            report.tasks.len(),
            mean,
            report.policy,
            report.seed
        ));
    }
    out
}

fn render_row(task: &TaskReport) -> String {
    let turnaround = match (task.turnaround_secs, task.turnaround_ms) {
        (Some(secs), Some(ms)) => format!("{}s ({}ms)", secs, ms),
        _ => "-".to_string(),
    };
    format!(
        "Task {} | Priority: {} | Turnaround: {} | Status: {}",
        task.id, task.priority, turnaround, task.status
    )
}

/// Writes the report as pretty-printed JSON
pub fn export_json(report: &RunReport, path: &Path) -> Result<(), HostError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
