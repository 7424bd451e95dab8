use crate::models::{EvaluationResult, RunReport, Summary};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Print the evaluation report in the specified format
pub fn print_report(report: &RunReport, format: OutputFormat) {
    match format {
        OutputFormat::Plain => print!("{}", render_plain(report)),
        OutputFormat::Json => print_json(report),
    }
}

/// Render the report as plain text
fn render_plain(report: &RunReport) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();

    out.push_str("Concierge AI Agent - Evaluation Report\n");
    out.push_str(&format!("{}\n", rule));
    if report.results.is_empty() {
        out.push_str("No scenarios evaluated.\n");
    } else {
        out.push_str(&format!(
            "{:<52} {:<7} {:<7} {:<7} {:<7} {:<7} {:<7} {}\n",
            "Scenario", "Relev.", "Pers.", "Trend", "Event", "Posts", "Overall", "Status"
        ));
        out.push_str(&format!("{}\n", "-".repeat(110)));
        for result in &report.results {
            out.push_str(&render_result_row(result));
        }
    }

    out.push('\n');
    out.push_str(&format!("{}\n", rule));
    out.push_str("FINAL EVALUATION SUMMARY\n");
    out.push_str(&format!("{}\n", rule));
    out.push_str(&render_summary(&report.summary));
    out.push_str(&format!("{}\n", rule));
    out
}

fn render_result_row(result: &EvaluationResult) -> String {
    format!(
        "{:<52} {:<7.3} {:<7.3} {:<7.3} {:<7.3} {:<7.3} {:<7.3} {}\n",
        result.scenario,
        result.relevance_score,
        result.personalization_score,
        result.trend_alignment,
        result.event_coverage,
        result.post_quality_avg,
        result.overall_score,
        if result.passed { "PASSED" } else { "FAILED" }
    )
}

fn render_summary(summary: &Summary) -> String {
    format!(
        "Total Scenarios: {}\nPass Rate:       {:.1}%\nAverage Score:   {:.3}/1.0\nBest:            {}\nWorst:           {}\n",
        summary.total_scenarios,
        summary.pass_rate * 100.0,
        summary.avg_overall_score,
        summary.best_scenario,
        summary.worst_scenario
    )
}

/// Print the report in JSON format
fn print_json(report: &RunReport) {
    match render_json(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results to JSON: {}", e),
    }
}

fn render_json(report: &RunReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
