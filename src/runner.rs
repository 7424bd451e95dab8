use crate::agent::{Agent, AgentError};
use crate::evaluation::{calculate_summary, evaluate_scenario, scenario_label};
use crate::models::{AgentOutput, EvaluationResult, RunReport, Scenario, ScenarioId};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

const STATUS_INPUT_CHARS: usize = 70;
const EXPECTED_PLATFORMS: usize = 3;

/// Drives golden scenarios through the agent one at a time
pub struct Runner {
    agent: Box<dyn Agent>,
    agent_timeout: Duration,
    rate_limit_rps: f64,
    last_request: Option<Instant>,
}

impl Runner {
    /// Create a new runner around the agent under evaluation
    pub fn new(agent: Box<dyn Agent>, agent_timeout: Duration) -> Self {
        Self {
            agent,
            agent_timeout,
            rate_limit_rps: 0.0,
            last_request: None,
        }
    }

    pub fn with_rate_limit(mut self, rate_limit_rps: f64) -> Self {
        self.rate_limit_rps = rate_limit_rps;
        self
    }

    /// Enforce rate limiting between agent invocations
    async fn enforce_rate_limit(last_request: &mut Option<Instant>, rate_limit_rps: f64) {
        if rate_limit_rps <= 0.0 {
            return;
        }

        let Ok(min_interval) = Duration::try_from_secs_f64(1.0 / rate_limit_rps) else {
            warn!(rate_limit_rps, "Rate limit interval out of range, not throttling");
            return;
        };

        if let Some(last_time) = *last_request {
            let elapsed = last_time.elapsed();
            if elapsed < min_interval {
                sleep(min_interval - elapsed).await;
            }
        }

        *last_request = Some(Instant::now());
    }

    /// Evaluate every scenario in order and summarise the run.
    ///
    /// A scenario whose agent call fails or times out is recorded as a
    /// zero-scored failure; the run always continues.
    pub async fn run_scenarios(&mut self, scenarios: &[Scenario]) -> RunReport {
        let mut results = Vec::with_capacity(scenarios.len());

        for (index, scenario) in scenarios.iter().enumerate() {
            let id = scenario
                .id
                .clone()
                .unwrap_or(ScenarioId::Number(index as u64 + 1));
            self.log_scenario_start(&id, &scenario.user_input);

            let result = match self.invoke_agent(&scenario.user_input).await {
                Ok(output) => {
                    self.check_platforms(&id, &output);
                    evaluate_scenario(scenario, &output)
                }
                Err(e) => {
                    warn!(scenario = %id, error = %e, "Failed");
                    EvaluationResult::failed(scenario_label(&scenario.user_input))
                }
            };

            info!(
                "   -> Overall: {:.3} | Post Quality: {:.3} | [{}]",
                result.overall_score,
                result.post_quality_avg,
                if result.passed { "PASSED" } else { "FAILED" }
            );
            results.push(result);
        }

        RunReport {
            summary: calculate_summary(&results),
            results,
        }
    }

    async fn invoke_agent(&mut self, user_input: &str) -> Result<AgentOutput, AgentError> {
        Self::enforce_rate_limit(&mut self.last_request, self.rate_limit_rps).await;

        match timeout(self.agent_timeout, self.agent.run(user_input)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AgentError::Timeout(self.agent_timeout)),
        }
    }

    fn log_scenario_start(&self, id: &ScenarioId, user_input: &str) {
        let preview: String = user_input.chars().take(STATUS_INPUT_CHARS).collect();
        let ellipsis = if user_input.chars().count() > STATUS_INPUT_CHARS {
            "..."
        } else {
            ""
        };
        info!("Scenario {}: {}{}", id, preview, ellipsis);
    }

    fn check_platforms(&self, id: &ScenarioId, output: &AgentOutput) {
        if output.social_posts.len() < EXPECTED_PLATFORMS {
            warn!(
                scenario = %id,
                platforms = output.social_posts.len(),
                "Agent produced posts for fewer than {} platforms",
                EXPECTED_PLATFORMS
            );
        }
    }
}

/// Write per-scenario results as a JSON array, replacing any previous file
pub fn store_results(results: &[EvaluationResult], path: &Path) -> Result<()> {
    let json_content =
        serde_json::to_string_pretty(results).context("Failed to serialize results to JSON")?;
    ensure_directory_exists(path)?;
    std::fs::write(path, json_content)
        .with_context(|| format!("Failed to write results to: {}", path.display()))?;
    info!("Results stored to: {}", path.display());

    Ok(())
}

/// Ensure the directory for the results file exists
fn ensure_directory_exists(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fallback_scenarios;
    use crate::models::Promotion;
    use async_trait::async_trait;
    use serde_json::{Map, Value, json};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    enum Step {
        Reply(AgentOutput),
        Fail,
        Hang,
    }

    /// Orchestration agent stand-in that replays scripted steps
    struct ScriptedAgent {
        steps: Mutex<Vec<Step>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedAgent {
        fn new(steps: Vec<Step>) -> (Self, Arc<Mutex<Vec<String>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let mut steps = steps;
            steps.reverse();
            (
                Self {
                    steps: Mutex::new(steps),
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl Agent for ScriptedAgent {
        async fn run(&self, user_input: &str) -> Result<AgentOutput, AgentError> {
            self.calls.lock().unwrap().push(user_input.to_string());
            let step = self.steps.lock().unwrap().pop();
            match step {
                Some(Step::Reply(output)) => Ok(output),
                Some(Step::Fail) | None => Err(AgentError::Transport("mock failure".to_string())),
                Some(Step::Hang) => {
                    sleep(Duration::from_secs(30)).await;
                    Ok(AgentOutput::default())
                }
            }
        }
    }

    fn strong_output() -> AgentOutput {
        let filler = "Celebrate the season with our curated fragrance collection. ".repeat(6);
        let post = |platform: &str| {
            format!(
                "{} {}Christmas and New Year perfume bundle gift for women in Singapore aged 20-40, \
                 floral holiday discount, Black Friday and 12.12 limited offers. #HolidayGifts 🎁",
                platform, filler
            )
        };
        let social_posts: Map<String, Value> = ["X", "Facebook", "Instagram"]
            .iter()
            .map(|p| (p.to_string(), Value::from(post(p))))
            .collect();

        AgentOutput {
            recommendations: json!({"suggestions": "sales promotion event November December women Singapore"}),
            promotions: vec![Promotion {
                offer: "create sales promotion event".to_string(),
                discount: "20%".to_string(),
            }],
            social_posts,
        }
    }

    fn runner(steps: Vec<Step>) -> (Runner, Arc<Mutex<Vec<String>>>) {
        let (agent, calls) = ScriptedAgent::new(steps);
        (Runner::new(Box::new(agent), Duration::from_millis(100)), calls)
    }

    #[tokio::test]
    async fn test_enforce_rate_limit_no_limit() {
        let mut last_request = None;
        let start = Instant::now();

        Runner::enforce_rate_limit(&mut last_request, 0.0).await;

        assert!(start.elapsed() < Duration::from_millis(10));
        assert!(last_request.is_none());
    }

    #[tokio::test]
    async fn test_enforce_rate_limit_with_sleep() {
        let mut last_request = Some(Instant::now());
        let start = Instant::now();

        Runner::enforce_rate_limit(&mut last_request, 100.0).await;

        assert!(start.elapsed() >= Duration::from_millis(8));
    }

    #[tokio::test]
    async fn test_enforce_rate_limit_out_of_range_interval() {
        for rate_limit_rps in [1e-300, f64::NAN] {
            let mut last_request = Some(Instant::now());
            let start = Instant::now();

            Runner::enforce_rate_limit(&mut last_request, rate_limit_rps).await;

            assert!(start.elapsed() < Duration::from_millis(10));
        }
    }

    #[tokio::test]
    async fn test_run_scenarios_scores_each_output() {
        let scenarios = fallback_scenarios();
        let (mut runner, calls) = runner(vec![
            Step::Reply(strong_output()),
            Step::Reply(AgentOutput::default()),
        ]);

        let report = runner.run_scenarios(&scenarios).await;

        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.summary.total_scenarios, 2);

        let first = &report.results[0];
        assert_eq!(first.personalization_score, 1.0);
        assert_eq!(first.event_coverage, 1.0);
        assert_eq!(first.trend_alignment, 0.25);
        assert!(first.post_quality_avg > 0.9);

        let second = &report.results[1];
        assert_eq!(second.post_quality_avg, 0.0);
        assert!(!second.passed);
        assert_eq!(report.summary.worst_scenario, second.scenario);
    }

    #[tokio::test]
    async fn test_agent_failure_records_zero_result_and_continues() {
        let scenarios = fallback_scenarios();
        let (mut runner, calls) = runner(vec![Step::Fail, Step::Reply(strong_output())]);

        let report = runner.run_scenarios(&scenarios).await;

        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(
            report.results[0],
            EvaluationResult::failed(scenario_label(&scenarios[0].user_input))
        );
        assert!(report.results[1].overall_score > 0.0);
        assert_eq!(report.summary.pass_rate, report.results[1].passed as u8 as f64 / 2.0);
    }

    #[tokio::test]
    async fn test_agent_timeout_records_zero_result() {
        let scenarios = fallback_scenarios();
        let (mut runner, _calls) = runner(vec![Step::Hang, Step::Fail]);

        let start = Instant::now();
        let report = runner.run_scenarios(&scenarios).await;

        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(report.results.iter().all(|r| r.overall_score == 0.0 && !r.passed));
        assert_eq!(report.summary.pass_rate, 0.0);
    }

    #[tokio::test]
    async fn test_run_scenarios_with_text_ids() {
        let mut scenarios = fallback_scenarios();
        scenarios[0].id = Some(ScenarioId::Text("S1".to_string()));
        scenarios[1].id = None;
        let (mut runner, calls) = runner(vec![Step::Reply(strong_output()), Step::Fail]);

        let report = runner.run_scenarios(&scenarios).await;

        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(report.results.len(), 2);
        assert!(report.results[0].overall_score > 0.0);
    }

    #[tokio::test]
    async fn test_empty_dataset() {
        let (mut runner, calls) = runner(vec![]);
        let report = runner.run_scenarios(&[]).await;

        assert!(calls.lock().unwrap().is_empty());
        assert!(report.results.is_empty());
        assert_eq!(report.summary.best_scenario, "N/A");
    }

    #[test]
    fn test_store_results_overwrites() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("eval_results.json");
        std::fs::write(&file_path, "stale").unwrap();

        let results = vec![
            EvaluationResult::failed("Perfume promotion for Christmas"),
            EvaluationResult {
                overall_score: 0.812,
                passed: true,
                ..EvaluationResult::failed("Skincare launch")
            },
        ];
        store_results(&results, &file_path).unwrap();

        let content = std::fs::read_to_string(&file_path).unwrap();
        let stored: Vec<EvaluationResult> = serde_json::from_str(&content).unwrap();
        assert_eq!(stored, results);
        assert!(content.contains("\"post_quality_avg\""));
    }

    #[test]
    fn test_store_results_with_nested_directory() {
        let temp_dir = tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested").join("directory").join("results.json");

        store_results(&[], &nested_path).unwrap();

        assert!(nested_path.exists());
        assert_eq!(std::fs::read_to_string(&nested_path).unwrap(), "[]");
    }

    #[test]
    fn test_store_results_unwritable_path() {
        let result = store_results(&[], Path::new("/dev/null/invalid_path_that_cannot_exist"));
        assert!(result.is_err());
    }
}
