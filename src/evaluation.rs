use crate::models::{AgentOutput, Criteria, EvaluationResult, Scenario, Summary};
use crate::scoring::{cosine_text_similarity, evaluate_social_post, regex_match_score};
use anyhow::{Result, bail};
use tracing::debug;

/// Minimum overall score for a scenario to pass (inclusive)
pub const PASS_THRESHOLD: f64 = 0.75;
/// Minimum fraction of passing scenarios for the run to succeed
pub const REQUIRED_PASS_RATE: f64 = 0.70;

const WEIGHT_RELEVANCE: f64 = 0.25;
const WEIGHT_PERSONALIZATION: f64 = 0.20;
const WEIGHT_TREND_ALIGNMENT: f64 = 0.15;
const WEIGHT_EVENT_COVERAGE: f64 = 0.15;
const WEIGHT_POST_QUALITY: f64 = 0.25;

const DEFAULT_MARKET_PATTERN: &str = "Singapore|US";
const LABEL_CHARS: usize = 50;

/// Unrounded component scores for one scenario
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComponentScores {
    pub relevance: f64,
    pub personalization: f64,
    pub trend_alignment: f64,
    pub event_coverage: f64,
    pub post_quality_avg: f64,
}

impl ComponentScores {
    /// Score an agent output against the scenario's criteria
    pub fn compute(user_input: &str, expected: &Criteria, output: &AgentOutput) -> Self {
        let rec_text = output.recommendation_text();
        let promo_text = output.promotion_text();
        let all_posts = output.all_posts();

        let relevance =
            cosine_text_similarity(&format!("{} {}{}", user_input, rec_text, promo_text), user_input);

        let personalization = regex_match_score(
            &all_posts,
            &[
                expected.age_group.as_deref().unwrap_or(""),
                expected.gender.as_deref().unwrap_or(""),
                expected.market.as_deref().unwrap_or(DEFAULT_MARKET_PATTERN),
            ],
        );
        let trend_alignment = regex_match_score(&all_posts, &expected.trends);
        let event_coverage = regex_match_score(&all_posts, &expected.events);

        let posts = output.post_texts();
        let post_quality_avg = if posts.is_empty() {
            0.0
        } else {
            let total: f64 = posts
                .iter()
                .map(|post| evaluate_social_post(post, &expected.required_keywords).quality)
                .sum();
            total / posts.len() as f64
        };

        Self {
            relevance,
            personalization,
            trend_alignment,
            event_coverage,
            post_quality_avg,
        }
    }

    /// Weighted combination of the five components
    pub fn overall(&self) -> f64 {
        WEIGHT_RELEVANCE * self.relevance
            + WEIGHT_PERSONALIZATION * self.personalization
            + WEIGHT_TREND_ALIGNMENT * self.trend_alignment
            + WEIGHT_EVENT_COVERAGE * self.event_coverage
            + WEIGHT_POST_QUALITY * self.post_quality_avg
    }
}

pub fn passes(overall: f64) -> bool {
    overall >= PASS_THRESHOLD
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Label used for a scenario in results: the first 50 characters of its input
pub fn scenario_label(user_input: &str) -> String {
    user_input.chars().take(LABEL_CHARS).collect()
}

/// Score one scenario. Pass/fail is decided before the stored scores are rounded.
pub fn evaluate_scenario(scenario: &Scenario, output: &AgentOutput) -> EvaluationResult {
    let scores = ComponentScores::compute(&scenario.user_input, &scenario.expected, output);
    let overall = scores.overall();
    debug!(?scores, overall, "Scored scenario");

    EvaluationResult {
        scenario: scenario_label(&scenario.user_input),
        relevance_score: round3(scores.relevance),
        personalization_score: round3(scores.personalization),
        trend_alignment: round3(scores.trend_alignment),
        event_coverage: round3(scores.event_coverage),
        post_quality_avg: round3(scores.post_quality_avg),
        overall_score: round3(overall),
        passed: passes(overall),
    }
}

/// Calculate summary statistics across a run's results.
///
/// Pass rate and average are NaN for an empty run. Best and worst keep the
/// first scenario reaching the extreme.
pub fn calculate_summary(results: &[EvaluationResult]) -> Summary {
    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    let score_sum: f64 = results.iter().map(|r| r.overall_score).sum();

    let mut best: Option<&EvaluationResult> = None;
    let mut worst: Option<&EvaluationResult> = None;
    for result in results {
        if best.is_none_or(|b| result.overall_score > b.overall_score) {
            best = Some(result);
        }
        if worst.is_none_or(|w| result.overall_score < w.overall_score) {
            worst = Some(result);
        }
    }

    let label = |r: Option<&EvaluationResult>| match r {
        Some(r) => r.scenario.clone(),
        None => "N/A".to_string(),
    };

    Summary {
        total_scenarios: total,
        pass_rate: passed as f64 / total as f64,
        avg_overall_score: score_sum / total as f64,
        best_scenario: label(best),
        worst_scenario: label(worst),
    }
}

/// Fail when the run's pass rate is below the required rate (or undefined)
pub fn check_pass_rate(summary: &Summary) -> Result<()> {
    if summary.pass_rate >= REQUIRED_PASS_RATE {
        return Ok(());
    }
    bail!(
        "Evaluation failed: Only {:.1}% passed (need >= {:.0}%)",
        summary.pass_rate * 100.0,
        REQUIRED_PASS_RATE * 100.0
    )
}
