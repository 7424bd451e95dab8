use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Expected-output criteria for a golden scenario.
///
/// Single-valued entries are case-insensitive regular expressions, list
/// entries are matched one pattern (or keyword) at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(default)]
    pub trends: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub required_keywords: Vec<String>,
    /// Kept for dataset compatibility; no score reads it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_post_quality: Option<f64>,
}

/// Scenario identifier as written in the dataset, numeric or free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScenarioId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioId::Number(n) => write!(f, "{}", n),
            ScenarioId::Text(s) => f.write_str(s),
        }
    }
}

/// One golden test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ScenarioId>,
    pub user_input: String,
    #[serde(default)]
    pub expected: Criteria,
}

/// A single promotion crafted by the agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    #[serde(default, deserialize_with = "text_or_empty")]
    pub offer: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub discount: String,
}

/// Render a JSON value as text: strings verbatim, null as empty, anything else as JSON
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| value_text(&value))
}

/// Structured output of the orchestration agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    /// Either `{"suggestions": "..."}` or a plain string
    #[serde(default)]
    pub recommendations: Value,
    #[serde(default)]
    pub promotions: Vec<Promotion>,
    /// Platform name to generated post, in the order the agent returned them
    #[serde(default)]
    pub social_posts: Map<String, Value>,
}

impl AgentOutput {
    /// Recommendation text, taken from `suggestions` when the agent returned an object
    pub fn recommendation_text(&self) -> String {
        match &self.recommendations {
            Value::Object(map) => map.get("suggestions").map(value_text).unwrap_or_default(),
            other => value_text(other),
        }
    }

    /// Offer and discount pairs flattened into one line
    pub fn promotion_text(&self) -> String {
        self.promotions
            .iter()
            .map(|p| format!("{} {}", p.offer, p.discount))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Generated post texts in platform order
    pub fn post_texts(&self) -> Vec<String> {
        self.social_posts.values().map(value_text).collect()
    }

    /// All generated posts joined by single spaces
    pub fn all_posts(&self) -> String {
        self.post_texts().join(" ")
    }
}

/// Scores for one scenario. Created once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub scenario: String,
    pub relevance_score: f64,
    pub personalization_score: f64,
    pub trend_alignment: f64,
    pub event_coverage: f64,
    pub post_quality_avg: f64,
    pub overall_score: f64,
    pub passed: bool,
}

impl EvaluationResult {
    /// All-zero failing record for a scenario whose agent call did not complete
    pub fn failed(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            relevance_score: 0.0,
            personalization_score: 0.0,
            trend_alignment: 0.0,
            event_coverage: 0.0,
            post_quality_avg: 0.0,
            overall_score: 0.0,
            passed: false,
        }
    }
}

/// Statistics derived from a run's results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total_scenarios: usize,
    /// NaN when there are no results
    pub pass_rate: f64,
    /// NaN when there are no results
    pub avg_overall_score: f64,
    pub best_scenario: String,
    pub worst_scenario: String,
}

/// Final report for a run
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub summary: Summary,
    pub results: Vec<EvaluationResult>,
}
