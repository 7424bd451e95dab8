use crate::models::{Criteria, Scenario, ScenarioId};
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;

/// Load golden scenarios from a JSON array.
///
/// A missing file falls back to the built-in scenarios; any other read or
/// parse failure is returned.
pub fn load_scenarios(path: &Path) -> Result<Vec<Scenario>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("{} not found. Using fallback dataset.", path.display());
            return Ok(fallback_scenarios());
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read dataset file: {}", path.display()));
        }
    };

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse dataset JSON: {}", path.display()))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Two built-in scenarios used when no dataset file exists
pub fn fallback_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            id: Some(ScenarioId::Number(1)),
            user_input: "I want to create sales and promotion event from November to December, \
                         target customer group is 20-40 years old women in Singapore"
                .to_string(),
            expected: Criteria {
                category: Some("beauty|perfume|skincare|fragrance".to_string()),
                season: Some("Nov.*Dec|Christmas|Black Friday|Holiday".to_string()),
                age_group: Some("20-40".to_string()),
                gender: Some("women".to_string()),
                market: Some("Singapore".to_string()),
                trends: strings(&["floral", "gift set", "sustainable", "long-lasting"]),
                events: strings(&["Black Friday", "Christmas", "12.12", "New Year"]),
                required_keywords: strings(&[
                    "discount",
                    "bundle",
                    "gift",
                    "limited",
                    "holiday",
                    "Singapore",
                ]),
                social_post_quality: Some(0.8),
            },
        },
        Scenario {
            id: Some(ScenarioId::Number(2)),
            user_input: "Perfume promotion for Christmas and New Year, women 25-35 in US"
                .to_string(),
            expected: Criteria {
                category: Some("perfume|fragrance".to_string()),
                season: Some("Christmas|New Year|Winter".to_string()),
                events: strings(&["Christmas", "After Christmas Sale", "New Year"]),
                required_keywords: strings(&["perfume", "gift", "holiday", "scent", "bundle"]),
                ..Criteria::default()
            },
        },
    ]
}
