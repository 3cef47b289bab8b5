//! Deterministic remediation recommendations.
//!
//! Actions come from a fixed table keyed by a root-cause category; only the
//! shared explanation is generated.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detect::Severity;
use crate::reasoning::{generate_or_fallback, Prompt, TextGenerator};

pub const EXPLANATION_FALLBACK: &str = "Explanation unavailable due to AI service error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Investigate,
    Mitigate,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Investigate => write!(f, "INVESTIGATE"),
            ActionKind::Mitigate => write!(f, "MITIGATE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    DatabaseConnectivity,
    Unknown,
}

struct ActionTemplate {
    action: &'static str,
    kind: ActionKind,
    base_confidence: f64,
}

const DATABASE_ACTIONS: &[ActionTemplate] = &[
    ActionTemplate {
        action: "Check database connection pool saturation",
        kind: ActionKind::Investigate,
        base_confidence: 0.85,
    },
    ActionTemplate {
        action: "Verify database network connectivity",
        kind: ActionKind::Investigate,
        base_confidence: 0.80,
    },
    ActionTemplate {
        action: "Scale database read replicas",
        kind: ActionKind::Mitigate,
        base_confidence: 0.65,
    },
];

const UNKNOWN_ACTIONS: &[ActionTemplate] = &[ActionTemplate {
    action: "Collect additional metrics and logs",
    kind: ActionKind::Investigate,
    base_confidence: 0.50,
}];

const DATABASE_KEYWORDS: &[&str] = &["database", "db", "sql", "connection"];

impl Category {
    fn actions(self) -> &'static [ActionTemplate] {
        match self {
            Category::DatabaseConnectivity => DATABASE_ACTIONS,
            Category::Unknown => UNKNOWN_ACTIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub confidence: f64,
    pub explanation: String,
}

pub fn classify_root_cause(root_cause: &str) -> Category {
    let rc = root_cause.to_lowercase();
    if DATABASE_KEYWORDS.iter().any(|k| rc.contains(k)) {
        Category::DatabaseConnectivity
    } else {
        Category::Unknown
    }
}

/// Raise `base` by a severity bonus, capped, rounded to two decimals.
pub fn adjust_confidence(base: f64, severity: Severity) -> f64 {
    let adjusted = match severity {
        Severity::Critical => (base + 0.10).min(0.98),
        Severity::High => (base + 0.05).min(0.95),
        Severity::Medium | Severity::Low => base,
    };
    (adjusted * 100.0).round() / 100.0
}

pub fn explanation_prompt(root_cause: &str) -> Prompt {
    Prompt {
        text: format!(
            "You are an SRE assistant.\n\n\
             Explain the root cause below in ONE concise sentence.\n\
             Do NOT suggest actions.\n\n\
             Root cause: {}\n",
            root_cause
        ),
        temperature: 0.2,
        max_tokens: 50,
    }
}

/// Build recommendations from a fixed table, with one generated explanation
/// shared by every entry.
pub async fn generate_recommendations(
    generator: &dyn TextGenerator,
    root_cause: &str,
    severity: Severity,
    timeout: Duration,
) -> Vec<Recommendation> {
    let category = classify_root_cause(root_cause);
    let explanation = generate_or_fallback(
        generator,
        &explanation_prompt(root_cause),
        timeout,
        EXPLANATION_FALLBACK,
    )
    .await;

    tracing::debug!(?category, %severity, "Building recommendations");
    category
        .actions()
        .iter()
        .map(|t| Recommendation {
            action: t.action.to_string(),
            kind: t.kind,
            confidence: adjust_confidence(t.base_confidence, severity),
            explanation: explanation.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::DisabledGenerator;

    #[test]
    fn test_confidence_caps() {
        assert_eq!(adjust_confidence(0.90, Severity::Critical), 0.98);
        assert_eq!(adjust_confidence(0.92, Severity::High), 0.95);
        assert_eq!(adjust_confidence(0.70, Severity::Medium), 0.70);
        assert_eq!(adjust_confidence(0.50, Severity::Low), 0.50);
    }

    #[test]
    fn test_confidence_bonus_below_cap() {
        assert_eq!(adjust_confidence(0.65, Severity::Critical), 0.75);
        assert_eq!(adjust_confidence(0.80, Severity::High), 0.85);
        assert_eq!(adjust_confidence(0.85, Severity::Critical), 0.95);
    }

    #[test]
    fn test_classification_keywords() {
        assert_eq!(
            classify_root_cause("Connection pool exhaustion on the primary"),
            Category::DatabaseConnectivity
        );
        assert_eq!(classify_root_cause("Slow SQL query"), Category::DatabaseConnectivity);
        assert_eq!(classify_root_cause("CPU saturation after deploy"), Category::Unknown);
    }

    #[tokio::test]
    async fn test_unknown_category_gets_generic_action() {
        let recs = generate_recommendations(
            &DisabledGenerator,
            "CPU saturation after deploy",
            Severity::High,
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].action, "Collect additional metrics and logs");
        assert_eq!(recs[0].kind, ActionKind::Investigate);
        assert_eq!(recs[0].confidence, 0.55);
        assert_eq!(recs[0].explanation, EXPLANATION_FALLBACK);
    }

    #[tokio::test]
    async fn test_database_category_shares_explanation() {
        let recs = generate_recommendations(
            &DisabledGenerator,
            "Database connection pool saturated",
            Severity::Critical,
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[2].kind, ActionKind::Mitigate);
        assert_eq!(
            recs.iter().map(|r| r.confidence).collect::<Vec<_>>(),
            vec![0.95, 0.90, 0.75]
        );
        assert!(recs.iter().all(|r| r.explanation == recs[0].explanation));
    }

    #[test]
    fn test_recommendation_serializes_type_field() {
        let rec = Recommendation {
            action: "a".into(),
            kind: ActionKind::Mitigate,
            confidence: 0.5,
            explanation: "e".into(),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["type"], "MITIGATE");
    }
}
