//! Core type definitions for Quill review rounds

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Auxiliary key/value context handed to a review step alongside its content
pub type Context = Map<String, Value>;

/// Judge score at or above which content passes
pub const DEFAULT_PASS_THRESHOLD: u8 = 80;

/// Issue severity as reported by a review step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    /// Lenient mapping from free-form model text. Unknown labels fall back to Medium.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "high" | "critical" | "severe" => Self::High,
            "low" | "minor" | "trivial" => Self::Low,
            _ => Self::Medium,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

/// A single normalized finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub description: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Issue {
    pub fn new(description: impl Into<String>, severity: Severity) -> Self {
        Self {
            description: description.into(),
            severity,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Uniform result of every review step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredFeedback {
    /// Which step produced this feedback
    pub step_name: String,
    /// Free-text explanation; raw model output when parsing degraded
    pub summary: String,
    pub issues: Vec<Issue>,
    /// 0-100, absent for steps that only rewrite
    pub score: Option<u8>,
    /// Full replacement text from rewriting-capable steps
    pub rewritten_content: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StructuredFeedback {
    pub fn new(step_name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            summary: summary.into(),
            issues: Vec::new(),
            score: None,
            rewritten_content: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_score(mut self, score: u8) -> Self {
        self.score = Some(score.min(100));
        self
    }

    pub fn with_issues(mut self, issues: Vec<Issue>) -> Self {
        self.issues = issues;
        self
    }

    pub fn with_rewrite(mut self, content: impl Into<String>) -> Self {
        self.rewritten_content = Some(content.into());
        self
    }

    /// Number of High severity issues
    pub fn high_severity_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::High)
            .count()
    }
}

/// Judge verdict for a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Pass,
    Fail,
}

impl Decision {
    /// An absent score counts as zero
    pub fn from_score(score: Option<u8>, threshold: u8) -> Self {
        if score.unwrap_or(0) >= threshold {
            Self::Pass
        } else {
            Self::Fail
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Why the revision loop stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Judge passed the content
    Passed,
    /// Iteration budget exhausted without a pass
    MaxIterations,
    /// The phase machine was driven with an event it cannot accept
    InvalidTransition(String),
}

/// Everything one round produced, kept after the round's feedback is cleared
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Iteration number after this round's rewrite (1-based)
    pub iteration: usize,
    pub reviews: Vec<StructuredFeedback>,
    pub rewrite: StructuredFeedback,
    pub judge: StructuredFeedback,
}

/// Working memory threaded through the revision loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionState {
    /// Original text, never modified
    pub input_content: String,
    pub current_content: String,
    /// Feedback from the current round's review steps only
    pub feedback_this_round: Vec<StructuredFeedback>,
    pub iteration: usize,
    pub max_iterations: usize,
    pub final_score: Option<u8>,
    pub final_decision: Option<Decision>,
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub metadata: Context,
    #[serde(default)]
    pub rounds: Vec<RoundRecord>,
}

impl RevisionState {
    pub fn new(content: impl Into<String>, max_iterations: usize) -> Self {
        let content = content.into();
        Self {
            input_content: content.clone(),
            current_content: content,
            feedback_this_round: Vec::new(),
            iteration: 0,
            max_iterations,
            final_score: None,
            final_decision: None,
            stop_reason: None,
            metadata: Context::new(),
            rounds: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Context) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_terminated(&self) -> bool {
        self.stop_reason.is_some()
    }

    pub fn passed(&self) -> bool {
        self.final_decision == Some(Decision::Pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_label() {
        assert_eq!(Severity::from_label("HIGH"), Severity::High);
        assert_eq!(Severity::from_label(" critical "), Severity::High);
        assert_eq!(Severity::from_label("low"), Severity::Low);
        assert_eq!(Severity::from_label("whatever"), Severity::Medium);
        assert_eq!(Severity::default(), Severity::Medium);
    }

    #[test]
    fn test_issue_serializes_without_empty_suggestion() {
        let issue = Issue::new("too vague", Severity::Medium);
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"description": "too vague", "severity": "Medium"})
        );
    }

    #[test]
    fn test_score_is_clamped() {
        let feedback = StructuredFeedback::new("Judge", "ok").with_score(250);
        assert_eq!(feedback.score, Some(100));
    }

    #[test]
    fn test_decision_threshold() {
        assert_eq!(Decision::from_score(Some(80), 80), Decision::Pass);
        assert_eq!(Decision::from_score(Some(79), 80), Decision::Fail);
        assert_eq!(Decision::from_score(None, 80), Decision::Fail);
        assert_eq!(Decision::from_score(None, 0), Decision::Pass);
    }

    #[test]
    fn test_new_state() {
        let state = RevisionState::new("Mistakes were made.", 3);
        assert_eq!(state.input_content, state.current_content);
        assert_eq!(state.iteration, 0);
        assert!(state.feedback_this_round.is_empty());
        assert!(!state.is_terminated());
        assert!(!state.passed());
    }

    #[test]
    fn test_high_severity_count() {
        let feedback = StructuredFeedback::new("Style", "meh").with_issues(vec![
            Issue::new("passive voice", Severity::High),
            Issue::new("long sentence", Severity::Low),
            Issue::new("jargon", Severity::High),
        ]);
        assert_eq!(feedback.high_severity_count(), 2);
    }
}
