//! Structured feedback extraction from raw model output
//!
//! Model text is unreliable: it may arrive wrapped in code fences, surrounded by
//! prose, truncated, or with issues in whatever shape the model felt like. A
//! parse failure is data, not a fault, so everything here degrades instead of
//! returning an error.

use quill_core::{Issue, Severity, StructuredFeedback};
use serde_json::{Map, Value};

/// Placeholder used when the model returns an object without a summary
pub const MISSING_SUMMARY: &str = "No summary provided";

/// Placeholder used when an issue object has no recognizable description
pub const UNKNOWN_ISSUE: &str = "Unknown issue";

const DESCRIPTION_KEYS: &[&str] = &["description", "issue", "text", "problem", "message"];
const SEVERITY_KEYS: &[&str] = &["severity", "level", "priority"];
const SUGGESTION_KEYS: &[&str] = &["suggestion", "fix", "recommendation"];

/// How aggressively to coerce issue entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssueNormalization {
    /// Exact `description`/`severity`/`suggestion` keys
    #[default]
    Standard,
    /// Case-insensitive lookup across several candidate keys
    Lenient,
}

/// Remove a surrounding markdown code fence, if any
pub fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Parse the substring between the first `{` and the last `}` as a JSON object
pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
    let text = strip_code_fences(raw);
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Materialize a [`StructuredFeedback`] from raw model text
///
/// Falls back to the unparsed text as the summary with no issues.
pub fn parse_feedback(step_name: &str, raw: &str, mode: IssueNormalization) -> StructuredFeedback {
    let Some(object) = extract_json_object(raw) else {
        tracing::debug!("{}: response was not a JSON object, keeping raw text", step_name);
        return StructuredFeedback::new(step_name, raw);
    };

    let summary = match object.get("summary") {
        None | Some(Value::Null) => MISSING_SUMMARY.to_string(),
        Some(value) => value_to_text(value),
    };

    let mut feedback = StructuredFeedback::new(step_name, summary)
        .with_issues(normalize_issues(object.get("issues"), mode));

    feedback.score = object.get("score").and_then(read_score);
    feedback.rewritten_content = object
        .get("rewritten_content")
        .or_else(|| object.get("rewrittenContent"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string);

    feedback
}

/// Read a score from an integer, float or numeric string, clamped to 0-100
fn read_score(value: &Value) -> Option<u8> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    Some(number.round().clamp(0.0, 100.0) as u8)
}

/// Coerce whatever the model put under `issues` into normalized issues
pub fn normalize_issues(value: Option<&Value>, mode: IssueNormalization) -> Vec<Issue> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::Null => None,
            Value::String(s) => Some(Issue::new(s.clone(), Severity::Medium)),
            Value::Object(map) => Some(issue_from_object(map, mode)),
            other => Some(Issue::new(other.to_string(), Severity::Medium)),
        })
        .collect()
}

fn issue_from_object(map: &Map<String, Value>, mode: IssueNormalization) -> Issue {
    let lookup = |keys: &[&str]| -> Option<String> {
        let found = match mode {
            IssueNormalization::Standard => map.get(keys[0]),
            IssueNormalization::Lenient => find_key(map, keys),
        };
        found.filter(|v| !v.is_null()).map(value_to_text)
    };

    let description = lookup(DESCRIPTION_KEYS).unwrap_or_else(|| UNKNOWN_ISSUE.to_string());
    let severity = lookup(SEVERITY_KEYS)
        .map(|label| Severity::from_label(&label))
        .unwrap_or_default();

    let issue = Issue::new(description, severity);
    match lookup(SUGGESTION_KEYS) {
        Some(suggestion) if !suggestion.trim().is_empty() => issue.with_suggestion(suggestion),
        _ => issue,
    }
}

/// First candidate key present in the map, compared case-insensitively
fn find_key<'a>(map: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    candidates.iter().find_map(|candidate| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(candidate))
            .map(|(_, value)| value)
    })
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
