//! End-to-end revision loop scenarios with scripted steps

use async_trait::async_trait;
use quill_core::{
    Context, Decision, InvocationFailure, QuillError, Result, StopReason, StructuredFeedback,
};
use quill_orchestrator::{ReviewPanel, RevisionLoop};
use quill_review::ReviewStep;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Returns a fixed score and records every content/context it saw
struct ScoringStep {
    name: String,
    scores: Mutex<VecDeque<u8>>,
    fallback: u8,
    seen: Mutex<Vec<(String, Option<Context>)>>,
}

impl ScoringStep {
    fn new(name: &str, score: u8) -> Arc<Self> {
        Self::scripted(name, &[], score)
    }

    fn scripted(name: &str, scores: &[u8], fallback: u8) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            scores: Mutex::new(scores.iter().copied().collect()),
            fallback,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<(String, Option<Context>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReviewStep for ScoringStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, content: &str, context: Option<&Context>) -> Result<StructuredFeedback> {
        self.seen
            .lock()
            .unwrap()
            .push((content.to_string(), context.cloned()));
        let score = self.scores.lock().unwrap().pop_front().unwrap_or(self.fallback);
        Ok(StructuredFeedback::new(&self.name, format!("{} says {}", self.name, score)).with_score(score))
    }
}

/// Rewrites content from a script; `None` entries return no rewrite
struct ScriptedRewriter {
    rewrites: Mutex<VecDeque<Option<String>>>,
    seen: Mutex<Vec<(String, Option<Context>)>>,
}

impl ScriptedRewriter {
    fn new(rewrites: &[Option<&str>]) -> Arc<Self> {
        Arc::new(Self {
            rewrites: Mutex::new(rewrites.iter().map(|r| r.map(str::to_string)).collect()),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Appends a round marker to whatever it is given
    fn numbering() -> Arc<Self> {
        Self::new(&[])
    }

    fn seen(&self) -> Vec<(String, Option<Context>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReviewStep for ScriptedRewriter {
    fn name(&self) -> &str {
        "Rewriter"
    }

    async fn execute(&self, content: &str, context: Option<&Context>) -> Result<StructuredFeedback> {
        let round = {
            let mut seen = self.seen.lock().unwrap();
            seen.push((content.to_string(), context.cloned()));
            seen.len()
        };

        let scripted = self.rewrites.lock().unwrap().pop_front();
        let rewrite = match scripted {
            Some(entry) => entry,
            None => Some(format!("{} [r{}]", content, round)),
        };

        let feedback = StructuredFeedback::new("Rewriter", "addressed feedback");
        Ok(match rewrite {
            Some(text) => feedback.with_rewrite(text),
            None => feedback,
        })
    }
}

struct FailingStep;

#[async_trait]
impl ReviewStep for FailingStep {
    fn name(&self) -> &str {
        "Style Review"
    }

    async fn execute(&self, _content: &str, _context: Option<&Context>) -> Result<StructuredFeedback> {
        Err(QuillError::invocation(
            InvocationFailure::Authentication,
            "API key rejected",
        ))
    }
}

fn panel(
    reviewer_score: u8,
    rewriter: Arc<dyn ReviewStep>,
    judge: Arc<dyn ReviewStep>,
) -> ReviewPanel {
    ReviewPanel {
        structure: ScoringStep::new("Structure Review", reviewer_score),
        style: ScoringStep::new("Style Review", reviewer_score),
        consistency: ScoringStep::new("Consistency Review", reviewer_score),
        rewriter,
        judge,
    }
}

#[tokio::test]
async fn test_passive_voice_scenario_passes_in_one_round() {
    let rewriter = ScriptedRewriter::new(&[Some("I made mistakes.")]);
    let judge = ScoringStep::new("Quality Judge", 85);
    let engine = RevisionLoop::new(panel(70, rewriter, judge));

    let state = engine.run("Mistakes were made.").await.unwrap();

    assert_eq!(state.input_content, "Mistakes were made.");
    assert_eq!(state.current_content, "I made mistakes.");
    assert_eq!(state.final_decision, Some(Decision::Pass));
    assert_eq!(state.final_score, Some(85));
    assert_eq!(state.iteration, 1);
    assert_eq!(state.stop_reason, Some(StopReason::Passed));
    assert_eq!(state.rounds.len(), 1);
    assert_eq!(state.rounds[0].reviews.len(), 3);

    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["final_decision"], "pass");
}

#[tokio::test]
async fn test_failing_judge_runs_exactly_max_iterations() {
    let judge = ScoringStep::new("Quality Judge", 60);
    let engine =
        RevisionLoop::new(panel(50, ScriptedRewriter::numbering(), judge.clone())).with_max_iterations(4);

    let state = engine.run("draft").await.unwrap();

    assert_eq!(state.iteration, 4);
    assert_eq!(state.max_iterations, 4);
    assert_eq!(state.final_decision, Some(Decision::Fail));
    assert_eq!(state.stop_reason, Some(StopReason::MaxIterations));
    assert_eq!(state.rounds.len(), 4);
    assert_eq!(judge.seen().len(), 4);
}

#[tokio::test]
async fn test_judge_passes_on_second_round() {
    let judge = ScoringStep::scripted("Quality Judge", &[79], 80);
    let engine = RevisionLoop::new(panel(50, ScriptedRewriter::numbering(), judge));

    let state = engine.run("draft").await.unwrap();

    assert_eq!(state.iteration, 2);
    assert_eq!(state.final_score, Some(80));
    assert_eq!(state.final_decision, Some(Decision::Pass));
}

#[tokio::test]
async fn test_missing_judge_score_counts_as_fail() {
    struct SilentJudge;

    #[async_trait]
    impl ReviewStep for SilentJudge {
        fn name(&self) -> &str {
            "Quality Judge"
        }

        async fn execute(&self, _content: &str, _context: Option<&Context>) -> Result<StructuredFeedback> {
            Ok(StructuredFeedback::new("Quality Judge", "unparseable reply"))
        }
    }

    let engine = RevisionLoop::new(panel(90, ScriptedRewriter::numbering(), Arc::new(SilentJudge)))
        .with_max_iterations(2);
    let state = engine.run("draft").await.unwrap();

    assert_eq!(state.final_score, None);
    assert_eq!(state.final_decision, Some(Decision::Fail));
    assert_eq!(state.iteration, 2);
}

#[tokio::test]
async fn test_rewritten_content_feeds_next_round() {
    let structure = ScoringStep::new("Structure Review", 50);
    let rewriter = ScriptedRewriter::numbering();
    let judge = ScoringStep::new("Quality Judge", 10);
    let engine = RevisionLoop::new(ReviewPanel {
        structure: structure.clone(),
        style: ScoringStep::new("Style Review", 50),
        consistency: ScoringStep::new("Consistency Review", 50),
        rewriter: rewriter.clone(),
        judge: judge.clone(),
    })
    .with_max_iterations(3);

    let state = engine.run("v0").await.unwrap();

    let reviewed: Vec<String> = structure.seen().into_iter().map(|(c, _)| c).collect();
    assert_eq!(reviewed, vec!["v0", "v0 [r1]", "v0 [r1] [r2]"]);

    let judged: Vec<String> = judge.seen().into_iter().map(|(c, _)| c).collect();
    assert_eq!(judged, vec!["v0 [r1]", "v0 [r1] [r2]", "v0 [r1] [r2] [r3]"]);
    assert_eq!(state.current_content, "v0 [r1] [r2] [r3]");
}

#[tokio::test]
async fn test_rewriter_sees_only_current_round_feedback() {
    let rewriter = ScriptedRewriter::numbering();
    let judge = ScoringStep::new("Quality Judge", 10);
    let engine = RevisionLoop::new(panel(40, rewriter.clone(), judge)).with_max_iterations(3);

    let state = engine.run("draft").await.unwrap();

    for (_, context) in rewriter.seen() {
        let context = context.expect("rewriter always gets context");
        let feedback = context["feedback"].as_array().unwrap();
        assert_eq!(feedback.len(), 3);
        assert_eq!(feedback[0]["step"], "Structure Review");
        assert_eq!(feedback[1]["step"], "Style Review");
        assert_eq!(feedback[2]["step"], "Consistency Review");
        assert_eq!(feedback[0]["score"], json!(40));
    }
    assert!(state.feedback_this_round.is_empty());
    assert!(state.rounds.iter().all(|r| r.reviews.len() == 3));
}

#[tokio::test]
async fn test_missing_rewrite_keeps_content() {
    let rewriter = ScriptedRewriter::new(&[None]);
    let judge = ScoringStep::new("Quality Judge", 95);
    let engine = RevisionLoop::new(panel(70, rewriter, judge));

    let state = engine.run("Unchanged text.").await.unwrap();

    assert_eq!(state.current_content, "Unchanged text.");
    assert_eq!(state.iteration, 1);
    assert_eq!(state.final_decision, Some(Decision::Pass));
}

#[tokio::test]
async fn test_zero_budget_runs_one_round() {
    let judge = ScoringStep::new("Quality Judge", 10);
    let engine =
        RevisionLoop::new(panel(40, ScriptedRewriter::numbering(), judge)).with_max_iterations(0);

    let state = engine.run("draft").await.unwrap();

    assert_eq!(state.iteration, 1);
    assert_eq!(state.stop_reason, Some(StopReason::MaxIterations));
}

#[tokio::test]
async fn test_custom_pass_threshold() {
    let judge = ScoringStep::new("Quality Judge", 65);
    let engine = RevisionLoop::new(panel(40, ScriptedRewriter::numbering(), judge)).with_pass_threshold(60);

    let state = engine.run("draft").await.unwrap();
    assert_eq!(state.final_decision, Some(Decision::Pass));
    assert_eq!(state.iteration, 1);
}

#[tokio::test]
async fn test_step_failure_aborts_run() {
    let rewriter = ScriptedRewriter::numbering();
    let judge = ScoringStep::new("Quality Judge", 90);
    let engine = RevisionLoop::new(ReviewPanel {
        structure: ScoringStep::new("Structure Review", 50),
        style: Arc::new(FailingStep),
        consistency: ScoringStep::new("Consistency Review", 50),
        rewriter: rewriter.clone(),
        judge: judge.clone(),
    });

    let err = engine.run("draft").await.unwrap_err();

    assert!(err.is_credential_related());
    assert!(rewriter.seen().is_empty());
    assert!(judge.seen().is_empty());
}

#[tokio::test]
async fn test_metadata_is_carried() {
    let judge = ScoringStep::new("Quality Judge", 90);
    let engine = RevisionLoop::new(panel(70, ScriptedRewriter::numbering(), judge));

    let mut metadata = Context::new();
    metadata.insert("source_url".into(), json!("https://www.gov.uk/vat-rates"));

    let state = engine.run_with_metadata("draft", metadata).await.unwrap();
    assert_eq!(state.metadata["source_url"], "https://www.gov.uk/vat-rates");
}

#[tokio::test]
async fn test_independent_runs_share_one_loop() {
    let judge = ScoringStep::new("Quality Judge", 90);
    let engine = Arc::new(RevisionLoop::new(panel(70, ScriptedRewriter::new(&[]), judge)));

    let handles: Vec<_> = ["alpha", "beta", "gamma"]
        .into_iter()
        .map(|content| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.run(content).await })
        })
        .collect();

    let mut finals = Vec::new();
    for handle in handles {
        let state = handle.await.unwrap().unwrap();
        assert_eq!(state.iteration, 1);
        assert!(state.current_content.starts_with(&state.input_content));
        finals.push(state.input_content);
    }
    finals.sort();
    assert_eq!(finals, vec!["alpha", "beta", "gamma"]);
}
