//! Revision loop engine
//!
//! Drives [`transition`] with real review steps. Each round runs the three
//! reviewers in order, hands only that round's feedback to the rewriter, then
//! asks the judge whether to go again. Any step failure aborts the whole run.

use crate::state_machine::{transition, Action, Event, Phase};
use quill_core::config::RevisionConfig;
use quill_core::{Context, Decision, Result, RevisionState, RoundRecord, StructuredFeedback};
use quill_review::ReviewStep;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// The five steps one round needs
#[derive(Clone)]
pub struct ReviewPanel {
    pub structure: Arc<dyn ReviewStep>,
    pub style: Arc<dyn ReviewStep>,
    pub consistency: Arc<dyn ReviewStep>,
    pub rewriter: Arc<dyn ReviewStep>,
    pub judge: Arc<dyn ReviewStep>,
}

/// Runs review rounds until the judge passes or the budget runs out
///
/// Holds no per-run state, so one loop can serve many concurrent runs.
#[derive(Clone)]
pub struct RevisionLoop {
    panel: ReviewPanel,
    max_iterations: usize,
    pass_threshold: u8,
}

impl RevisionLoop {
    pub fn new(panel: ReviewPanel) -> Self {
        Self::from_config(panel, &RevisionConfig::default())
    }

    pub fn from_config(panel: ReviewPanel, config: &RevisionConfig) -> Self {
        Self {
            panel,
            max_iterations: config.max_iterations,
            pass_threshold: config.pass_threshold,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_pass_threshold(mut self, pass_threshold: u8) -> Self {
        self.pass_threshold = pass_threshold;
        self
    }

    /// Review `content` and return the state at termination
    pub async fn run(&self, content: &str) -> Result<RevisionState> {
        self.run_with_metadata(content, Context::new()).await
    }

    /// Same as [`run`](Self::run), carrying caller metadata on the state
    #[instrument(skip(self, content, metadata), fields(max_iterations = self.max_iterations))]
    pub async fn run_with_metadata(&self, content: &str, metadata: Context) -> Result<RevisionState> {
        let mut state = RevisionState::new(content, self.max_iterations).with_metadata(metadata);
        let mut phase = Phase::initial();
        let mut round = RoundInProgress::default();

        info!("Starting revision loop ({} chars)", content.len());
        info!("=== Iteration 1 of {} ===", self.max_iterations.max(1));

        loop {
            let event = match &phase {
                Phase::ReviewStructure => self.review(&self.panel.structure, &mut state).await?,
                Phase::ReviewStyle => self.review(&self.panel.style, &mut state).await?,
                Phase::ReviewConsistency => self.review(&self.panel.consistency, &mut state).await?,
                Phase::Rewrite => self.rewrite(&mut state, &mut round).await?,
                Phase::Judge => self.judge(&mut state, &mut round).await?,
                Phase::Terminated(reason) => {
                    info!(
                        "Revision loop finished: {:?} after {} iteration(s), score {:?}",
                        reason, state.iteration, state.final_score
                    );
                    state.stop_reason = Some(reason.clone());
                    break;
                }
            };

            let (next, actions) = transition(phase, event);
            for action in actions {
                self.apply(action, &mut state, &mut round);
            }
            phase = next;
        }

        Ok(state)
    }

    async fn review(&self, step: &Arc<dyn ReviewStep>, state: &mut RevisionState) -> Result<Event> {
        let feedback = step.execute(&state.current_content, None).await?;
        state.feedback_this_round.push(feedback);
        Ok(Event::Reviewed)
    }

    async fn rewrite(&self, state: &mut RevisionState, round: &mut RoundInProgress) -> Result<Event> {
        let context = rewrite_context(&state.feedback_this_round);
        let feedback = self
            .panel
            .rewriter
            .execute(&state.current_content, Some(&context))
            .await?;

        match &feedback.rewritten_content {
            Some(text) => state.current_content = text.clone(),
            None => debug!("Rewriter returned no text, keeping current content"),
        }
        state.iteration += 1;
        round.rewrite = Some(feedback);

        Ok(Event::Rewritten {
            iteration: state.iteration,
        })
    }

    async fn judge(&self, state: &mut RevisionState, round: &mut RoundInProgress) -> Result<Event> {
        let feedback = self
            .panel
            .judge
            .execute(&state.current_content, None)
            .await?;

        let decision = Decision::from_score(feedback.score, self.pass_threshold);
        state.final_score = feedback.score;
        state.final_decision = Some(decision);
        info!(
            "Judge scored iteration {}: {:?} ({})",
            state.iteration, feedback.score, decision
        );

        if let Some(record) = round.finish(state.iteration, feedback) {
            state.rounds.push(record);
        }

        Ok(Event::Judged {
            decision,
            iteration: state.iteration,
            max_iterations: state.max_iterations,
        })
    }

    fn apply(&self, action: Action, state: &mut RevisionState, round: &mut RoundInProgress) {
        match action {
            Action::ClearRoundFeedback => {
                round.reviews = std::mem::take(&mut state.feedback_this_round);
            }
            Action::StartRound { iteration } => {
                info!("=== Iteration {} of {} ===", iteration, self.max_iterations);
            }
            Action::LogActivity { message } => debug!("{}", message),
        }
    }
}

/// Pieces of the current round collected until the judge closes it
#[derive(Default)]
struct RoundInProgress {
    reviews: Vec<StructuredFeedback>,
    rewrite: Option<StructuredFeedback>,
}

impl RoundInProgress {
    fn finish(&mut self, iteration: usize, judge: StructuredFeedback) -> Option<RoundRecord> {
        let rewrite = self.rewrite.take()?;
        Some(RoundRecord {
            iteration,
            reviews: std::mem::take(&mut self.reviews),
            rewrite,
            judge,
        })
    }
}

/// Rewriter context built from one round's review feedback
pub fn rewrite_context(feedback: &[StructuredFeedback]) -> Context {
    let entries: Vec<Value> = feedback
        .iter()
        .map(|f| {
            json!({
                "step": f.step_name,
                "summary": f.summary,
                "score": f.score,
                "issues": f.issues,
            })
        })
        .collect();

    let mut context = Context::new();
    context.insert("feedback".to_string(), Value::Array(entries));
    context
}
