//! Pure state machine for the revision loop
//!
//! No I/O and no async: `transition(phase, event) -> (phase, actions)` is a
//! deterministic function the loop engine drives. Invalid transitions end in
//! `Terminated(InvalidTransition)` instead of panicking.

use quill_core::{Decision, StopReason};

/// Where a revision round currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    ReviewStructure,
    ReviewStyle,
    ReviewConsistency,
    Rewrite,
    Judge,
    Terminated(StopReason),
}

impl Phase {
    /// Phase every run starts in
    pub fn initial() -> Self {
        Phase::ReviewStructure
    }
}

/// Outcomes reported back by the loop engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A review step appended its feedback
    Reviewed,
    /// The rewriter finished and the iteration counter moved on
    Rewritten { iteration: usize },
    /// The judge scored the current content
    Judged {
        decision: Decision,
        iteration: usize,
        max_iterations: usize,
    },
}

/// Side effects for the engine to carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Drop this round's review feedback so it cannot reach the next rewrite
    ClearRoundFeedback,
    /// Start the next round
    StartRound { iteration: usize },
    /// Log activity
    LogActivity { message: String },
}

/// Pure state transition function
///
/// # Invalid Transitions
/// Any event a phase cannot accept yields `Terminated(InvalidTransition)`.
/// This function never panics.
pub fn transition(phase: Phase, event: Event) -> (Phase, Vec<Action>) {
    match (phase, event) {
        (Phase::ReviewStructure, Event::Reviewed) => (Phase::ReviewStyle, vec![]),
        (Phase::ReviewStyle, Event::Reviewed) => (Phase::ReviewConsistency, vec![]),
        (Phase::ReviewConsistency, Event::Reviewed) => (
            Phase::Rewrite,
            vec![Action::LogActivity {
                message: "Reviews complete, rewriting".to_string(),
            }],
        ),

        (Phase::Rewrite, Event::Rewritten { iteration }) => (
            Phase::Judge,
            vec![
                Action::ClearRoundFeedback,
                Action::LogActivity {
                    message: format!("Rewrite {} complete, judging", iteration),
                },
            ],
        ),

        (Phase::Judge, Event::Judged { decision: Decision::Pass, iteration, .. }) => (
            Phase::Terminated(StopReason::Passed),
            vec![Action::LogActivity {
                message: format!("Judge passed the content after {} round(s)", iteration),
            }],
        ),

        (
            Phase::Judge,
            Event::Judged {
                decision: Decision::Fail,
                iteration,
                max_iterations,
            },
        ) => {
            if iteration >= max_iterations {
                (
                    Phase::Terminated(StopReason::MaxIterations),
                    vec![Action::LogActivity {
                        message: format!("Iteration budget of {} exhausted", max_iterations),
                    }],
                )
            } else {
                (
                    Phase::ReviewStructure,
                    vec![Action::StartRound {
                        iteration: iteration + 1,
                    }],
                )
            }
        }

        // Terminal phase - no valid transitions
        (Phase::Terminated(reason), event) => (
            Phase::Terminated(StopReason::InvalidTransition(format!(
                "Terminated ({:?}) cannot handle event {:?}",
                reason, event
            ))),
            vec![],
        ),

        // All other invalid transitions
        (phase, event) => (
            Phase::Terminated(StopReason::InvalidTransition(format!(
                "{:?} cannot handle event {:?}",
                phase, event
            ))),
            vec![],
        ),
    }
}
