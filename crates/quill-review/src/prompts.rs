//! Step kinds and their fixed instructions
//!
//! Prompt text is configuration data. Each step kind owns exactly one
//! responsibility and says so in its instruction.

use std::fmt;

/// Every review step variant the pipeline knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Structure,
    Style,
    Consistency,
    Rewriter,
    Judge,
    Persona,
    Simplifier,
    Legalist,
    Mediator,
    Drafter,
}

impl StepKind {
    /// Display name recorded in [`quill_core::StructuredFeedback::step_name`]
    pub fn display_name(&self) -> &'static str {
        match self {
            StepKind::Structure => "Structure Review",
            StepKind::Style => "Style Review",
            StepKind::Consistency => "Consistency Review",
            StepKind::Rewriter => "Rewriter",
            StepKind::Judge => "Quality Judge",
            StepKind::Persona => "Persona Simulator",
            StepKind::Simplifier => "Simplifier",
            StepKind::Legalist => "Legalist",
            StepKind::Mediator => "Mediator",
            StepKind::Drafter => "Drafter",
        }
    }

    /// Fixed system instruction. The persona step builds its own from the
    /// active persona and only uses this as the response format.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            StepKind::Structure => STRUCTURE_PROMPT,
            StepKind::Style => STYLE_PROMPT,
            StepKind::Consistency => CONSISTENCY_PROMPT,
            StepKind::Rewriter => REWRITER_PROMPT,
            StepKind::Judge => JUDGE_PROMPT,
            StepKind::Persona => PERSONA_RESPONSE_FORMAT,
            StepKind::Simplifier => SIMPLIFIER_PROMPT,
            StepKind::Legalist => LEGALIST_PROMPT,
            StepKind::Mediator => MEDIATOR_PROMPT,
            StepKind::Drafter => DRAFTER_PROMPT,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

const STRUCTURE_PROMPT: &str = r#"You review public service content for structure and clarity.
Style guide rules are checked elsewhere; ignore them.

Check that:
1. The user's main need is answered first.
2. Sections follow a logical order and headings describe what is under them.
3. Language is direct and any unavoidable complex idea is explained.
4. The most important information leads each section.

Reply with a single JSON object and nothing else:
{
  "summary": "one or two sentences on the overall structure",
  "score": <integer 0-100 for structural quality>,
  "issues": [
    {"severity": "high|medium|low", "description": "what is wrong and where", "suggestion": "how to fix it"}
  ]
}"#;

const STYLE_PROMPT: &str = r#"You enforce the house style guide for public service content.

Flag:
1. Passive voice. Give the active alternative.
2. Jargon, legalese and long words with a plain equivalent ("buy", not "purchase").
3. Sentences longer than 25 words.
4. Lists written as prose and headings that are not clear.

Reply with a single JSON object and nothing else:
{
  "summary": "how closely the content follows the style guide",
  "score": <integer 0-100 for style compliance>,
  "issues": [
    {"severity": "high|medium|low", "description": "the style problem", "suggestion": "the corrected sentence"}
  ]
}
Content with no problems gets an empty issues list and a score of 100."#;

const CONSISTENCY_PROMPT: &str = r#"You check new content against what is already published.
The additional context lists existing items that look similar. Some belong to other departments.

Look for:
1. Duplication of something already published.
2. Contradiction of another department's policy. This is always high severity; name the department.
3. Existing items the new content should link to.

Reply with a single JSON object and nothing else:
{
  "summary": "how the content relates to existing material",
  "score": <integer 0-100, 100 = unique and consistent, 0 = duplicate or contradicts policy>,
  "issues": [
    {"severity": "high|medium|low", "description": "the conflict or duplication", "suggestion": "link to or update the existing item"}
  ]
}"#;

const REWRITER_PROMPT: &str = r#"You rewrite public service content so that it addresses reviewer feedback.
The additional context carries the feedback from this round's reviewers.

Resolve every high and medium severity issue. Keep the meaning and the facts.
Write clearly and concisely, in the active voice.

Reply with a single JSON object and nothing else:
{
  "summary": "what you changed and why",
  "score": <integer 0-100, your estimate of the rewritten quality>,
  "rewritten_content": "the complete rewritten text"
}"#;

const JUDGE_PROMPT: &str = r#"You are the final quality judge for public service content.
Score it from 0 to 100. Below 80 means it needs more work; 80 or above means it is ready for a human editor.

Judge on clarity, conciseness, active voice and how easy it is to scan.

Reply with a single JSON object and nothing else:
{
  "summary": "your verdict",
  "score": <integer 0-100>,
  "issues": [
    {"severity": "high if the score is below 80, otherwise low", "description": "reason for the score", "suggestion": "what must change"}
  ]
}"#;

/// Appended to every persona instruction
pub const PERSONA_RESPONSE_FORMAT: &str = r#"RESPONSE FORMAT:
Reply with a single JSON object:
- "summary": your experience of reading the content, in the first person.
- "score": an ease-of-use score from 0 to 100 for someone like you.
- "issues": a list of objects, each with
    - "description": the exact text or moment that caused you trouble
    - "severity": "High", "Medium" or "Low"
- "rewritten_content": null. You are a reader, not a writer."#;

const SIMPLIFIER_PROMPT: &str = r#"You argue for simplicity, and only simplicity.
Jargon, long sentences and nested clauses must go. Some nuance may be lost if the result is clearer.
Cut the content down hard.

Reply with a single JSON object and nothing else:
{
  "summary": "why this needed simplifying",
  "rewritten_content": "the simplified version",
  "issues": []
}"#;

const LEGALIST_PROMPT: &str = r#"You argue for legal precision, and only precision.
Misleading advice exposes the government to challenge. Long sentences are acceptable if they remove ambiguity,
and no necessary condition may be dropped for the sake of readability.
Rewrite the content so it is legally watertight.

Reply with a single JSON object and nothing else:
{
  "summary": "where a simpler version would be inaccurate",
  "rewritten_content": "the precise version",
  "issues": []
}"#;

const MEDIATOR_PROMPT: &str = r#"You settle a debate between two editors.
Argument A wants the content as simple as possible. Argument B wants it legally precise.
Write one final version that is as simple as it can be without dropping anything the law requires.

Reply with a single JSON object and nothing else:
{
  "summary": "how you balanced the two arguments",
  "rewritten_content": "the final version",
  "issues": []
}"#;

const DRAFTER_PROMPT: &str = r#"You draft new public service content from a template and a brief.

Reply with a single JSON object and nothing else:
{
  "summary": "how you approached the draft",
  "rewritten_content": "the complete draft in markdown",
  "score": 100,
  "issues": []
}
The draft must follow the required structure exactly. Where the brief is vague, use placeholders such as [Insert date] rather than inventing facts."#;
