//! Turning submission outcomes into user-facing messages

use crate::client::SubmitOutcome;
use serde::Serialize;
use std::fmt;

/// Severity of a rendered outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Success,
    Warning,
    Error,
}

/// What the page (or terminal) shows after a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedOutcome {
    pub kind: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub lines: Vec<String>,
}

impl RenderedOutcome {
    fn message(kind: OutcomeKind, line: String) -> Self {
        Self {
            kind,
            title: None,
            lines: vec![line],
        }
    }
}

/// `0.87` -> `"87.00%"`
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.2}%", confidence * 100.0)
}

pub fn render(outcome: &SubmitOutcome) -> RenderedOutcome {
    match outcome {
        SubmitOutcome::EmptyInput => RenderedOutcome::message(
            OutcomeKind::Warning,
            "Please enter an abstract to classify.".to_string(),
        ),
        SubmitOutcome::Success(result) => RenderedOutcome {
            kind: OutcomeKind::Success,
            title: Some("Classification Complete!".to_string()),
            lines: vec![
                format!("Predicted Category: {}", result.label),
                format!("Confidence Score: {}", format_confidence(result.confidence)),
            ],
        },
        SubmitOutcome::HttpError { status, body } => {
            RenderedOutcome::message(OutcomeKind::Error, format!("Error: {} - {}", status, body))
        }
        SubmitOutcome::Unreachable(_) => RenderedOutcome::message(
            OutcomeKind::Error,
            "Could not connect to the backend. Is the inference server running?".to_string(),
        ),
        SubmitOutcome::Unexpected(detail) => RenderedOutcome::message(
            OutcomeKind::Error,
            format!("An unexpected error occurred: {}", detail),
        ),
    }
}

impl fmt::Display for RenderedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = &self.title {
            writeln!(f, "{}", title)?;
        }
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
