//! Affective-state classification over recent interaction windows.
//!
//! Two independent signals, deliberately not unified:
//!
//! - [`classify`] looks at the last 5 records and produces a categorical
//!   state from error rate and response latency.
//! - [`risk_score`] looks at the last 10 records and produces a coarse
//!   0–100 dropout-risk score from error rate alone.
//!
//! Both are pure functions of their input window: no hidden state, no side
//! effects.

use serde::{Deserialize, Serialize};

use crate::learner::InteractionRecord;

/// Records considered for categorical classification.
const CLASSIFY_WINDOW: usize = 5;
/// Records considered for the risk score.
const RISK_WINDOW: usize = 10;
/// Latency normalization ceiling: a 60s mean response maxes the signal.
const LATENCY_CEILING_MS: f64 = 60_000.0;

/// Categorical summary of a learner's recent emotional/cognitive condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffectiveState {
    Engaged,
    Neutral,
    Confused,
    Struggling,
    Fatigued,
}

impl AffectiveState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Engaged => "engaged",
            Self::Neutral => "neutral",
            Self::Confused => "confused",
            Self::Struggling => "struggling",
            Self::Fatigued => "fatigued",
        }
    }
}

impl std::fmt::Display for AffectiveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn tail(window: &[InteractionRecord], n: usize) -> &[InteractionRecord] {
    &window[window.len().saturating_sub(n)..]
}

/// Classify the learner's affective state from the last 5 interactions.
///
/// Decision table, first match wins:
///
/// | error rate | latency score | state      |
/// |------------|---------------|------------|
/// | > 0.6      | > 0.7         | struggling |
/// | > 0.6      | ≤ 0.7         | confused   |
/// | < 0.2      | > 0.8         | fatigued   |
/// | < 0.2      | < 0.5         | engaged    |
/// | otherwise  |               | neutral    |
///
/// An empty window is `Neutral`.
pub fn classify(window: &[InteractionRecord]) -> AffectiveState {
    let recent = tail(window, CLASSIFY_WINDOW);
    if recent.is_empty() {
        return AffectiveState::Neutral;
    }

    let n = recent.len() as f64;
    let incorrect = recent.iter().filter(|r| !r.is_correct).count() as f64;
    let error_rate = incorrect / n;

    let mean_latency = recent
        .iter()
        .map(|r| r.response_time_ms as f64)
        .sum::<f64>()
        / n;
    let latency_score = (mean_latency / LATENCY_CEILING_MS).min(1.0);

    if error_rate > 0.6 {
        if latency_score > 0.7 {
            // Hard problem, getting it wrong, taking a long time.
            AffectiveState::Struggling
        } else {
            // Fast guessing, getting it wrong.
            AffectiveState::Confused
        }
    } else if error_rate < 0.2 {
        if latency_score > 0.8 {
            // Correct but very slow.
            AffectiveState::Fatigued
        } else if latency_score < 0.5 {
            // Flow state.
            AffectiveState::Engaged
        } else {
            AffectiveState::Neutral
        }
    } else {
        AffectiveState::Neutral
    }
}

/// Dropout-risk score 0–100 from the last 10 interactions.
///
/// Proportional to the error rate over the window, rounded and clamped.
/// An empty window scores 0. This is a coarser signal than [`classify`]
/// and is computed independently of it.
pub fn risk_score(window: &[InteractionRecord]) -> u8 {
    let recent = tail(window, RISK_WINDOW);
    if recent.is_empty() {
        return 0;
    }

    let incorrect = recent.iter().filter(|r| !r.is_correct).count() as f64;
    let risk = (incorrect / recent.len() as f64) * 100.0;
    risk.round().clamp(0.0, 100.0) as u8
}
