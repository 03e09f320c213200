//! Translates policy actions and risk scores into user-facing
//! recommendations.
//!
//! Two distinct surfaces:
//!
//! - [`InterventionEngine::recommend_action`] — the *learned* path: asks
//!   the RL policy for an action and maps it to a structured descriptor.
//! - [`recommend_path`] — a coarse, explainable threshold fallback that is
//!   deliberately independent of the learned policy and must stay simple
//!   enough to audit.

use std::sync::Arc;

use serde::Serialize;

use crate::affect::AffectiveState;
use crate::policy::{Action, InterventionPolicy};

/// A structured, user-facing intervention.
///
/// Field names keep the original wire shape (`type`/`message`/`action`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterventionDescriptor {
    #[serde(rename = "type")]
    pub kind: Action,
    pub message: String,
    #[serde(rename = "action")]
    pub ui_action: String,
}

/// A coarse learning-path recommendation derived from the risk score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathDescriptor {
    pub action: String,
    pub reason: String,
    pub target: String,
}

/// Map a policy action to its descriptor. `current_concept` only templates
/// the visual-aid message.
pub fn descriptor_for(action: Action, current_concept: &str) -> InterventionDescriptor {
    let (message, ui_action) = match action {
        Action::Hint => (
            "Here is a hint to help you...".to_string(),
            "show_hint",
        ),
        Action::VisualAid => (
            format!("Here is a visual diagram for {current_concept}."),
            "show_visual",
        ),
        Action::Break => (
            "You've been working hard! Take a 5-minute break.".to_string(),
            "suggest_break",
        ),
        Action::MindGame => (
            "Feeling tired? Let's play a quick mind game to refocus!".to_string(),
            "start_game",
        ),
        Action::Video => (
            "Let's take a moment to relax with a short video.".to_string(),
            "play_video",
        ),
        Action::EasierProblem => (
            "Let's try a simpler example first.".to_string(),
            "decrease_difficulty",
        ),
    };
    InterventionDescriptor {
        kind: action,
        message,
        ui_action: ui_action.to_string(),
    }
}

/// Threshold mapping from dropout risk to a next-step recommendation.
/// Independent of the RL policy by design.
pub fn recommend_path(risk_score: u8, _current_domain: &str) -> PathDescriptor {
    if risk_score > 70 {
        PathDescriptor {
            action: "Review Foundations".to_string(),
            reason: "High risk of dropout detected. Strengthening basics is recommended."
                .to_string(),
            target: "beginner_concepts".to_string(),
        }
    } else if risk_score > 40 {
        PathDescriptor {
            action: "Practice More".to_string(),
            reason: "You're doing okay, but a bit more practice will help solidify concepts."
                .to_string(),
            target: "practice_problems".to_string(),
        }
    } else {
        PathDescriptor {
            action: "Advance to Next Level".to_string(),
            reason: "Great performance! You are ready for more advanced topics.".to_string(),
            target: "advanced_concepts".to_string(),
        }
    }
}

/// Chooses and shapes pedagogical interventions for a detected affective
/// state.
pub struct InterventionEngine {
    policy: Arc<InterventionPolicy>,
}

impl InterventionEngine {
    pub fn new(policy: Arc<InterventionPolicy>) -> Self {
        Self { policy }
    }

    /// Ask the policy for an action and shape it for the caller.
    pub fn recommend_action(
        &self,
        state: AffectiveState,
        current_concept: &str,
    ) -> InterventionDescriptor {
        let action = self.policy.choose_action(state);
        descriptor_for(action, current_concept)
    }

    /// See [`recommend_path`].
    pub fn recommend_path(&self, risk_score: u8, current_domain: &str) -> PathDescriptor {
        recommend_path(risk_score, current_domain)
    }
}
