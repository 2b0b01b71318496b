use serde::{Deserialize, Serialize};

use super::super::domain::RecommendationDecision;

/// Accumulator threaded through every scoring step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationState {
    pub decision: RecommendationDecision,
    pub amount: f64,
    pub confidence: i32,
    pub reasoning: Vec<String>,
    pub risk_factors: Vec<String>,
}

impl Default for EvaluationState {
    fn default() -> Self {
        Self {
            decision: RecommendationDecision::Approve,
            amount: 0.0,
            confidence: 100,
            reasoning: Vec::new(),
            risk_factors: Vec::new(),
        }
    }
}

impl EvaluationState {
    pub(crate) fn note(mut self, reason: &str) -> Self {
        self.reasoning.push(reason.to_string());
        self
    }

    pub(crate) fn flag(mut self, risk: &str) -> Self {
        self.risk_factors.push(risk.to_string());
        self
    }

    pub(crate) fn penalize(mut self, points: i32) -> Self {
        self.confidence -= points;
        self
    }

    /// Absolute ceiling, not a subtraction.
    pub(crate) fn cap_confidence(mut self, ceiling: i32) -> Self {
        self.confidence = self.confidence.min(ceiling);
        self
    }

    pub(crate) fn set_confidence(mut self, value: i32) -> Self {
        self.confidence = value;
        self
    }

    pub(crate) fn downgrade(mut self, floor: RecommendationDecision) -> Self {
        self.decision = self.decision.downgrade_to(floor);
        self
    }

    pub(crate) fn with_amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }
}
