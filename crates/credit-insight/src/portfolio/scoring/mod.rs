//! Rule-based loan recommendation engine.
//!
//! Scoring runs as an ordered pipeline of pure steps over an [`EvaluationState`]. Steps only
//! ever move the decision toward `reject`; confidence is mostly decremented but a few rules
//! apply absolute ceilings instead, so the order of the table below is part of the contract.

mod state;
mod steps;

pub use state::EvaluationState;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::domain::{round_half_up, LoanRecommendation, RecommendationDecision, UserCreditProfile};

/// Signature shared by every pipeline step.
pub type StepFn = fn(&UserCreditProfile, EvaluationState) -> EvaluationState;

/// Named entry in the scoring pipeline.
#[derive(Clone, Copy)]
pub struct ScoringStep {
    pub name: &'static str,
    pub apply: StepFn,
}

impl std::fmt::Debug for ScoringStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringStep")
            .field("name", &self.name)
            .finish()
    }
}

static PIPELINE: [ScoringStep; 6] = [
    ScoringStep {
        name: "credit_score",
        apply: steps::credit_score_tier,
    },
    ScoringStep {
        name: "debt_to_income",
        apply: steps::debt_to_income,
    },
    ScoringStep {
        name: "payment_history",
        apply: steps::payment_history,
    },
    ScoringStep {
        name: "credit_utilization",
        apply: steps::credit_utilization,
    },
    ScoringStep {
        name: "account_age",
        apply: steps::account_age,
    },
    ScoringStep {
        name: "risk_level",
        apply: steps::risk_level,
    },
];

/// Stateless evaluator; every call builds a fresh accumulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Ordered step table, exposed so callers can audit or replay individual steps.
    pub fn steps(&self) -> &'static [ScoringStep] {
        &PIPELINE
    }

    /// Runs every step without finalizing amounts or confidence.
    pub fn run_pipeline(&self, profile: &UserCreditProfile) -> EvaluationState {
        PIPELINE
            .iter()
            .fold(EvaluationState::default(), |state, step| {
                (step.apply)(profile, state)
            })
    }

    pub fn evaluate(&self, profile: &UserCreditProfile) -> LoanRecommendation {
        self.evaluate_at(profile, Utc::now())
    }

    pub fn evaluate_at(
        &self,
        profile: &UserCreditProfile,
        timestamp: DateTime<Utc>,
    ) -> LoanRecommendation {
        let state = self.run_pipeline(profile);
        let recommendation = finalize(profile, state, timestamp);

        debug!(
            user_id = %recommendation.user_id,
            decision = recommendation.recommendation.label(),
            confidence = recommendation.confidence,
            risk_factors = recommendation.risk_factors.len(),
            "loan recommendation evaluated"
        );

        recommendation
    }
}

/// Rejections drop the amount and keep their raw confidence; everything else is rounded and
/// clamped to 0..=100.
pub fn finalize(
    profile: &UserCreditProfile,
    state: EvaluationState,
    timestamp: DateTime<Utc>,
) -> LoanRecommendation {
    let EvaluationState {
        decision,
        amount,
        confidence,
        reasoning,
        risk_factors,
    } = state;

    let (recommended_amount, confidence) = if decision == RecommendationDecision::Reject {
        (None, confidence)
    } else {
        (
            Some(whole_dollars(&profile.id, amount)),
            confidence.clamp(0, 100),
        )
    };

    LoanRecommendation {
        user_id: profile.id.clone(),
        user_name: profile.name.clone(),
        recommendation: decision,
        recommended_amount,
        reasoning,
        confidence,
        risk_factors,
        timestamp,
    }
}

/// Rounds half-up to whole dollars. NaN becomes 0 and anything outside the `i64` range
/// saturates at the nearest bound; both cases are logged.
fn whole_dollars(user_id: &str, amount: f64) -> i64 {
    let rounded = round_half_up(amount);
    if !(i64::MIN as f64..i64::MAX as f64).contains(&rounded) {
        warn!(user_id, amount, "recommended amount is not representable; saturating");
    }
    rounded as i64
}

/// Convenience wrapper for callers without an engine handle.
pub fn generate_recommendation(profile: &UserCreditProfile) -> LoanRecommendation {
    ScoringEngine.evaluate(profile)
}
