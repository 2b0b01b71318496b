use super::super::domain::{RecommendationDecision, RiskLevel, UserCreditProfile};
use super::state::EvaluationState;

use RecommendationDecision::{Conditional, Reject};

const MISSED_PAYMENT_LIMIT: u32 = 5;
const LONG_HISTORY_MONTHS: i32 = 60;
const SHORT_HISTORY_MONTHS: i32 = 24;

pub(crate) fn credit_score_tier(
    profile: &UserCreditProfile,
    state: EvaluationState,
) -> EvaluationState {
    let score = profile.current_credit_score;
    let income = profile.monthly_income;

    if score >= 750 {
        state
            .note("Excellent credit score")
            .with_amount(income * 0.5)
    } else if score >= 700 {
        state.note("Good credit score").with_amount(income * 0.4)
    } else if score >= 650 {
        state
            .note("Fair credit score")
            .with_amount(income * 0.3)
            .downgrade(Conditional)
            .penalize(20)
    } else if score >= 580 {
        state
            .note("Below average credit score")
            .with_amount(income * 0.2)
            .downgrade(Conditional)
            .penalize(40)
            .flag("Low credit score")
    } else {
        state
            .note("Poor credit score")
            .downgrade(Reject)
            .set_confidence(20)
            .flag("Very low credit score")
    }
}

pub(crate) fn debt_to_income(
    profile: &UserCreditProfile,
    state: EvaluationState,
) -> EvaluationState {
    let ratio = profile.debt_to_income_ratio;

    if ratio < 0.3 {
        let floor = profile.monthly_income * 0.3;
        let amount = state.amount.max(floor);
        state.note("Low debt-to-income ratio").with_amount(amount)
    } else if ratio < 0.4 {
        state.note("Moderate debt-to-income ratio").penalize(10)
    } else if ratio < 0.5 {
        let amount = state.amount * 0.7;
        state
            .note("High debt-to-income ratio")
            .with_amount(amount)
            .penalize(20)
            .flag("High debt burden")
            .downgrade(Conditional)
    } else {
        state
            .note("Very high debt-to-income ratio")
            .downgrade(Reject)
            .cap_confidence(30)
            .flag("Excessive debt burden")
    }
}

pub(crate) fn payment_history(
    profile: &UserCreditProfile,
    state: EvaluationState,
) -> EvaluationState {
    let rate = profile.payment_history.on_time_rate();

    let state = if rate >= 0.95 {
        state.note("Excellent payment history")
    } else if rate >= 0.85 {
        state.note("Good payment history").penalize(5)
    } else if rate >= 0.70 {
        state
            .note("Fair payment history")
            .penalize(15)
            .flag("Some late payments")
            .downgrade(Conditional)
    } else {
        state
            .note("Poor payment history")
            .penalize(30)
            .flag("Frequent late or missed payments")
            .downgrade(Conditional)
    };

    // Applies regardless of the band above.
    if profile.payment_history.missed > MISSED_PAYMENT_LIMIT {
        state
            .downgrade(Reject)
            .cap_confidence(25)
            .flag("Multiple missed payments")
    } else {
        state
    }
}

pub(crate) fn credit_utilization(
    profile: &UserCreditProfile,
    state: EvaluationState,
) -> EvaluationState {
    let utilization = profile.credit_utilization;

    if utilization < 30.0 {
        state.note("Low credit utilization")
    } else if utilization < 50.0 {
        state.note("Moderate credit utilization").penalize(5)
    } else if utilization < 70.0 {
        state
            .note("High credit utilization")
            .penalize(15)
            .flag("High credit card usage")
            .downgrade(Conditional)
    } else {
        state
            .note("Very high credit utilization")
            .penalize(25)
            .flag("Excessive credit card usage")
            .downgrade(Conditional)
    }
}

/// 24..=59 months records nothing.
pub(crate) fn account_age(profile: &UserCreditProfile, state: EvaluationState) -> EvaluationState {
    if profile.account_age >= LONG_HISTORY_MONTHS {
        state.note("Long credit history")
    } else if profile.account_age < SHORT_HISTORY_MONTHS {
        state
            .note("Short credit history")
            .penalize(10)
            .flag("Limited credit history")
    } else {
        state
    }
}

pub(crate) fn risk_level(profile: &UserCreditProfile, state: EvaluationState) -> EvaluationState {
    match profile.risk_level {
        RiskLevel::High => state
            .downgrade(Reject)
            .cap_confidence(20)
            .flag("High risk profile"),
        RiskLevel::Medium => state
            .downgrade(Conditional)
            .penalize(15)
            .flag("Medium risk profile"),
        RiskLevel::Low => state,
    }
}
