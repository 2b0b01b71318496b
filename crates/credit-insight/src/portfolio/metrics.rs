use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    round_half_up, CreditMetrics, LoanRecommendation, RiskDistribution, UserCreditProfile,
};
use super::scoring::ScoringEngine;

/// Metrics together with the recommendations they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAssessment {
    pub metrics: CreditMetrics,
    pub recommendations: Vec<LoanRecommendation>,
}

impl PortfolioAssessment {
    pub fn recommendation_for(&self, user_id: &str) -> Option<&LoanRecommendation> {
        self.recommendations
            .iter()
            .find(|recommendation| recommendation.user_id == user_id)
    }
}

/// Reduces a portfolio to [`CreditMetrics`], scoring every user once per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsAggregator {
    engine: ScoringEngine,
}

impl MetricsAggregator {
    pub fn new(engine: ScoringEngine) -> Self {
        Self { engine }
    }

    pub fn aggregate(&self, users: &[UserCreditProfile]) -> CreditMetrics {
        self.assess(users).metrics
    }

    pub fn assess(&self, users: &[UserCreditProfile]) -> PortfolioAssessment {
        self.assess_at(users, Utc::now())
    }

    /// Recommendations come back in input order.
    pub fn assess_at(
        &self,
        users: &[UserCreditProfile],
        timestamp: DateTime<Utc>,
    ) -> PortfolioAssessment {
        let recommendations: Vec<LoanRecommendation> = users
            .iter()
            .map(|user| self.engine.evaluate_at(user, timestamp))
            .collect();

        let metrics = summarize(users, &recommendations);

        PortfolioAssessment {
            metrics,
            recommendations,
        }
    }
}

fn summarize(users: &[UserCreditProfile], recommendations: &[LoanRecommendation]) -> CreditMetrics {
    let total_users = users.len();
    if total_users == 0 {
        return CreditMetrics::default();
    }
    let count = total_users as f64;

    let score_sum: f64 = users
        .iter()
        .map(|user| f64::from(user.current_credit_score))
        .sum();
    let average_credit_score = round_half_up(score_sum / count) as i64;

    let approved = recommendations
        .iter()
        .filter(|recommendation| recommendation.is_approved())
        .count();
    let approval_rate = round_half_up(approved as f64 / count * 100.0) as u32;

    let total_debt = users.iter().map(|user| user.total_debt).sum();

    let ratio_sum: f64 = users.iter().map(|user| user.debt_to_income_ratio).sum();
    let average_debt_to_income = round_half_up(ratio_sum / count * 100.0) / 100.0;

    let mut risk_distribution = RiskDistribution::default();
    for user in users {
        risk_distribution.record(user.risk_level);
    }

    CreditMetrics {
        total_users,
        average_credit_score,
        approval_rate,
        total_debt,
        average_debt_to_income,
        risk_distribution,
    }
}

/// Convenience wrapper for callers without an aggregator handle.
pub fn calculate_metrics(users: &[UserCreditProfile]) -> CreditMetrics {
    MetricsAggregator::default().aggregate(users)
}
