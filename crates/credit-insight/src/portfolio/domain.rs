use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Externally assigned risk label; independent of the engine's own risk factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(UnknownVariant(value.to_string())),
        }
    }
}

/// Account lifecycle flag carried for presentation; ignored by scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
    Flagged,
}

impl AccountStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Flagged => "flagged",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "flagged" => Ok(Self::Flagged),
            _ => Err(UnknownVariant(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized value '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

/// Outcome of a single historical payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    OnTime,
    Late,
    Missed,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::OnTime => "on-time",
            PaymentStatus::Late => "late",
            PaymentStatus::Missed => "missed",
        }
    }
}

/// Month-level snapshot kept for charts and commentary prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditHistoryEntry {
    pub date: DateTime<Utc>,
    pub credit_score: i32,
    pub payment_status: PaymentStatus,
    pub amount: f64,
    pub event: String,
}

/// Payment counters; no ordering or uniqueness constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistory {
    pub on_time: u32,
    pub late: u32,
    pub missed: u32,
}

impl PaymentHistory {
    pub fn total(&self) -> u64 {
        u64::from(self.on_time) + u64::from(self.late) + u64::from(self.missed)
    }

    /// Share of on-time payments, or 0 when nothing has been recorded.
    pub fn on_time_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            f64::from(self.on_time) / total as f64
        }
    }
}

/// Credit profile supplied by the data source; read-only during scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreditProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub current_credit_score: i32,
    #[serde(default)]
    pub credit_history: Vec<CreditHistoryEntry>,
    pub debt_to_income_ratio: f64,
    pub total_debt: f64,
    pub monthly_income: f64,
    pub payment_history: PaymentHistory,
    pub account_age: i32,
    pub credit_utilization: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

/// Recommendation tiers, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationDecision {
    Approve,
    Conditional,
    Reject,
}

impl RecommendationDecision {
    pub fn label(&self) -> &'static str {
        match self {
            RecommendationDecision::Approve => "approve",
            RecommendationDecision::Conditional => "conditional",
            RecommendationDecision::Reject => "reject",
        }
    }

    /// Moves toward `floor` without ever improving the current tier.
    pub fn downgrade_to(self, floor: RecommendationDecision) -> RecommendationDecision {
        self.max(floor)
    }
}

impl FromStr for RecommendationDecision {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approve" | "approved" => Ok(Self::Approve),
            "conditional" => Ok(Self::Conditional),
            "reject" | "rejected" => Ok(Self::Reject),
            _ => Err(UnknownVariant(value.to_string())),
        }
    }
}

/// Scoring output for one user, rebuilt on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecommendation {
    pub user_id: String,
    pub user_name: String,
    pub recommendation: RecommendationDecision,
    /// Whole dollars; absent on rejections. Amounts derived from non-finite income are 0, and
    /// amounts beyond the `i64` range saturate at `i64::MAX` or `i64::MIN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_amount: Option<i64>,
    pub reasoning: Vec<String>,
    pub confidence: i32,
    pub risk_factors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl LoanRecommendation {
    pub fn is_approved(&self) -> bool {
        self.recommendation == RecommendationDecision::Approve
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl RiskDistribution {
    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Low => self.low += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::High => self.high += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

/// Portfolio-level summary recomputed on every call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditMetrics {
    pub total_users: usize,
    pub average_credit_score: i64,
    pub approval_rate: u32,
    pub total_debt: f64,
    pub average_debt_to_income: f64,
    pub risk_distribution: RiskDistribution,
}

/// Rounds halfway values toward positive infinity.
pub(crate) fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downgrade_never_improves_the_current_tier() {
        use RecommendationDecision::*;
        assert_eq!(Approve.downgrade_to(Conditional), Conditional);
        assert_eq!(Conditional.downgrade_to(Approve), Conditional);
        assert_eq!(Reject.downgrade_to(Conditional), Reject);
        assert_eq!(Conditional.downgrade_to(Reject), Reject);
    }

    #[test]
    fn on_time_rate_guards_empty_history() {
        assert_eq!(PaymentHistory::default().on_time_rate(), 0.0);
        let history = PaymentHistory {
            on_time: 3,
            late: 1,
            missed: 0,
        };
        assert!((history.on_time_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn halfway_values_round_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(2.49), 2.0);
        assert_eq!(round_half_up(-0.4), 0.0);
    }

    #[test]
    fn profile_deserializes_from_generator_json() {
        let raw = serde_json::json!({
            "id": "user-7",
            "name": "Rachel Young",
            "email": "user7@example.com",
            "currentCreditScore": 702,
            "creditHistory": [{
                "date": "2025-01-01T00:00:00Z",
                "creditScore": 690,
                "paymentStatus": "on-time",
                "amount": 1200.0,
                "event": "Payment 1"
            }],
            "debtToIncomeRatio": 0.33,
            "totalDebt": 42000.0,
            "monthlyIncome": 6100.0,
            "paymentHistory": { "onTime": 40, "late": 2, "missed": 0 },
            "accountAge": 48,
            "creditUtilization": 35.0,
            "riskLevel": "medium",
            "status": "flagged",
            "lastUpdated": "2025-02-01T12:00:00Z"
        });

        let profile: UserCreditProfile = serde_json::from_value(raw).expect("profile parses");
        assert_eq!(profile.risk_level, RiskLevel::Medium);
        assert_eq!(profile.status, AccountStatus::Flagged);
        assert_eq!(
            profile.credit_history[0].payment_status,
            PaymentStatus::OnTime
        );
        assert_eq!(profile.payment_history.on_time, 40);
    }

    #[test]
    fn rejected_recommendation_omits_amount_on_the_wire() {
        let recommendation = LoanRecommendation {
            user_id: "user-1".to_string(),
            user_name: "John Smith".to_string(),
            recommendation: RecommendationDecision::Reject,
            recommended_amount: None,
            reasoning: vec!["Poor credit score".to_string()],
            confidence: 20,
            risk_factors: vec!["Very low credit score".to_string()],
            timestamp: Utc::now(),
        };

        let value = serde_json::to_value(&recommendation).expect("serializes");
        assert_eq!(value["recommendation"], "reject");
        assert!(value.get("recommendedAmount").is_none());
        assert_eq!(value["riskFactors"][0], "Very low credit score");
    }
}
