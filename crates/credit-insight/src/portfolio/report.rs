use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    CreditMetrics, LoanRecommendation, RecommendationDecision, RiskLevel, UserCreditProfile,
};

/// Number of users quoted verbatim in reports and prompts.
pub const HIGHLIGHT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecommendationBreakdown {
    pub approved: usize,
    pub conditional: usize,
    pub rejected: usize,
}

impl RecommendationBreakdown {
    pub fn from_recommendations(recommendations: &[LoanRecommendation]) -> Self {
        let mut breakdown = Self::default();
        for recommendation in recommendations {
            match recommendation.recommendation {
                RecommendationDecision::Approve => breakdown.approved += 1,
                RecommendationDecision::Conditional => breakdown.conditional += 1,
                RecommendationDecision::Reject => breakdown.rejected += 1,
            }
        }
        breakdown
    }

    pub fn total(&self) -> usize {
        self.approved + self.conditional + self.rejected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    CreditScore,
    RiskAssessment,
    FinancialAction,
}

impl ReportKind {
    pub fn ordered() -> [ReportKind; 3] {
        [
            ReportKind::CreditScore,
            ReportKind::RiskAssessment,
            ReportKind::FinancialAction,
        ]
    }

    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::CreditScore => "credit-score",
            ReportKind::RiskAssessment => "risk-assessment",
            ReportKind::FinancialAction => "financial-action",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::CreditScore => "Credit Score Analysis Report",
            ReportKind::RiskAssessment => "Risk Assessment Report",
            ReportKind::FinancialAction => "Financial Action Plan",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported report type '{0}'")]
pub struct UnknownReportKind(pub String);

impl FromStr for ReportKind {
    type Err = UnknownReportKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ReportKind::ordered()
            .into_iter()
            .find(|kind| kind.slug() == value.trim())
            .ok_or_else(|| UnknownReportKind(value.to_string()))
    }
}

/// Per-user narratives the commentary service can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightKind {
    Analysis,
    Advice,
    RiskFactors,
    Trend,
    Anomalies,
}

impl InsightKind {
    pub fn ordered() -> [InsightKind; 5] {
        [
            InsightKind::Analysis,
            InsightKind::Advice,
            InsightKind::RiskFactors,
            InsightKind::Trend,
            InsightKind::Anomalies,
        ]
    }

    pub fn slug(&self) -> &'static str {
        match self {
            InsightKind::Analysis => "analysis",
            InsightKind::Advice => "advice",
            InsightKind::RiskFactors => "risk-factors",
            InsightKind::Trend => "trend",
            InsightKind::Anomalies => "anomalies",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported insight type '{0}'")]
pub struct UnknownInsightKind(pub String);

impl FromStr for InsightKind {
    type Err = UnknownInsightKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        InsightKind::ordered()
            .into_iter()
            .find(|kind| kind.slug() == value.trim())
            .ok_or_else(|| UnknownInsightKind(value.to_string()))
    }
}

/// Trimmed view of a user quoted in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightedUser {
    pub user_id: String,
    pub name: String,
    pub credit_score: i32,
    pub risk_level: RiskLevel,
    pub debt_to_income_ratio: f64,
    pub recommendation: Option<RecommendationDecision>,
}

impl HighlightedUser {
    pub fn from_profile(
        profile: &UserCreditProfile,
        recommendation: Option<&LoanRecommendation>,
    ) -> Self {
        Self {
            user_id: profile.id.clone(),
            name: profile.name.clone(),
            credit_score: profile.current_credit_score,
            risk_level: profile.risk_level,
            debt_to_income_ratio: profile.debt_to_income_ratio,
            recommendation: recommendation.map(|entry| entry.recommendation),
        }
    }
}

/// Deterministic report body plus optional model-written commentary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioReport {
    pub kind: ReportKind,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub metrics: CreditMetrics,
    pub breakdown: RecommendationBreakdown,
    pub highlighted_users: Vec<HighlightedUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
}

impl PortfolioReport {
    pub fn build(
        kind: ReportKind,
        users: &[UserCreditProfile],
        metrics: CreditMetrics,
        recommendations: &[LoanRecommendation],
        generated_at: DateTime<Utc>,
    ) -> Self {
        let highlighted_users = users
            .iter()
            .take(HIGHLIGHT_LIMIT)
            .map(|profile| {
                let recommendation = recommendations
                    .iter()
                    .find(|entry| entry.user_id == profile.id);
                HighlightedUser::from_profile(profile, recommendation)
            })
            .collect();

        Self {
            kind,
            title: kind.title().to_string(),
            generated_at,
            metrics,
            breakdown: RecommendationBreakdown::from_recommendations(recommendations),
            highlighted_users,
            commentary: None,
        }
    }
}
