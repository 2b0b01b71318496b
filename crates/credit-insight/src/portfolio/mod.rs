//! Credit portfolio scoring, aggregation, and the service facade around them.

pub mod domain;
pub mod generator;
pub mod import;
pub mod metrics;
pub mod report;
pub mod repository;
pub mod router;
pub mod sanitize;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AccountStatus, CreditHistoryEntry, CreditMetrics, LoanRecommendation, PaymentHistory,
    PaymentStatus, RecommendationDecision, RiskDistribution, RiskLevel, UserCreditProfile,
};
pub use generator::SyntheticPortfolioGenerator;
pub use import::{ProfileImportError, ProfileImporter};
pub use metrics::{calculate_metrics, MetricsAggregator, PortfolioAssessment};
pub use report::{InsightKind, PortfolioReport, RecommendationBreakdown, ReportKind};
pub use repository::{PortfolioRepository, RepositoryError, UserAnalysis, UserDetail};
pub use router::portfolio_router;
pub use sanitize::{sanitize_batch, RawProfile};
pub use scoring::{generate_recommendation, EvaluationState, ScoringEngine};
pub use service::{PortfolioService, PortfolioServiceError};
