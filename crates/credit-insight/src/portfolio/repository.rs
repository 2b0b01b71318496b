use serde::{Deserialize, Serialize};

use super::domain::{LoanRecommendation, UserCreditProfile};
use super::report::InsightKind;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait PortfolioRepository: Send + Sync {
    /// Swaps the active portfolio, returning the number of stored profiles.
    fn replace_all(&self, profiles: Vec<UserCreditProfile>) -> Result<usize, RepositoryError>;
    /// Profiles in insertion order.
    fn list(&self) -> Result<Vec<UserCreditProfile>, RepositoryError>;
    fn fetch(&self, user_id: &str) -> Result<Option<UserCreditProfile>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("portfolio contains duplicate user id '{0}'")]
    DuplicateUser(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Profile paired with the recommendation computed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    pub profile: UserCreditProfile,
    pub recommendation: LoanRecommendation,
}

/// Per-user narrative produced by the commentary service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalysis {
    pub user_id: String,
    pub kind: InsightKind,
    pub recommendation: LoanRecommendation,
    pub analysis: String,
}
