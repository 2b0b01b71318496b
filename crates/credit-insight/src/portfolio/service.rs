use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::domain::{
    CreditMetrics, LoanRecommendation, RecommendationDecision, UserCreditProfile,
};
use super::generator::SyntheticPortfolioGenerator;
use super::metrics::{MetricsAggregator, PortfolioAssessment};
use super::report::{InsightKind, PortfolioReport, ReportKind};
use super::repository::{PortfolioRepository, RepositoryError, UserAnalysis, UserDetail};
use super::sanitize::sanitize_batch;
use super::scoring::ScoringEngine;
use crate::commentary::{
    insight_request, portfolio_chat_request, report_request, ChatCompletionRequest, ChatContext,
    CommentaryConfig, CommentaryError, CommentaryProvider, ReportPromptData,
};
use crate::config::PortfolioConfig;

/// Upper bound on profiles produced by a single generate call.
pub const MAX_GENERATED_PROFILES: usize = 500;

/// Service composing the repository, scoring engine, aggregator, and commentary provider.
pub struct PortfolioService<R, C> {
    repository: Arc<R>,
    commentary: Arc<C>,
    commentary_config: CommentaryConfig,
    engine: ScoringEngine,
    aggregator: MetricsAggregator,
    generator: Mutex<SyntheticPortfolioGenerator>,
    default_count: usize,
}

impl<R, C> PortfolioService<R, C>
where
    R: PortfolioRepository + 'static,
    C: CommentaryProvider + 'static,
{
    pub fn new(
        repository: Arc<R>,
        commentary: Arc<C>,
        portfolio: PortfolioConfig,
        commentary_config: CommentaryConfig,
    ) -> Self {
        let engine = ScoringEngine::new();

        Self {
            repository,
            commentary,
            commentary_config,
            engine,
            aggregator: MetricsAggregator::new(engine),
            generator: Mutex::new(SyntheticPortfolioGenerator::new(portfolio.seed)),
            default_count: portfolio.default_count,
        }
    }

    /// Replace the portfolio with freshly generated synthetic profiles.
    pub fn generate(
        &self,
        count: Option<usize>,
    ) -> Result<Vec<UserCreditProfile>, PortfolioServiceError> {
        let requested = count.unwrap_or(self.default_count);
        if requested == 0 || requested > MAX_GENERATED_PROFILES {
            return Err(PortfolioServiceError::InvalidCount {
                requested,
                max: MAX_GENERATED_PROFILES,
            });
        }

        let profiles = self
            .generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate(requested, Utc::now());

        self.repository.replace_all(profiles.clone())?;
        info!(count = profiles.len(), "synthetic portfolio generated");
        Ok(profiles)
    }

    /// Replace the portfolio with caller-supplied profiles.
    pub fn load(&self, profiles: Vec<UserCreditProfile>) -> Result<usize, PortfolioServiceError> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = profiles.iter().find(|profile| !seen.insert(&profile.id)) {
            return Err(RepositoryError::DuplicateUser(duplicate.id.clone()).into());
        }

        let stored = self.repository.replace_all(profiles)?;
        info!(count = stored, "portfolio loaded");
        Ok(stored)
    }

    /// Replace the portfolio with loosely typed entries, normalizing each one first.
    ///
    /// Entries that are not JSON objects are skipped; the rest must still carry unique ids.
    pub fn load_lenient(&self, entries: &[Value]) -> Result<usize, PortfolioServiceError> {
        let profiles = sanitize_batch(entries, entries.len(), Utc::now());
        debug!(
            received = entries.len(),
            accepted = profiles.len(),
            "loosely typed profiles normalized"
        );
        self.load(profiles)
    }

    pub fn users(&self) -> Result<Vec<UserCreditProfile>, PortfolioServiceError> {
        Ok(self.repository.list()?)
    }

    pub fn user_detail(&self, user_id: &str) -> Result<UserDetail, PortfolioServiceError> {
        let profile = self.fetch(user_id)?;
        let recommendation = self.engine.evaluate(&profile);
        Ok(UserDetail {
            profile,
            recommendation,
        })
    }

    /// Recommendations for the stored portfolio, optionally restricted to one decision.
    pub fn recommendations(
        &self,
        decision: Option<RecommendationDecision>,
    ) -> Result<Vec<LoanRecommendation>, PortfolioServiceError> {
        let assessment = self.assess()?;
        Ok(assessment
            .recommendations
            .into_iter()
            .filter(|entry| decision.map_or(true, |wanted| entry.recommendation == wanted))
            .collect())
    }

    pub fn metrics(&self) -> Result<CreditMetrics, PortfolioServiceError> {
        let users = self.repository.list()?;
        Ok(self.aggregator.aggregate(&users))
    }

    pub fn assess(&self) -> Result<PortfolioAssessment, PortfolioServiceError> {
        let users = self.repository.list()?;
        Ok(self.aggregator.assess(&users))
    }

    /// Stateless scoring of a single caller-supplied profile.
    pub fn evaluate(&self, profile: &UserCreditProfile) -> LoanRecommendation {
        self.engine.evaluate(profile)
    }

    /// Stateless assessment of caller-supplied profiles.
    pub fn assess_batch(&self, profiles: &[UserCreditProfile]) -> PortfolioAssessment {
        self.aggregator.assess(profiles)
    }

    /// Build a report; commentary is attached only when the provider answers.
    pub fn report(&self, kind: ReportKind) -> Result<PortfolioReport, PortfolioServiceError> {
        let users = self.repository.list()?;
        let now = Utc::now();
        let assessment = self.aggregator.assess_at(&users, now);

        let mut report = PortfolioReport::build(
            kind,
            &users,
            assessment.metrics.clone(),
            &assessment.recommendations,
            now,
        );

        let request = report_request(
            &self.commentary_config,
            kind,
            ReportPromptData {
                users: &users,
                metrics: &assessment.metrics,
                recommendations: &assessment.recommendations,
            },
        );

        report.commentary = match self.commentary.complete(&request) {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                warn!(report = %kind, "commentary service returned no text");
                None
            }
            Err(CommentaryError::NotConfigured) => {
                debug!(report = %kind, "commentary disabled; returning metrics only");
                None
            }
            Err(error) => {
                warn!(report = %kind, %error, "commentary unavailable for report");
                None
            }
        };

        Ok(report)
    }

    /// Narrative analysis of one stored user; fails when the provider cannot answer.
    pub fn analyze_user(&self, user_id: &str) -> Result<UserAnalysis, PortfolioServiceError> {
        self.user_insight(user_id, InsightKind::Analysis)
    }

    /// Narrative of the requested kind for one stored user, grounded in its recommendation.
    pub fn user_insight(
        &self,
        user_id: &str,
        kind: InsightKind,
    ) -> Result<UserAnalysis, PortfolioServiceError> {
        let profile = self.fetch(user_id)?;
        let recommendation = self.engine.evaluate(&profile);
        let request = insight_request(&self.commentary_config, kind, &profile, &recommendation);

        let analysis = self.narrate(&request)?;
        debug!(user_id = %profile.id, insight = %kind, "user insight written");

        Ok(UserAnalysis {
            user_id: profile.id,
            kind,
            recommendation,
            analysis,
        })
    }

    /// Answers a free-form question about one user, or about the whole portfolio.
    pub fn chat(
        &self,
        question: &str,
        user_id: Option<&str>,
    ) -> Result<String, PortfolioServiceError> {
        if question.trim().is_empty() {
            return Err(PortfolioServiceError::EmptyQuestion);
        }

        let request = match user_id {
            Some(user_id) => {
                let profile = self.fetch(user_id)?;
                let recommendation = self.engine.evaluate(&profile);
                portfolio_chat_request(
                    &self.commentary_config,
                    question,
                    ChatContext::User {
                        profile: &profile,
                        recommendation: &recommendation,
                    },
                )
            }
            None => {
                let users = self.repository.list()?;
                let assessment = self.aggregator.assess(&users);
                portfolio_chat_request(
                    &self.commentary_config,
                    question,
                    ChatContext::Portfolio {
                        metrics: &assessment.metrics,
                        recommendations: &assessment.recommendations,
                    },
                )
            }
        };

        self.narrate(&request)
    }

    /// Trimmed provider answer; blank text is an empty response.
    fn narrate(&self, request: &ChatCompletionRequest) -> Result<String, PortfolioServiceError> {
        let text = self.commentary.complete(request)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(CommentaryError::EmptyResponse.into());
        }
        Ok(text.to_string())
    }

    fn fetch(&self, user_id: &str) -> Result<UserCreditProfile, PortfolioServiceError> {
        self.repository
            .fetch(user_id)?
            .ok_or_else(|| PortfolioServiceError::UserNotFound(user_id.to_string()))
    }
}

/// Error raised by the portfolio service.
#[derive(Debug, thiserror::Error)]
pub enum PortfolioServiceError {
    #[error("requested {requested} profiles; count must be between 1 and {max}")]
    InvalidCount { requested: usize, max: usize },
    #[error("user '{0}' not found")]
    UserNotFound(String),
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Commentary(#[from] CommentaryError),
}
