use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::commentary::{
    ChatCompletionRequest, CommentaryConfig, CommentaryError, CommentaryProvider,
    DisabledCommentary,
};
use crate::config::PortfolioConfig;
use crate::portfolio::domain::{
    AccountStatus, PaymentHistory, RiskLevel, UserCreditProfile,
};
use crate::portfolio::repository::{PortfolioRepository, RepositoryError};
use crate::portfolio::{portfolio_router, PortfolioService};

pub(super) fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 24, 10, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Clean low-risk borrower: excellent score, low DTI, spotless payments.
pub(super) fn strong_profile(id: &str) -> UserCreditProfile {
    UserCreditProfile {
        id: id.to_string(),
        name: format!("Borrower {id}"),
        email: format!("{id}@example.com"),
        current_credit_score: 780,
        credit_history: Vec::new(),
        debt_to_income_ratio: 0.25,
        total_debt: 30_000.0,
        monthly_income: 5_000.0,
        payment_history: PaymentHistory {
            on_time: 95,
            late: 3,
            missed: 0,
        },
        account_age: 72,
        credit_utilization: 20.0,
        risk_level: RiskLevel::Low,
        status: AccountStatus::Active,
        last_updated: fixed_time(),
    }
}

pub(super) fn distressed_profile(id: &str) -> UserCreditProfile {
    UserCreditProfile {
        current_credit_score: 560,
        debt_to_income_ratio: 0.55,
        total_debt: 120_000.0,
        monthly_income: 4_000.0,
        payment_history: PaymentHistory {
            on_time: 40,
            late: 30,
            missed: 10,
        },
        account_age: 36,
        credit_utilization: 85.0,
        risk_level: RiskLevel::High,
        ..strong_profile(id)
    }
}

pub(super) fn borderline_profile(id: &str) -> UserCreditProfile {
    UserCreditProfile {
        current_credit_score: 660,
        debt_to_income_ratio: 0.35,
        total_debt: 60_000.0,
        monthly_income: 6_000.0,
        payment_history: PaymentHistory {
            on_time: 85,
            late: 10,
            missed: 2,
        },
        account_age: 30,
        credit_utilization: 45.0,
        risk_level: RiskLevel::Medium,
        ..strong_profile(id)
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    profiles: Mutex<Vec<UserCreditProfile>>,
}

impl PortfolioRepository for MemoryRepository {
    fn replace_all(&self, profiles: Vec<UserCreditProfile>) -> Result<usize, RepositoryError> {
        let mut guard = self.profiles.lock().expect("repository mutex poisoned");
        *guard = profiles;
        Ok(guard.len())
    }

    fn list(&self) -> Result<Vec<UserCreditProfile>, RepositoryError> {
        Ok(self.profiles.lock().expect("repository mutex poisoned").clone())
    }

    fn fetch(&self, user_id: &str) -> Result<Option<UserCreditProfile>, RepositoryError> {
        let guard = self.profiles.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|profile| profile.id == user_id).cloned())
    }
}

pub(super) struct UnavailableRepository;

impl PortfolioRepository for UnavailableRepository {
    fn replace_all(&self, _profiles: Vec<UserCreditProfile>) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }

    fn list(&self) -> Result<Vec<UserCreditProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }

    fn fetch(&self, _user_id: &str) -> Result<Option<UserCreditProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }
}

/// Answers every request with a canned reply and records what it was asked.
pub(super) struct ScriptedCommentary {
    reply: String,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl ScriptedCommentary {
    pub(super) fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().expect("commentary mutex poisoned").clone()
    }
}

impl CommentaryProvider for ScriptedCommentary {
    fn complete(&self, request: &ChatCompletionRequest) -> Result<String, CommentaryError> {
        self.requests
            .lock()
            .expect("commentary mutex poisoned")
            .push(request.clone());
        Ok(self.reply.clone())
    }
}

pub(super) struct FailingCommentary;

impl CommentaryProvider for FailingCommentary {
    fn complete(&self, _request: &ChatCompletionRequest) -> Result<String, CommentaryError> {
        Err(CommentaryError::Transport("connection reset".to_string()))
    }
}

pub(super) fn portfolio_config() -> PortfolioConfig {
    PortfolioConfig {
        seed: Some(2024),
        default_count: 20,
    }
}

pub(super) fn service_with<C: CommentaryProvider + 'static>(
    commentary: Arc<C>,
) -> (Arc<PortfolioService<MemoryRepository, C>>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = PortfolioService::new(
        repository.clone(),
        commentary,
        portfolio_config(),
        CommentaryConfig::default(),
    );
    (Arc::new(service), repository)
}

pub(super) fn build_service() -> (
    Arc<PortfolioService<MemoryRepository, DisabledCommentary>>,
    Arc<MemoryRepository>,
) {
    service_with(Arc::new(DisabledCommentary))
}

pub(super) fn router_for<C: CommentaryProvider + 'static>(
    service: Arc<PortfolioService<MemoryRepository, C>>,
) -> axum::Router {
    portfolio_router(service)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
