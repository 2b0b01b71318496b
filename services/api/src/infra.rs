use credit_insight::commentary::{
    ChatCompletionRequest, CommentaryConfig, CommentaryError, CommentaryProvider,
    DisabledCommentary, HttpCommentary,
};
use credit_insight::portfolio::{PortfolioRepository, RepositoryError, UserCreditProfile};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local portfolio store; contents are lost on restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPortfolioRepository {
    profiles: Arc<Mutex<Vec<UserCreditProfile>>>,
}

impl InMemoryPortfolioRepository {
    fn guard(&self) -> Result<MutexGuard<'_, Vec<UserCreditProfile>>, RepositoryError> {
        self.profiles
            .lock()
            .map_err(|_| RepositoryError::Unavailable("portfolio store poisoned".to_string()))
    }
}

impl PortfolioRepository for InMemoryPortfolioRepository {
    fn replace_all(&self, profiles: Vec<UserCreditProfile>) -> Result<usize, RepositoryError> {
        let mut guard = self.guard()?;
        *guard = profiles;
        Ok(guard.len())
    }

    fn list(&self) -> Result<Vec<UserCreditProfile>, RepositoryError> {
        Ok(self.guard()?.clone())
    }

    fn fetch(&self, user_id: &str) -> Result<Option<UserCreditProfile>, RepositoryError> {
        let guard = self.guard()?;
        Ok(guard.iter().find(|profile| profile.id == user_id).cloned())
    }
}

/// Commentary transport chosen from configuration at startup.
#[derive(Debug)]
pub(crate) enum CommentaryBackend {
    Http(HttpCommentary),
    Disabled(DisabledCommentary),
}

impl CommentaryBackend {
    pub(crate) fn from_config(
        config: &CommentaryConfig,
        runtime: Handle,
    ) -> Result<Self, CommentaryError> {
        if !config.is_configured() {
            return Ok(Self::Disabled(DisabledCommentary));
        }
        HttpCommentary::from_config(config, runtime).map(Self::Http)
    }
}

impl CommentaryProvider for CommentaryBackend {
    fn complete(&self, request: &ChatCompletionRequest) -> Result<String, CommentaryError> {
        match self {
            Self::Http(client) => client.complete(request),
            Self::Disabled(disabled) => disabled.complete(request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use credit_insight::portfolio::SyntheticPortfolioGenerator;

    #[tokio::test]
    async fn backend_follows_commentary_configuration() {
        let disabled = CommentaryBackend::from_config(&CommentaryConfig::default(), Handle::current())
            .expect("disabled backend");
        assert!(matches!(disabled, CommentaryBackend::Disabled(_)));
        let request = ChatCompletionRequest::new(&CommentaryConfig::default(), "system", "hi".into());
        assert!(matches!(
            disabled.complete(&request),
            Err(CommentaryError::NotConfigured)
        ));

        let configured = CommentaryConfig {
            endpoint: Some("http://127.0.0.1:9/chat".to_string()),
            api_key: Some("key".to_string()),
            ..CommentaryConfig::default()
        };
        match CommentaryBackend::from_config(&configured, Handle::current()) {
            Ok(CommentaryBackend::Http(client)) => {
                assert_eq!(client.endpoint(), "http://127.0.0.1:9/chat")
            }
            other => panic!("expected http backend, got {other:?}"),
        }
    }

    #[test]
    fn replace_all_swaps_contents_and_preserves_order() {
        let repository = InMemoryPortfolioRepository::default();
        let mut generator = SyntheticPortfolioGenerator::new(Some(3));

        repository
            .replace_all(generator.generate(5, Utc::now()))
            .expect("first load");
        let stored = repository
            .replace_all(generator.generate(2, Utc::now()))
            .expect("second load");

        assert_eq!(stored, 2);
        let ids: Vec<String> = repository
            .list()
            .expect("list")
            .into_iter()
            .map(|profile| profile.id)
            .collect();
        assert_eq!(ids, vec!["user-1", "user-2"]);
        assert!(repository.fetch("user-2").expect("fetch").is_some());
        assert!(repository.fetch("user-5").expect("fetch").is_none());
    }
}
