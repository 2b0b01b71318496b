use std::sync::Arc;

use serde_json::json;

use super::common::*;
use crate::commentary::{CommentaryConfig, CommentaryError, DisabledCommentary};
use crate::portfolio::domain::RecommendationDecision;
use crate::portfolio::report::{InsightKind, ReportKind};
use crate::portfolio::repository::{PortfolioRepository, RepositoryError};
use crate::portfolio::service::{PortfolioService, PortfolioServiceError, MAX_GENERATED_PROFILES};

#[test]
fn generate_uses_configured_default_count_and_stores_profiles() {
    let (service, repository) = build_service();

    let users = service.generate(None).expect("generate portfolio");

    assert_eq!(users.len(), 20);
    assert_eq!(repository.list().expect("list").len(), 20);
    assert_eq!(users[0].id, "user-1");
    assert_eq!(users[19].id, "user-20");
}

#[test]
fn generate_replaces_the_previous_portfolio() {
    let (service, repository) = build_service();
    service.generate(Some(12)).expect("first batch");

    service.generate(Some(3)).expect("second batch");

    assert_eq!(repository.list().expect("list").len(), 3);
}

#[test]
fn generate_rejects_zero_and_oversized_counts() {
    let (service, repository) = build_service();

    for requested in [0, MAX_GENERATED_PROFILES + 1] {
        let error = service.generate(Some(requested)).expect_err("invalid count");
        match error {
            PortfolioServiceError::InvalidCount { requested: got, max } => {
                assert_eq!(got, requested);
                assert_eq!(max, MAX_GENERATED_PROFILES);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    assert!(repository.list().expect("list").is_empty());
}

#[test]
fn load_rejects_duplicate_ids_without_touching_storage() {
    let (service, repository) = build_service();
    service
        .load(vec![strong_profile("keep")])
        .expect("initial load");

    let error = service
        .load(vec![strong_profile("a"), borderline_profile("a")])
        .expect_err("duplicate ids");

    assert!(matches!(
        error,
        PortfolioServiceError::Repository(RepositoryError::DuplicateUser(ref id)) if id == "a"
    ));
    let stored = repository.list().expect("list");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, "keep");
}

#[test]
fn user_detail_scores_the_stored_profile() {
    let (service, _) = build_service();
    service
        .load(vec![strong_profile("u-1"), distressed_profile("u-2")])
        .expect("load");

    let detail = service.user_detail("u-2").expect("detail");

    assert_eq!(detail.profile.id, "u-2");
    assert_eq!(detail.recommendation.recommendation, RecommendationDecision::Reject);
    assert_eq!(detail.recommendation.confidence, -35);
}

#[test]
fn unknown_user_is_reported_as_not_found() {
    let (service, _) = build_service();
    service.load(vec![strong_profile("u-1")]).expect("load");

    let error = service.user_detail("ghost").expect_err("missing user");

    assert!(matches!(error, PortfolioServiceError::UserNotFound(ref id) if id == "ghost"));
    assert_eq!(error.to_string(), "user 'ghost' not found");
}

#[test]
fn recommendations_can_be_filtered_by_decision() {
    let (service, _) = build_service();
    service
        .load(vec![
            strong_profile("u-1"),
            distressed_profile("u-2"),
            borderline_profile("u-3"),
        ])
        .expect("load");

    let all = service.recommendations(None).expect("all");
    let conditional = service
        .recommendations(Some(RecommendationDecision::Conditional))
        .expect("conditional");

    assert_eq!(all.len(), 3);
    assert_eq!(conditional.len(), 1);
    assert_eq!(conditional[0].user_id, "u-3");
}

#[test]
fn metrics_reflect_the_stored_portfolio() {
    let (service, _) = build_service();
    service
        .load(vec![strong_profile("u-1"), distressed_profile("u-2")])
        .expect("load");

    let metrics = service.metrics().expect("metrics");

    assert_eq!(metrics.total_users, 2);
    assert_eq!(metrics.average_credit_score, 670);
    assert_eq!(metrics.approval_rate, 50);
}

#[test]
fn stateless_helpers_ignore_the_repository() {
    let (service, repository) = build_service();

    let single = service.evaluate(&strong_profile("walk-in"));
    let batch = service.assess_batch(&[strong_profile("a"), distressed_profile("b")]);

    assert_eq!(single.recommended_amount, Some(2500));
    assert_eq!(batch.metrics.total_users, 2);
    assert_eq!(batch.recommendations.len(), 2);
    assert!(repository.list().expect("list").is_empty());
}

#[test]
fn report_attaches_commentary_and_uses_report_token_floor() {
    let commentary = Arc::new(ScriptedCommentary::new("  Portfolio is healthy.  "));
    let (service, _) = service_with(commentary.clone());
    service
        .load(vec![strong_profile("u-1"), borderline_profile("u-2")])
        .expect("load");

    let report = service.report(ReportKind::CreditScore).expect("report");

    assert_eq!(report.kind, ReportKind::CreditScore);
    assert_eq!(report.commentary.as_deref(), Some("Portfolio is healthy."));
    assert_eq!(report.breakdown.total(), 2);
    assert_eq!(report.highlighted_users.len(), 2);

    let requests = commentary.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].max_tokens, 4000);
    assert!(requests[0]
        .user_prompt()
        .is_some_and(|prompt| prompt.contains("Borrower u-2")));
}

#[test]
fn report_without_commentary_still_returns_metrics() {
    let (service, _) = build_service();
    service.load(vec![strong_profile("u-1")]).expect("load");

    let report = service.report(ReportKind::CreditScore).expect("report");

    assert!(report.commentary.is_none());
    assert_eq!(report.metrics.total_users, 1);
    assert_eq!(report.breakdown.approved, 1);
}

#[test]
fn report_survives_failing_commentary_provider() {
    let (service, _) = service_with(Arc::new(FailingCommentary));
    service.load(vec![distressed_profile("u-1")]).expect("load");

    let report = service.report(ReportKind::FinancialAction).expect("report");

    assert!(report.commentary.is_none());
    assert_eq!(report.breakdown.rejected, 1);
}

#[test]
fn user_analysis_returns_trimmed_commentary() {
    let commentary = Arc::new(ScriptedCommentary::new("\nSolid borrower.\n"));
    let (service, _) = service_with(commentary.clone());
    service.load(vec![strong_profile("u-1")]).expect("load");

    let analysis = service.analyze_user("u-1").expect("analysis");

    assert_eq!(analysis.user_id, "u-1");
    assert_eq!(analysis.analysis, "Solid borrower.");
    assert_eq!(analysis.recommendation.recommended_amount, Some(2500));
    assert!(commentary.requests()[0]
        .user_prompt()
        .is_some_and(|prompt| prompt.contains("Credit score: 780")));
}

#[test]
fn user_analysis_surfaces_provider_failures() {
    let (disabled, _) = build_service();
    disabled.load(vec![strong_profile("u-1")]).expect("load");
    assert!(matches!(
        disabled.analyze_user("u-1"),
        Err(PortfolioServiceError::Commentary(CommentaryError::NotConfigured))
    ));

    let (blank, _) = service_with(Arc::new(ScriptedCommentary::new("   ")));
    blank.load(vec![strong_profile("u-1")]).expect("load");
    assert!(matches!(
        blank.analyze_user("u-1"),
        Err(PortfolioServiceError::Commentary(CommentaryError::EmptyResponse))
    ));

    assert!(matches!(
        blank.analyze_user("ghost"),
        Err(PortfolioServiceError::UserNotFound(_))
    ));
}

#[test]
fn repository_outages_propagate() {
    let service = PortfolioService::new(
        Arc::new(UnavailableRepository),
        Arc::new(DisabledCommentary),
        portfolio_config(),
        CommentaryConfig::default(),
    );

    assert!(matches!(
        service.metrics(),
        Err(PortfolioServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
    assert!(matches!(
        service.generate(Some(5)),
        Err(PortfolioServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
}

#[test]
fn user_insights_use_kind_specific_prompts() {
    let commentary = Arc::new(ScriptedCommentary::new(" Pay down the cards first. "));
    let (service, _) = service_with(commentary.clone());
    service.load(vec![distressed_profile("u-1")]).expect("load");

    let explanation = service
        .user_insight("u-1", InsightKind::RiskFactors)
        .expect("risk explanation");
    let advice = service
        .user_insight("u-1", InsightKind::Advice)
        .expect("advice");

    assert_eq!(explanation.kind, InsightKind::RiskFactors);
    assert_eq!(advice.kind, InsightKind::Advice);
    assert_eq!(advice.analysis, "Pay down the cards first.");
    assert_eq!(advice.recommendation.recommendation, RecommendationDecision::Reject);

    let requests = commentary.requests();
    assert!(requests[0]
        .user_prompt()
        .is_some_and(|prompt| prompt.contains("1. Very low credit score")));
    assert!(requests[1]
        .user_prompt()
        .is_some_and(|prompt| prompt.contains("what must change before reapplying")));
}

#[test]
fn trend_and_anomaly_insights_fail_without_provider() {
    let (service, _) = build_service();
    service.load(vec![strong_profile("u-1")]).expect("load");

    for kind in [InsightKind::Trend, InsightKind::Anomalies] {
        assert!(matches!(
            service.user_insight("u-1", kind),
            Err(PortfolioServiceError::Commentary(CommentaryError::NotConfigured))
        ));
    }
}

#[test]
fn chat_answers_with_user_or_portfolio_context() {
    let commentary = Arc::new(ScriptedCommentary::new("It depends on utilization."));
    let (service, _) = service_with(commentary.clone());
    service
        .load(vec![strong_profile("u-1"), distressed_profile("u-2")])
        .expect("load");

    let answer = service
        .chat("Why was u-2 rejected?", Some("u-2"))
        .expect("user answer");
    assert_eq!(answer, "It depends on utilization.");
    service
        .chat("How is the book doing?", None)
        .expect("portfolio answer");

    let requests = commentary.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].max_tokens, 1000);
    assert!(requests[0]
        .user_prompt()
        .is_some_and(|prompt| prompt.contains("Name: Borrower u-2")));
    assert!(requests[1]
        .user_prompt()
        .is_some_and(|prompt| prompt.contains("Total users: 2")));
}

#[test]
fn chat_rejects_blank_questions_and_unknown_users() {
    let commentary = Arc::new(ScriptedCommentary::new("unused"));
    let (service, _) = service_with(commentary.clone());

    assert!(matches!(
        service.chat("   ", None),
        Err(PortfolioServiceError::EmptyQuestion)
    ));
    assert!(matches!(
        service.chat("Who is this?", Some("ghost")),
        Err(PortfolioServiceError::UserNotFound(_))
    ));
    assert!(commentary.requests().is_empty());
}

#[test]
fn lenient_load_normalizes_and_skips_malformed_entries() {
    let (service, repository) = build_service();
    let entries = vec![
        json!({ "id": "walk-in", "currentCreditScore": "912", "riskLevel": "LOW" }),
        json!("not a profile"),
        json!({ "name": "No Id" }),
    ];

    let stored = service.load_lenient(&entries).expect("lenient load");

    assert_eq!(stored, 2);
    let profiles = repository.list().expect("list");
    assert_eq!(profiles[0].id, "walk-in");
    assert_eq!(profiles[0].current_credit_score, 850);
    assert_eq!(profiles[1].id, "user-3");
    assert_eq!(profiles[1].name, "No Id");
}

#[test]
fn lenient_load_still_rejects_duplicate_ids() {
    let (service, repository) = build_service();
    let entries = vec![json!({ "id": "dup" }), json!({ "id": "dup" })];

    assert!(matches!(
        service.load_lenient(&entries),
        Err(PortfolioServiceError::Repository(RepositoryError::DuplicateUser(id))) if id == "dup"
    ));
    assert!(repository.list().expect("list").is_empty());
}
