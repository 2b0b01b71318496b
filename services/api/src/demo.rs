use crate::infra::InMemoryPortfolioRepository;
use chrono::Utc;
use clap::Args;
use credit_insight::commentary::{CommentaryConfig, DisabledCommentary};
use credit_insight::config::PortfolioConfig;
use credit_insight::error::AppError;
use credit_insight::portfolio::{
    CreditMetrics, LoanRecommendation, PortfolioAssessment, PortfolioService, ProfileImporter,
    RecommendationBreakdown, ReportKind,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

type DemoService = PortfolioService<InMemoryPortfolioRepository, DisabledCommentary>;

const LISTED_RECOMMENDATIONS: usize = 10;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Number of synthetic profiles to generate
    #[arg(long)]
    pub(crate) count: Option<usize>,
    /// Seed for reproducible portfolios
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct PortfolioReportArgs {
    /// Number of synthetic profiles to generate (ignored with --csv)
    #[arg(long)]
    pub(crate) count: Option<usize>,
    /// Seed for reproducible portfolios
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Score a CSV export instead of a synthetic portfolio
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Print the full assessment as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_portfolio_report(args: PortfolioReportArgs) -> Result<(), AppError> {
    let PortfolioReportArgs {
        count,
        seed,
        csv,
        json,
    } = args;

    let service = demo_service(seed);
    let source = match csv {
        Some(path) => {
            let profiles = ProfileImporter::from_path(&path, Utc::now())?;
            service.load(profiles)?;
            format!("imported from {}", path.display())
        }
        None => {
            let users = service.generate(count)?;
            format!("{} synthetic profiles", users.len())
        }
    };

    let assessment = service.assess()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
        return Ok(());
    }

    println!("Portfolio report ({source})");
    render_assessment(&assessment);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { count, seed } = args;
    let service = demo_service(seed);

    println!("Credit insight demo");
    let users = service.generate(count)?;
    println!("- Generated {} synthetic profiles", users.len());

    let assessment = service.assess()?;
    render_assessment(&assessment);

    println!("\nReports (commentary disabled; deterministic sections only)");
    for kind in ReportKind::ordered() {
        let report = service.report(kind)?;
        println!(
            "- {} [{}]: {} highlighted users, {} decisions",
            report.title,
            kind,
            report.highlighted_users.len(),
            report.breakdown.total()
        );
    }

    if let Some(user) = users.first() {
        let detail = service.user_detail(&user.id)?;
        println!("\nUser detail for {} ({})", detail.profile.name, detail.profile.id);
        render_recommendation(&detail.recommendation);
    }

    println!("\nSanitizing loosely typed generator output");
    let raw = vec![
        json!({
            "name": "Walk-in Applicant",
            "currentCreditScore": "912",
            "monthlyIncome": 1800,
            "paymentHistory": { "onTime": 48, "late": 1 },
            "riskLevel": "LOW"
        }),
        json!({ "id": "ext-2", "debtToIncomeRatio": 1.4, "riskLevel": "unknown" }),
    ];
    let intake = demo_service(seed);
    let accepted = intake.load_lenient(&raw)?;
    println!("- accepted {accepted} of {} entries", raw.len());
    for profile in intake.users()? {
        let recommendation = intake.evaluate(&profile);
        println!(
            "- {} -> score {}, DTI {:.2}, income {:.0}, risk {}",
            profile.id,
            profile.current_credit_score,
            profile.debt_to_income_ratio,
            profile.monthly_income,
            profile.risk_level.label()
        );
        render_recommendation(&recommendation);
    }

    Ok(())
}

fn demo_service(seed: Option<u64>) -> DemoService {
    PortfolioService::new(
        Arc::new(InMemoryPortfolioRepository::default()),
        Arc::new(DisabledCommentary),
        PortfolioConfig {
            seed,
            ..PortfolioConfig::default()
        },
        CommentaryConfig::default(),
    )
}

fn render_assessment(assessment: &PortfolioAssessment) {
    render_metrics(&assessment.metrics);

    let breakdown = RecommendationBreakdown::from_recommendations(&assessment.recommendations);
    println!(
        "Decisions: {} approved | {} conditional | {} rejected",
        breakdown.approved, breakdown.conditional, breakdown.rejected
    );

    println!("Recommendations:");
    for recommendation in assessment
        .recommendations
        .iter()
        .take(LISTED_RECOMMENDATIONS)
    {
        render_recommendation(recommendation);
    }
    let remaining = assessment
        .recommendations
        .len()
        .saturating_sub(LISTED_RECOMMENDATIONS);
    if remaining > 0 {
        println!("  ... {remaining} more (use --json for the full list)");
    }
}

fn render_metrics(metrics: &CreditMetrics) {
    println!(
        "- {} users | avg score {} | approval rate {}%",
        metrics.total_users, metrics.average_credit_score, metrics.approval_rate
    );
    println!(
        "- total debt ${:.0} | avg DTI {:.2}",
        metrics.total_debt, metrics.average_debt_to_income
    );
    println!(
        "- risk mix: {} low / {} medium / {} high",
        metrics.risk_distribution.low,
        metrics.risk_distribution.medium,
        metrics.risk_distribution.high
    );
}

fn render_recommendation(recommendation: &LoanRecommendation) {
    let amount = recommendation
        .recommended_amount
        .map(|amount| format!("${amount}"))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "  - {} ({}): {} | amount {} | confidence {}%",
        recommendation.user_name,
        recommendation.user_id,
        recommendation.recommendation.label(),
        amount,
        recommendation.confidence
    );
    if !recommendation.risk_factors.is_empty() {
        println!("    risks: {}", recommendation.risk_factors.join(", "));
    }
}
