use std::fmt;

use super::{ChatCompletionRequest, CommentaryConfig};
use crate::portfolio::domain::{
    CreditMetrics, LoanRecommendation, RecommendationDecision, RiskLevel, UserCreditProfile,
};
use crate::portfolio::report::{InsightKind, RecommendationBreakdown, ReportKind, HIGHLIGHT_LIMIT};

const REPORT_MAX_TOKENS: u32 = 4000;
const CHAT_MAX_TOKENS: u32 = 1000;
const RECOMMENDATION_SAMPLE: usize = 20;
const HISTORY_SAMPLE: usize = 6;
const TREND_HISTORY: usize = 12;

/// Borrowed portfolio slice interpolated into report prompts.
#[derive(Debug, Clone, Copy)]
pub struct ReportPromptData<'a> {
    pub users: &'a [UserCreditProfile],
    pub metrics: &'a CreditMetrics,
    pub recommendations: &'a [LoanRecommendation],
}

/// What a free-form question is asked about.
#[derive(Debug, Clone, Copy)]
pub enum ChatContext<'a> {
    User {
        profile: &'a UserCreditProfile,
        recommendation: &'a LoanRecommendation,
    },
    Portfolio {
        metrics: &'a CreditMetrics,
        recommendations: &'a [LoanRecommendation],
    },
}

/// Appends one formatted line.
fn line(prompt: &mut String, args: fmt::Arguments<'_>) {
    prompt.push_str(&fmt::format(args));
    prompt.push('\n');
}

pub fn insight_request(
    config: &CommentaryConfig,
    kind: InsightKind,
    profile: &UserCreditProfile,
    recommendation: &LoanRecommendation,
) -> ChatCompletionRequest {
    match kind {
        InsightKind::Analysis => profile_analysis_request(config, profile, recommendation),
        InsightKind::Advice => financial_advice_request(config, profile, recommendation),
        InsightKind::RiskFactors => {
            risk_explanation_request(config, profile, &recommendation.risk_factors)
        }
        InsightKind::Trend => credit_trend_request(config, profile),
        InsightKind::Anomalies => anomaly_request(config, profile),
    }
}

pub fn profile_analysis_request(
    config: &CommentaryConfig,
    profile: &UserCreditProfile,
    recommendation: &LoanRecommendation,
) -> ChatCompletionRequest {
    let system = "You are a credit risk analyst. Assess individual credit profiles with \
                  specific, data-driven observations and practical next steps.";

    let mut prompt = String::new();
    line(&mut prompt, format_args!("Analyze this credit profile.\n"));
    line(&mut prompt, format_args!("Name: {}", profile.name));
    write_profile(&mut prompt, profile);
    line(&mut prompt, format_args!("Risk level: {}", profile.risk_level.label()));

    let recent = profile
        .credit_history
        .len()
        .saturating_sub(HISTORY_SAMPLE);
    if recent < profile.credit_history.len() {
        line(&mut prompt, format_args!("\nRecent history:"));
        for entry in &profile.credit_history[recent..] {
            line(
                &mut prompt,
                format_args!(
                    "- {}: score {}, payment {}, amount {}",
                    entry.date.format("%Y-%m-%d"),
                    entry.credit_score,
                    entry.payment_status.label(),
                    currency(entry.amount)
                ),
            );
        }
    }

    line(
        &mut prompt,
        format_args!(
            "\nEngine decision: {} (confidence {}%)",
            recommendation.recommendation.label(),
            recommendation.confidence
        ),
    );
    if let Some(amount) = recommendation.recommended_amount {
        line(
            &mut prompt,
            format_args!("Recommended amount: {}", currency(amount as f64)),
        );
    }
    line(
        &mut prompt,
        format_args!("Reasoning: {}", recommendation.reasoning.join(", ")),
    );
    if !recommendation.risk_factors.is_empty() {
        line(
            &mut prompt,
            format_args!("Risk factors: {}", recommendation.risk_factors.join(", ")),
        );
    }
    line(
        &mut prompt,
        format_args!(
            "\nCover overall credit health, strengths and weaknesses, score trend, payment \
             behavior, and debt management."
        ),
    );

    ChatCompletionRequest::new(config, system, prompt)
}

pub fn financial_advice_request(
    config: &CommentaryConfig,
    profile: &UserCreditProfile,
    recommendation: &LoanRecommendation,
) -> ChatCompletionRequest {
    let system = "You are a certified financial advisor giving personalized, actionable advice \
                  that helps borrowers improve their credit and financial health. Recommend \
                  practical, specific steps the borrower can take.";

    let mut prompt = String::new();
    line(
        &mut prompt,
        format_args!("Give personalized financial advice for this borrower.\n"),
    );
    write_profile(&mut prompt, profile);
    write_decision(&mut prompt, recommendation);

    let outlook = match recommendation.recommendation {
        RecommendationDecision::Approve => "how to keep an approved standing",
        RecommendationDecision::Conditional => "what would lift a conditional decision to approval",
        RecommendationDecision::Reject => "what must change before reapplying",
    };
    line(
        &mut prompt,
        format_args!(
            "\nCover immediate actions for the next 30 days, a debt reduction strategy, \
             payment habits, a utilization target, goals for the next 6 to 12 months, and \
             {outlook}."
        ),
    );

    ChatCompletionRequest::new(config, system, prompt)
}

pub fn risk_explanation_request(
    config: &CommentaryConfig,
    profile: &UserCreditProfile,
    risk_factors: &[String],
) -> ChatCompletionRequest {
    let system = "You are a financial educator explaining credit risk factors in plain language \
                  to borrowers without financial training.";

    let mut prompt = String::new();
    line(
        &mut prompt,
        format_args!("Explain the risk factors flagged for this borrower.\n"),
    );
    write_profile(&mut prompt, profile);

    line(&mut prompt, format_args!("\nRisk factors:"));
    if risk_factors.is_empty() {
        line(
            &mut prompt,
            format_args!("- none flagged; explain what keeps this profile low risk"),
        );
    }
    for (index, factor) in risk_factors.iter().enumerate() {
        line(&mut prompt, format_args!("{}. {}", index + 1, factor));
    }
    line(
        &mut prompt,
        format_args!(
            "\nFor each factor explain what it means, why lenders treat it as a concern, how it \
             affects creditworthiness, and how it applies to this borrower."
        ),
    );

    ChatCompletionRequest::new(config, system, prompt)
}

pub fn credit_trend_request(
    config: &CommentaryConfig,
    profile: &UserCreditProfile,
) -> ChatCompletionRequest {
    let system = "You are a financial analyst specializing in credit score forecasting. Base \
                  predictions on the recorded history and current behavior.";

    let mut prompt = String::new();
    line(
        &mut prompt,
        format_args!("Forecast the credit score trend for this borrower.\n"),
    );
    line(
        &mut prompt,
        format_args!("Current credit score: {}", profile.current_credit_score),
    );

    let start = profile.credit_history.len().saturating_sub(TREND_HISTORY);
    let recent = &profile.credit_history[start..];
    line(
        &mut prompt,
        format_args!("\nScore history (most recent {}):", recent.len()),
    );
    if recent.is_empty() {
        line(&mut prompt, format_args!("- no history recorded"));
    }
    for entry in recent {
        line(
            &mut prompt,
            format_args!(
                "- {}: {} ({})",
                entry.date.format("%Y-%m-%d"),
                entry.credit_score,
                entry.payment_status.label()
            ),
        );
    }

    line(&mut prompt, format_args!("\nCurrent behavior:"));
    line(
        &mut prompt,
        format_args!("Debt-to-income: {}", percent(profile.debt_to_income_ratio)),
    );
    line(
        &mut prompt,
        format_args!("Credit utilization: {}%", profile.credit_utilization),
    );
    write_payments(&mut prompt, profile);
    line(
        &mut prompt,
        format_args!(
            "\nGive predicted score ranges at 3, 6, and 12 months, the factors driving them, \
             best and worst cases, your confidence, and the behavior changes that would \
             improve the outlook."
        ),
    );

    ChatCompletionRequest::new(config, system, prompt)
}

pub fn anomaly_request(
    config: &CommentaryConfig,
    profile: &UserCreditProfile,
) -> ChatCompletionRequest {
    let system = "You are a financial anomaly detection specialist reviewing credit activity \
                  for irregular patterns and possible fraud.";

    let mut prompt = String::new();
    line(
        &mut prompt,
        format_args!("Review this borrower's credit activity for anomalies.\n"),
    );
    line(&mut prompt, format_args!("Credit history (date | score | payment | amount):"));
    if profile.credit_history.is_empty() {
        line(&mut prompt, format_args!("- no history recorded"));
    }
    for entry in &profile.credit_history {
        line(
            &mut prompt,
            format_args!(
                "- {} | {} | {} | {}",
                entry.date.format("%Y-%m-%d"),
                entry.credit_score,
                entry.payment_status.label(),
                currency(entry.amount)
            ),
        );
    }

    line(&mut prompt, format_args!("\nCurrent metrics:"));
    write_profile(&mut prompt, profile);
    line(
        &mut prompt,
        format_args!(
            "\nIdentify sudden score changes, irregular payment patterns, unusual amounts, \
             inconsistencies between metrics, and possible fraud signals. Distinguish \
             concerning anomalies from normal fluctuation."
        ),
    );

    ChatCompletionRequest::new(config, system, prompt)
}

/// Free-form question with user or portfolio context; answers are capped at a short length.
pub fn portfolio_chat_request(
    config: &CommentaryConfig,
    question: &str,
    context: ChatContext<'_>,
) -> ChatCompletionRequest {
    let system = "You are a financial assistant specializing in credit analysis and loan \
                  recommendations. Answer questions about credit profiles, scores, debt \
                  management, and financial health. Be concise and accurate, and use the \
                  provided context when it covers the question.";

    let mut prompt = String::new();
    line(&mut prompt, format_args!("{}", question.trim()));

    match context {
        ChatContext::User {
            profile,
            recommendation,
        } => {
            line(&mut prompt, format_args!("\nUser profile context:"));
            line(&mut prompt, format_args!("Name: {}", profile.name));
            write_profile(&mut prompt, profile);
            line(&mut prompt, format_args!("Risk level: {}", profile.risk_level.label()));
            line(&mut prompt, format_args!("Status: {}", profile.status.label()));
            line(
                &mut prompt,
                format_args!("Credit history entries: {}", profile.credit_history.len()),
            );
            write_decision(&mut prompt, recommendation);
            line(
                &mut prompt,
                format_args!("Reasoning: {}", recommendation.reasoning.join("; ")),
            );
        }
        ChatContext::Portfolio {
            metrics,
            recommendations,
        } => {
            line(&mut prompt, format_args!("\nPortfolio context:"));
            write_overview(&mut prompt, metrics);
            write_breakdown(&mut prompt, recommendations);
        }
    }

    let mut request = ChatCompletionRequest::new(config, system, prompt);
    request.max_tokens = request.max_tokens.min(CHAT_MAX_TOKENS);
    request
}

pub fn report_request(
    config: &CommentaryConfig,
    kind: ReportKind,
    data: ReportPromptData<'_>,
) -> ChatCompletionRequest {
    let (system, body) = match kind {
        ReportKind::CreditScore => (
            "You are a senior financial analyst preparing credit score reports for lending \
             institutions.",
            credit_score_body(data),
        ),
        ReportKind::RiskAssessment => (
            "You are a risk management specialist preparing portfolio risk assessments for \
             lending institutions.",
            risk_assessment_body(data),
        ),
        ReportKind::FinancialAction => (
            "You are a lending strategist preparing actionable portfolio decisions for credit \
             institutions.",
            financial_action_body(data),
        ),
    };

    let mut request = ChatCompletionRequest::new(config, system, body);
    request.max_tokens = request.max_tokens.max(REPORT_MAX_TOKENS);
    request
}

fn credit_score_body(data: ReportPromptData<'_>) -> String {
    let mut prompt = String::new();
    line(
        &mut prompt,
        format_args!("Write a {} from this data.\n", ReportKind::CreditScore.title()),
    );
    write_overview(&mut prompt, data.metrics);

    let sample = data.users.len().min(HIGHLIGHT_LIMIT);
    line(&mut prompt, format_args!("\nSample users ({sample}):"));
    for (index, user) in data.users.iter().take(HIGHLIGHT_LIMIT).enumerate() {
        line(
            &mut prompt,
            format_args!(
                "{}. {} | score {} | risk {} | DTI {} | status {}",
                index + 1,
                user.name,
                user.current_credit_score,
                user.risk_level.label(),
                percent(user.debt_to_income_ratio),
                user.status.label()
            ),
        );
    }

    write_breakdown(&mut prompt, data.recommendations);
    line(
        &mut prompt,
        format_args!(
            "\nSections: executive summary, portfolio performance, score distribution, risk \
             categorization, key metrics, recommended actions, mitigation, compliance."
        ),
    );
    prompt
}

fn risk_assessment_body(data: ReportPromptData<'_>) -> String {
    let mut prompt = String::new();
    line(
        &mut prompt,
        format_args!("Write a {} from this data.\n", ReportKind::RiskAssessment.title()),
    );
    write_overview(&mut prompt, data.metrics);

    line(&mut prompt, format_args!("\nHigh-risk users:"));
    for (index, user) in data
        .users
        .iter()
        .filter(|user| user.risk_level == RiskLevel::High)
        .take(HIGHLIGHT_LIMIT)
        .enumerate()
    {
        line(
            &mut prompt,
            format_args!(
                "{}. {} | score {} | DTI {} | payments {}/{}/{} | utilization {}% | debt {}",
                index + 1,
                user.name,
                user.current_credit_score,
                percent(user.debt_to_income_ratio),
                user.payment_history.on_time,
                user.payment_history.late,
                user.payment_history.missed,
                user.credit_utilization,
                currency(user.total_debt)
            ),
        );
    }

    write_breakdown(&mut prompt, data.recommendations);
    line(
        &mut prompt,
        format_args!(
            "\nSections: risk overview, high-risk analysis, root causes, default likelihood, \
             mitigation, monitoring, next steps."
        ),
    );
    prompt
}

fn financial_action_body(data: ReportPromptData<'_>) -> String {
    let mut prompt = String::new();
    line(
        &mut prompt,
        format_args!("Write a {} from this data.\n", ReportKind::FinancialAction.title()),
    );
    write_overview(&mut prompt, data.metrics);

    line(&mut prompt, format_args!("\nRecommendations:"));
    for (index, recommendation) in data
        .recommendations
        .iter()
        .take(RECOMMENDATION_SAMPLE)
        .enumerate()
    {
        line(
            &mut prompt,
            format_args!(
                "{}. {} | {} | amount {} | confidence {}% | risks: {}",
                index + 1,
                recommendation.user_name,
                recommendation.recommendation.label().to_uppercase(),
                amount_or_na(recommendation),
                recommendation.confidence,
                recommendation.risk_factors.join(", ")
            ),
        );
    }

    let tiers = score_tiers(data.users);
    line(
        &mut prompt,
        format_args!(
            "\nScore tiers: excellent (750+) {}, good (700-749) {}, fair (650-699) {}, poor (<650) {}",
            tiers[0], tiers[1], tiers[2], tiers[3]
        ),
    );
    line(
        &mut prompt,
        format_args!(
            "\nSections: key recommendations, portfolio health, approvals, credit limit changes, \
             collections, optimization, implementation roadmap, KPIs."
        ),
    );
    prompt
}

fn write_profile(prompt: &mut String, profile: &UserCreditProfile) {
    line(prompt, format_args!("Credit score: {}", profile.current_credit_score));
    line(
        prompt,
        format_args!("Debt-to-income: {}", percent(profile.debt_to_income_ratio)),
    );
    line(prompt, format_args!("Total debt: {}", currency(profile.total_debt)));
    line(
        prompt,
        format_args!("Monthly income: {}", currency(profile.monthly_income)),
    );
    line(
        prompt,
        format_args!("Credit utilization: {}%", profile.credit_utilization),
    );
    line(prompt, format_args!("Account age: {} months", profile.account_age));
    write_payments(prompt, profile);
}

fn write_payments(prompt: &mut String, profile: &UserCreditProfile) {
    line(
        prompt,
        format_args!(
            "Payments: {} on-time, {} late, {} missed",
            profile.payment_history.on_time,
            profile.payment_history.late,
            profile.payment_history.missed
        ),
    );
}

fn write_decision(prompt: &mut String, recommendation: &LoanRecommendation) {
    line(
        prompt,
        format_args!(
            "\nLoan recommendation: {} (confidence {}%)",
            recommendation.recommendation.label().to_uppercase(),
            recommendation.confidence
        ),
    );
    line(
        prompt,
        format_args!("Recommended amount: {}", amount_or_na(recommendation)),
    );
    let factors = if recommendation.risk_factors.is_empty() {
        "none".to_string()
    } else {
        recommendation.risk_factors.join(", ")
    };
    line(prompt, format_args!("Risk factors: {factors}"));
}

fn write_overview(prompt: &mut String, metrics: &CreditMetrics) {
    line(prompt, format_args!("Total users: {}", metrics.total_users));
    line(
        prompt,
        format_args!("Average credit score: {}", metrics.average_credit_score),
    );
    line(prompt, format_args!("Approval rate: {}%", metrics.approval_rate));
    line(prompt, format_args!("Total debt: {}", currency(metrics.total_debt)));
    line(
        prompt,
        format_args!(
            "Average debt-to-income: {}",
            percent(metrics.average_debt_to_income)
        ),
    );
    line(
        prompt,
        format_args!(
            "Risk distribution: {} low, {} medium, {} high",
            metrics.risk_distribution.low,
            metrics.risk_distribution.medium,
            metrics.risk_distribution.high
        ),
    );
}

fn write_breakdown(prompt: &mut String, recommendations: &[LoanRecommendation]) {
    let breakdown = RecommendationBreakdown::from_recommendations(recommendations);
    line(
        prompt,
        format_args!(
            "\nDecisions: {} approved, {} conditional, {} rejected",
            breakdown.approved, breakdown.conditional, breakdown.rejected
        ),
    );
}

fn score_tiers(users: &[UserCreditProfile]) -> [usize; 4] {
    let mut tiers = [0usize; 4];
    for user in users {
        let slot = match user.current_credit_score {
            score if score >= 750 => 0,
            score if score >= 700 => 1,
            score if score >= 650 => 2,
            _ => 3,
        };
        tiers[slot] += 1;
    }
    tiers
}

fn amount_or_na(recommendation: &LoanRecommendation) -> String {
    recommendation
        .recommended_amount
        .map(|amount| currency(amount as f64))
        .unwrap_or_else(|| "N/A".to_string())
}

fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

fn currency(amount: f64) -> String {
    format!("${amount:.0}")
}
