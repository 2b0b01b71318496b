//! Normalization of loosely typed profiles returned by an external generator.
//!
//! Input is already-parsed JSON. Missing, zero, or non-numeric values fall back to defaults and
//! every numeric field is clamped into the range the dashboard expects.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::domain::{AccountStatus, CreditHistoryEntry, PaymentHistory, RiskLevel, UserCreditProfile};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProfile {
    pub id: Option<Value>,
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub current_credit_score: Option<Value>,
    pub credit_history: Option<Value>,
    pub debt_to_income_ratio: Option<Value>,
    pub total_debt: Option<Value>,
    pub monthly_income: Option<Value>,
    pub payment_history: Option<RawPaymentHistory>,
    pub account_age: Option<Value>,
    pub credit_utilization: Option<Value>,
    pub risk_level: Option<Value>,
    pub status: Option<Value>,
    pub last_updated: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPaymentHistory {
    pub on_time: Option<Value>,
    pub late: Option<Value>,
    pub missed: Option<Value>,
}

impl RawPaymentHistory {
    fn sanitize(&self) -> PaymentHistory {
        PaymentHistory {
            on_time: count(self.on_time.as_ref()),
            late: count(self.late.as_ref()),
            missed: count(self.missed.as_ref()),
        }
    }
}

impl RawProfile {
    pub fn sanitize(&self, index: usize, now: DateTime<Utc>) -> UserCreditProfile {
        let ordinal = index + 1;

        let current_credit_score =
            numeric_or(self.current_credit_score.as_ref(), 650.0).clamp(300.0, 850.0);
        let account_age = numeric_or(self.account_age.as_ref(), 24.0).clamp(6.0, 120.0);

        UserCreditProfile {
            id: text(self.id.as_ref()).unwrap_or_else(|| format!("user-{ordinal}")),
            name: text(self.name.as_ref()).unwrap_or_else(|| format!("User {ordinal}")),
            email: text(self.email.as_ref())
                .unwrap_or_else(|| format!("user{ordinal}@example.com")),
            current_credit_score: current_credit_score.round() as i32,
            credit_history: history(self.credit_history.as_ref()),
            debt_to_income_ratio: numeric_or(self.debt_to_income_ratio.as_ref(), 0.3)
                .clamp(0.1, 0.8),
            total_debt: numeric_or(self.total_debt.as_ref(), 50_000.0).clamp(10_000.0, 200_000.0),
            monthly_income: numeric_or(self.monthly_income.as_ref(), 5_000.0)
                .clamp(3_000.0, 15_000.0),
            payment_history: self
                .payment_history
                .as_ref()
                .map(RawPaymentHistory::sanitize)
                .unwrap_or_default(),
            account_age: account_age.round() as i32,
            credit_utilization: numeric_or(self.credit_utilization.as_ref(), 30.0)
                .clamp(10.0, 90.0),
            risk_level: text(self.risk_level.as_ref())
                .and_then(|raw| raw.parse::<RiskLevel>().ok())
                .unwrap_or(RiskLevel::Medium),
            status: text(self.status.as_ref())
                .and_then(|raw| raw.parse::<AccountStatus>().ok())
                .unwrap_or_default(),
            last_updated: text(self.last_updated.as_ref())
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|parsed| parsed.with_timezone(&Utc))
                .unwrap_or(now),
        }
    }
}

/// Sanitizes up to `limit` entries; entries that are not JSON objects are skipped.
pub fn sanitize_batch(values: &[Value], limit: usize, now: DateTime<Utc>) -> Vec<UserCreditProfile> {
    values
        .iter()
        .take(limit)
        .enumerate()
        .filter_map(|(index, value)| match RawProfile::deserialize(value) {
            Ok(raw) => Some(raw.sanitize(index, now)),
            Err(error) => {
                warn!(index, %error, "skipping malformed generated profile");
                None
            }
        })
        .collect()
}

/// Lenient numeric read; zero and unparseable values count as missing.
fn numeric(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    if parsed.is_finite() && parsed != 0.0 {
        Some(parsed)
    } else {
        None
    }
}

fn numeric_or(value: Option<&Value>, fallback: f64) -> f64 {
    numeric(value).unwrap_or(fallback)
}

fn count(value: Option<&Value>) -> u32 {
    numeric(value)
        .map(|parsed| parsed.round().clamp(0.0, f64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(raw) if !raw.trim().is_empty() => Some(raw.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn history(value: Option<&Value>) -> Vec<CreditHistoryEntry> {
    match value {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| CreditHistoryEntry::deserialize(entry).ok())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 8, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn empty_object_receives_every_default() {
        let profile = RawProfile::default().sanitize(2, now());

        assert_eq!(profile.id, "user-3");
        assert_eq!(profile.name, "User 3");
        assert_eq!(profile.email, "user3@example.com");
        assert_eq!(profile.current_credit_score, 650);
        assert_eq!(profile.debt_to_income_ratio, 0.3);
        assert_eq!(profile.total_debt, 50_000.0);
        assert_eq!(profile.monthly_income, 5_000.0);
        assert_eq!(profile.payment_history, PaymentHistory::default());
        assert_eq!(profile.account_age, 24);
        assert_eq!(profile.credit_utilization, 30.0);
        assert_eq!(profile.risk_level, RiskLevel::Medium);
        assert_eq!(profile.status, AccountStatus::Active);
        assert_eq!(profile.last_updated, now());
        assert!(profile.credit_history.is_empty());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let raw: RawProfile = serde_json::from_value(json!({
            "id": "u-1",
            "currentCreditScore": 910,
            "debtToIncomeRatio": 1.4,
            "totalDebt": 2500,
            "monthlyIncome": "40000",
            "accountAge": 2,
            "creditUtilization": 97.5,
            "riskLevel": "HIGH",
            "status": "archived",
            "paymentHistory": { "onTime": "31", "late": -2, "missed": 3.6 }
        }))
        .expect("raw profile parses");

        let profile = raw.sanitize(0, now());
        assert_eq!(profile.id, "u-1");
        assert_eq!(profile.current_credit_score, 850);
        assert_eq!(profile.debt_to_income_ratio, 0.8);
        assert_eq!(profile.total_debt, 10_000.0);
        assert_eq!(profile.monthly_income, 15_000.0);
        assert_eq!(profile.account_age, 6);
        assert_eq!(profile.credit_utilization, 90.0);
        assert_eq!(profile.risk_level, RiskLevel::High);
        assert_eq!(profile.status, AccountStatus::Active);
        assert_eq!(
            profile.payment_history,
            PaymentHistory {
                on_time: 31,
                late: 0,
                missed: 4
            }
        );
    }

    #[test]
    fn zero_counts_as_missing() {
        let raw: RawProfile = serde_json::from_value(json!({
            "currentCreditScore": 0,
            "monthlyIncome": "not a number"
        }))
        .expect("raw profile parses");

        let profile = raw.sanitize(0, now());
        assert_eq!(profile.current_credit_score, 650);
        assert_eq!(profile.monthly_income, 5_000.0);
    }

    #[test]
    fn batch_truncates_and_skips_non_objects() {
        let values = vec![
            json!({ "name": "Lisa Adams" }),
            json!("not a profile"),
            json!({ "name": "Mark Baker" }),
            json!({ "name": "Paul Nelson" }),
        ];

        let profiles = sanitize_batch(&values, 3, now());
        let names: Vec<&str> = profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Lisa Adams", "Mark Baker"]);
        assert_eq!(profiles[1].id, "user-3");
    }
}
