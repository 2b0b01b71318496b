use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{AccountStatus, PaymentHistory, RiskLevel, UserCreditProfile};

#[derive(Debug, thiserror::Error)]
pub enum ProfileImportError {
    #[error("failed to read portfolio export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid portfolio CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unrecognized risk level '{value}'")]
    InvalidRiskLevel { row: usize, value: String },
    #[error("row {row}: unrecognized account status '{value}'")]
    InvalidStatus { row: usize, value: String },
}

/// Loads flat CSV exports (one profile per row) into credit profiles.
pub struct ProfileImporter;

impl ProfileImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserCreditProfile>, ProfileImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, now)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserCreditProfile>, ProfileImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut profiles = Vec::new();

        for (index, record) in csv_reader.deserialize::<ProfileRow>().enumerate() {
            let row = record?;
            profiles.push(row.into_profile(index + 1, now)?);
        }

        Ok(profiles)
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: String,
    name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    credit_score: i32,
    debt_to_income: f64,
    total_debt: f64,
    monthly_income: f64,
    on_time: u32,
    late: u32,
    missed: u32,
    account_age: i32,
    credit_utilization: f64,
    risk_level: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
}

impl ProfileRow {
    fn into_profile(
        self,
        row: usize,
        now: DateTime<Utc>,
    ) -> Result<UserCreditProfile, ProfileImportError> {
        let risk_level = self.risk_level.parse::<RiskLevel>().map_err(|_| {
            ProfileImportError::InvalidRiskLevel {
                row,
                value: self.risk_level.clone(),
            }
        })?;

        let status = match self.status {
            Some(raw) => raw
                .parse::<AccountStatus>()
                .map_err(|_| ProfileImportError::InvalidStatus { row, value: raw })?,
            None => AccountStatus::Active,
        };

        Ok(UserCreditProfile {
            email: self.email.unwrap_or_default(),
            id: self.id,
            name: self.name,
            current_credit_score: self.credit_score,
            credit_history: Vec::new(),
            debt_to_income_ratio: self.debt_to_income,
            total_debt: self.total_debt,
            monthly_income: self.monthly_income,
            payment_history: PaymentHistory {
                on_time: self.on_time,
                late: self.late,
                missed: self.missed,
            },
            account_age: self.account_age,
            credit_utilization: self.credit_utilization,
            risk_level,
            status,
            last_updated: now,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
