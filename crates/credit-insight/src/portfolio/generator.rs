use chrono::{DateTime, Months, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::domain::{
    AccountStatus, CreditHistoryEntry, PaymentHistory, PaymentStatus, RiskLevel,
    UserCreditProfile,
};

const ROSTER: [&str; 50] = [
    "John Smith",
    "Sarah Johnson",
    "Michael Brown",
    "Emily Davis",
    "David Wilson",
    "Jessica Martinez",
    "Christopher Anderson",
    "Amanda Taylor",
    "Matthew Thomas",
    "Ashley Jackson",
    "James White",
    "Lauren Harris",
    "Robert Martin",
    "Megan Thompson",
    "Daniel Garcia",
    "Nicole Rodriguez",
    "William Lewis",
    "Stephanie Walker",
    "Joseph Hall",
    "Rachel Young",
    "Charles Allen",
    "Michelle King",
    "Thomas Wright",
    "Kimberly Lopez",
    "Christopher Hill",
    "Jennifer Scott",
    "Daniel Green",
    "Lisa Adams",
    "Mark Baker",
    "Angela Gonzalez",
    "Paul Nelson",
    "Samantha Carter",
    "Steven Mitchell",
    "Brittany Perez",
    "Kevin Roberts",
    "Amanda Turner",
    "Brian Phillips",
    "Melissa Campbell",
    "Jason Parker",
    "Heather Evans",
    "Ryan Edwards",
    "Tiffany Collins",
    "Justin Stewart",
    "Rebecca Sanchez",
    "Brandon Morris",
    "Crystal Rogers",
    "Eric Reed",
    "Danielle Cook",
    "Kyle Morgan",
    "Amber Bell",
];

// Weighted 3:1:1 by repetition.
const STATUS_POOL: [AccountStatus; 5] = [
    AccountStatus::Active,
    AccountStatus::Active,
    AccountStatus::Active,
    AccountStatus::Inactive,
    AccountStatus::Flagged,
];

const PAYMENT_POOL: [PaymentStatus; 5] = [
    PaymentStatus::OnTime,
    PaymentStatus::OnTime,
    PaymentStatus::OnTime,
    PaymentStatus::Late,
    PaymentStatus::Missed,
];

/// Local pseudorandom portfolio source used when no external generator is available.
pub struct SyntheticPortfolioGenerator {
    rng: StdRng,
}

impl SyntheticPortfolioGenerator {
    /// A fixed seed yields the same portfolio for the same `now`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn generate(&mut self, count: usize, now: DateTime<Utc>) -> Vec<UserCreditProfile> {
        (0..count).map(|index| self.profile(index, now)).collect()
    }

    fn profile(&mut self, index: usize, now: DateTime<Utc>) -> UserCreditProfile {
        let ordinal = index + 1;
        let credit_score: i32 = self.rng.gen_range(300..850);
        let monthly_income = f64::from(self.rng.gen_range(3_000u32..15_000));
        let total_debt = f64::from(self.rng.gen_range(10_000u32..200_000));
        let debt_to_income = total_debt / (monthly_income * 12.0);
        let account_age: i32 = self.rng.gen_range(6..120);
        let credit_utilization = f64::from(self.rng.gen_range(10u32..90));

        let payment_history = PaymentHistory {
            on_time: self.rng.gen_range(10..100),
            late: self.rng.gen_range(0..20),
            missed: self.rng.gen_range(0..10),
        };

        let risk_level = derive_risk_level(credit_score, debt_to_income, &payment_history);
        let status = STATUS_POOL[self.rng.gen_range(0..STATUS_POOL.len())];
        let credit_history = self.history(credit_score, now);

        UserCreditProfile {
            id: format!("user-{ordinal}"),
            name: ROSTER[index % ROSTER.len()].to_string(),
            email: format!("user{ordinal}@example.com"),
            current_credit_score: credit_score,
            credit_history,
            debt_to_income_ratio: (debt_to_income * 100.0).round() / 100.0,
            total_debt,
            monthly_income,
            payment_history,
            account_age,
            credit_utilization,
            risk_level,
            status,
            last_updated: now,
        }
    }

    fn history(&mut self, credit_score: i32, now: DateTime<Utc>) -> Vec<CreditHistoryEntry> {
        let months: u32 = self.rng.gen_range(12..24);
        (0..months)
            .map(|month| {
                let offset = Months::new(months - month);
                let date = now.checked_sub_months(offset).unwrap_or(now);
                let jitter: i32 = self.rng.gen_range(-25..25);
                CreditHistoryEntry {
                    date,
                    credit_score: (credit_score + jitter).clamp(300, 850),
                    payment_status: PAYMENT_POOL[self.rng.gen_range(0..PAYMENT_POOL.len())],
                    amount: f64::from(self.rng.gen_range(500u32..5_500)),
                    event: format!("Payment {}", month + 1),
                }
            })
            .collect()
    }
}

/// Upstream label assignment; the scoring engine treats the result as given.
pub fn derive_risk_level(
    credit_score: i32,
    debt_to_income: f64,
    payments: &PaymentHistory,
) -> RiskLevel {
    if credit_score < 580 || debt_to_income > 0.5 || payments.missed > 5 {
        RiskLevel::High
    } else if credit_score < 670 || debt_to_income > 0.4 || payments.late > 10 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
