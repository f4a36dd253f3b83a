//! Financial health score
//!
//! Starts from 70 and adjusts for balance tier, transaction diversity and
//! failure rate, clamped to 0-100.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::{Transaction, TransactionStatus};

const BASE_SCORE: f64 = 70.0;

/// One contribution to the score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthFactor {
    pub label: &'static str,
    pub points: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Excellent,
    VeryGood,
    Good,
    Fair,
    NeedsImprovement,
}

impl HealthStatus {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Self::Excellent,
            s if s >= 80.0 => Self::VeryGood,
            s if s >= 70.0 => Self::Good,
            s if s >= 60.0 => Self::Fair,
            _ => Self::NeedsImprovement,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }

    pub fn arabic(&self) -> &'static str {
        match self {
            Self::Excellent => "ممتاز",
            Self::VeryGood => "جيد جداً",
            Self::Good => "جيد",
            Self::Fair => "مقبول",
            Self::NeedsImprovement => "يحتاج إلى تحسين",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub score: f64,
    pub status: HealthStatus,
    pub factors: Vec<HealthFactor>,
    /// Share of transactions that failed (0-1)
    pub failure_rate: f64,
}

/// Score a customer from their USD balance total and recent transactions
pub fn health_score(total_balance_usd: f64, transactions: &[Transaction]) -> HealthReport {
    let mut factors = Vec::new();

    factors.push(match total_balance_usd {
        b if b > 100_000.0 => HealthFactor {
            label: "Excellent balance",
            points: 15.0,
        },
        b if b > 50_000.0 => HealthFactor {
            label: "Good balance",
            points: 10.0,
        },
        b if b > 10_000.0 => HealthFactor {
            label: "Moderate balance",
            points: 5.0,
        },
        _ => HealthFactor {
            label: "Low balance",
            points: -10.0,
        },
    });

    let types: HashSet<_> = transactions.iter().map(|t| t.transaction_type).collect();
    if types.len() > 2 {
        factors.push(HealthFactor {
            label: "Diverse transaction activity",
            points: 5.0,
        });
    }

    let failed = transactions
        .iter()
        .filter(|t| t.status == TransactionStatus::Failed)
        .count();
    let failure_rate = if transactions.is_empty() {
        0.0
    } else {
        failed as f64 / transactions.len() as f64
    };
    factors.push(match failure_rate {
        r if r > 0.2 => HealthFactor {
            label: "High failure rate",
            points: -15.0,
        },
        r if r > 0.1 => HealthFactor {
            label: "Some failed transactions",
            points: -5.0,
        },
        _ => HealthFactor {
            label: "Reliable transactions",
            points: 10.0,
        },
    });

    let score = (BASE_SCORE + factors.iter().map(|f| f.points).sum::<f64>()).clamp(0.0, 100.0);

    HealthReport {
        score,
        status: HealthStatus::from_score(score),
        factors,
        failure_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use chrono::NaiveDate;

    fn tx(kind: TransactionType, status: TransactionStatus) -> Transaction {
        Transaction {
            transaction_id: 1,
            account_id: 1,
            transaction_type: kind,
            amount: 10.0,
            transaction_date: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            description: String::new(),
            status,
            recipient_account_id: None,
            account_type: None,
            currency: None,
        }
    }

    #[test]
    fn test_best_case_is_clamped() {
        let txs = vec![
            tx(TransactionType::Deposit, TransactionStatus::Success),
            tx(TransactionType::Withdrawal, TransactionStatus::Success),
            tx(TransactionType::Transfer, TransactionStatus::Success),
        ];
        let report = health_score(250_000.0, &txs);
        assert_eq!(report.score, 100.0);
        assert_eq!(report.status, HealthStatus::Excellent);
        assert_eq!(report.factors.len(), 3);
    }

    #[test]
    fn test_low_balance_high_failure() {
        let txs = vec![
            tx(TransactionType::Withdrawal, TransactionStatus::Failed),
            tx(TransactionType::Withdrawal, TransactionStatus::Success),
            tx(TransactionType::Withdrawal, TransactionStatus::Success),
        ];
        let report = health_score(500.0, &txs);
        // 70 - 10 - 15
        assert_eq!(report.score, 45.0);
        assert_eq!(report.status, HealthStatus::NeedsImprovement);
        assert!((report.failure_rate - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_transactions_counts_as_reliable() {
        let report = health_score(20_000.0, &[]);
        // 70 + 5 + 10
        assert_eq!(report.score, 85.0);
        assert_eq!(report.status, HealthStatus::VeryGood);
        assert_eq!(report.failure_rate, 0.0);
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(HealthStatus::from_score(90.0), HealthStatus::Excellent);
        assert_eq!(HealthStatus::from_score(79.9), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(60.0), HealthStatus::Fair);
        assert_eq!(HealthStatus::from_score(59.0), HealthStatus::NeedsImprovement);
    }
}
