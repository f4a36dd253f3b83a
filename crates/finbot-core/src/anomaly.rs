//! Anomaly and fraud heuristics
//!
//! - `detect_anomalies`: z-score outliers within each transaction type
//! - `suspicious_activity`: rule-based security alerts for the LLM prompt

use std::collections::BTreeMap;

use serde::Serialize;

use crate::forecast::std_dev;
use crate::models::{Transaction, TransactionType};

/// Minimum group size for a meaningful z-score
const MIN_GROUP_SIZE: usize = 3;
/// At most this many anomalies are reported
const MAX_ANOMALIES: usize = 5;
/// |z| above this is high severity
const HIGH_SEVERITY_Z: f64 = 3.0;

const LARGE_MULTIPLE_OF_AVERAGE: f64 = 5.0;
const LARGE_MINIMUM: f64 = 1000.0;
const SMALL_DEBIT_LIMIT: f64 = 10.0;
const SMALL_DEBIT_COUNT: usize = 5;
const MAX_ALERTS: usize = 3;
const SUSPICIOUS_WORDS: &[&str] = &["unknown", "temp", "pending", "reversal", "dispute"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// A transaction unusually large or small for its type
#[derive(Debug, Clone, Serialize)]
pub struct Anomaly {
    pub transaction: Transaction,
    /// Signed z-score against the type's mean
    pub z_score: f64,
    pub type_mean: f64,
    pub severity: Severity,
}

/// Flag transactions whose |z| within their type exceeds `z_threshold`
///
/// Types with fewer than three transactions or no spread are skipped.
/// Results are ordered by |z|, largest first, and capped at five.
pub fn detect_anomalies(transactions: &[Transaction], z_threshold: f64) -> Vec<Anomaly> {
    let mut groups: BTreeMap<TransactionType, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        groups.entry(tx.transaction_type).or_default().push(tx);
    }

    let mut anomalies = Vec::new();
    for members in groups.values() {
        if members.len() < MIN_GROUP_SIZE {
            continue;
        }
        let amounts: Vec<f64> = members.iter().map(|t| t.amount).collect();
        let std = std_dev(&amounts);
        if std == 0.0 {
            continue;
        }
        let mean = amounts.iter().sum::<f64>() / amounts.len() as f64;

        for tx in members {
            let z = (tx.amount - mean) / std;
            if z.abs() > z_threshold {
                anomalies.push(Anomaly {
                    transaction: (*tx).clone(),
                    z_score: z,
                    type_mean: mean,
                    severity: if z.abs() > HIGH_SEVERITY_Z {
                        Severity::High
                    } else {
                        Severity::Medium
                    },
                });
            }
        }
    }

    anomalies.sort_by(|a, b| {
        b.z_score
            .abs()
            .partial_cmp(&a.z_score.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    anomalies.truncate(MAX_ANOMALIES);
    anomalies
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LargeTransaction,
    ManySmallDebits,
    SuspiciousDescription,
}

/// A security warning surfaced to the LLM
#[derive(Debug, Clone, Serialize)]
pub struct SecurityAlert {
    pub kind: AlertKind,
    pub message: String,
    pub transaction_id: Option<i64>,
}

/// Rule-based fraud signals, at most three
pub fn suspicious_activity(transactions: &[Transaction]) -> Vec<SecurityAlert> {
    if transactions.is_empty() {
        return Vec::new();
    }
    let average = transactions.iter().map(|t| t.amount).sum::<f64>() / transactions.len() as f64;
    let mut alerts = Vec::new();

    for tx in transactions {
        if tx.amount > average * LARGE_MULTIPLE_OF_AVERAGE && tx.amount > LARGE_MINIMUM {
            alerts.push(SecurityAlert {
                kind: AlertKind::LargeTransaction,
                message: format!(
                    "Unusually large {} of ${:.2} on {}",
                    tx.transaction_type.as_str().to_lowercase(),
                    tx.amount,
                    tx.transaction_date.format("%Y-%m-%d")
                ),
                transaction_id: Some(tx.transaction_id),
            });
        }
    }

    let small_debits = transactions
        .iter()
        .filter(|t| t.transaction_type.is_expense() && t.amount < SMALL_DEBIT_LIMIT)
        .count();
    if small_debits > SMALL_DEBIT_COUNT {
        alerts.push(SecurityAlert {
            kind: AlertKind::ManySmallDebits,
            message: format!(
                "{} small debits under ${:.0} (possible card testing)",
                small_debits, SMALL_DEBIT_LIMIT
            ),
            transaction_id: None,
        });
    }

    for tx in transactions {
        let description = tx.description.to_lowercase();
        if let Some(word) = SUSPICIOUS_WORDS.iter().find(|w| description.contains(*w)) {
            alerts.push(SecurityAlert {
                kind: AlertKind::SuspiciousDescription,
                message: format!(
                    "Transaction \"{}\" mentions \"{}\"",
                    tx.description, word
                ),
                transaction_id: Some(tx.transaction_id),
            });
        }
    }

    alerts.truncate(MAX_ALERTS);
    alerts
}
