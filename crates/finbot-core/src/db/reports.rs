//! Spending reports and analytics
//!
//! All aggregates count successful transactions only. Accounts may hold
//! different currencies, so rows are summed per currency in SQL and
//! converted to USD before they are merged.

use std::collections::BTreeMap;

use rusqlite::params;

use super::{enum_column, Database};
use crate::currency::CurrencyConverter;
use crate::error::Result;
use crate::models::{MonthlyAmount, MonthlyTrend, TransactionStatus, TypeSummary};

impl Database {
    /// Successful transactions grouped by type and month in USD, newest month first
    pub fn spending_by_type(
        &self,
        customer_id: i64,
        converter: &CurrencyConverter,
    ) -> Result<Vec<TypeSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.transaction_type,
                   strftime('%Y-%m', t.transaction_date) AS month,
                   a.currency,
                   COUNT(*),
                   SUM(t.amount)
            FROM transactions t
            JOIN accounts a ON t.account_id = a.account_id
            WHERE a.customer_id = ? AND t.status = ?
            GROUP BY t.transaction_type, month, a.currency
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![customer_id, TransactionStatus::Success.as_str()],
                |row| {
                    let currency: String = row.get(2)?;
                    let total: f64 = row.get(4)?;
                    Ok(TypeSummary {
                        transaction_type: enum_column(row, 0)?,
                        month: row.get(1)?,
                        count: row.get(3)?,
                        total: converter.to_usd(total, &currency),
                        average: 0.0,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut merged: Vec<TypeSummary> = Vec::new();
        for row in rows {
            match merged
                .iter_mut()
                .find(|m| m.month == row.month && m.transaction_type == row.transaction_type)
            {
                Some(existing) => {
                    existing.count += row.count;
                    existing.total += row.total;
                }
                None => merged.push(row),
            }
        }
        for summary in &mut merged {
            summary.average = summary.total / summary.count.max(1) as f64;
        }
        merged.sort_by(|a, b| {
            b.month
                .cmp(&a.month)
                .then_with(|| b.total.total_cmp(&a.total))
        });

        Ok(merged)
    }

    /// Monthly spending (withdrawals + bill payments) in USD, oldest month first
    ///
    /// This is the series the forecaster fits.
    pub fn monthly_spending(
        &self,
        customer_id: i64,
        converter: &CurrencyConverter,
    ) -> Result<Vec<MonthlyAmount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT strftime('%Y-%m', t.transaction_date) AS month,
                   a.currency,
                   SUM(t.amount),
                   COUNT(*)
            FROM transactions t
            JOIN accounts a ON t.account_id = a.account_id
            WHERE a.customer_id = ?
              AND t.status = ?
              AND t.transaction_type IN ('Withdrawal', 'Bill Payment')
            GROUP BY month, a.currency
            "#,
        )?;

        let mut months: BTreeMap<String, MonthlyAmount> = BTreeMap::new();
        let rows = stmt.query_map(
            params![customer_id, TransactionStatus::Success.as_str()],
            |row| {
                let currency: String = row.get(1)?;
                let amount: f64 = row.get(2)?;
                Ok(MonthlyAmount {
                    month: row.get(0)?,
                    amount: converter.to_usd(amount, &currency),
                    count: row.get(3)?,
                })
            },
        )?;
        for row in rows {
            let row = row?;
            let entry = months.entry(row.month.clone()).or_insert(MonthlyAmount {
                month: row.month,
                amount: 0.0,
                count: 0,
            });
            entry.amount += row.amount;
            entry.count += row.count;
        }

        Ok(months.into_values().collect())
    }

    /// Per-type USD totals for the most recent `months` months, newest first
    pub fn monthly_trends(
        &self,
        customer_id: i64,
        months: usize,
        converter: &CurrencyConverter,
    ) -> Result<Vec<MonthlyTrend>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT strftime('%Y-%m', t.transaction_date) AS month,
                   a.currency,
                   COALESCE(SUM(CASE WHEN t.transaction_type = 'Withdrawal' THEN t.amount END), 0),
                   COALESCE(SUM(CASE WHEN t.transaction_type = 'Bill Payment' THEN t.amount END), 0),
                   COALESCE(SUM(CASE WHEN t.transaction_type = 'Transfer' THEN t.amount END), 0),
                   COALESCE(SUM(CASE WHEN t.transaction_type = 'Deposit' THEN t.amount END), 0),
                   COUNT(*)
            FROM transactions t
            JOIN accounts a ON t.account_id = a.account_id
            WHERE a.customer_id = ? AND t.status = ?
            GROUP BY month, a.currency
            "#,
        )?;

        let mut by_month: BTreeMap<String, MonthlyTrend> = BTreeMap::new();
        let rows = stmt.query_map(
            params![customer_id, TransactionStatus::Success.as_str()],
            |row| {
                let currency: String = row.get(1)?;
                let usd = |v: f64| converter.to_usd(v, &currency);
                Ok(MonthlyTrend {
                    month: row.get(0)?,
                    withdrawals: usd(row.get(2)?),
                    bills: usd(row.get(3)?),
                    transfers: usd(row.get(4)?),
                    deposits: usd(row.get(5)?),
                    count: row.get(6)?,
                })
            },
        )?;
        for row in rows {
            let row = row?;
            let entry = by_month
                .entry(row.month.clone())
                .or_insert_with(|| MonthlyTrend {
                    month: row.month.clone(),
                    ..Default::default()
                });
            entry.withdrawals += row.withdrawals;
            entry.bills += row.bills;
            entry.transfers += row.transfers;
            entry.deposits += row.deposits;
            entry.count += row.count;
        }

        Ok(by_month.into_values().rev().take(months).collect())
    }
}
