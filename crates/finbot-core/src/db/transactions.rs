//! Transaction operations

use rusqlite::params;

use super::{datetime_column, enum_column, Database, DATETIME_FORMAT};
use crate::error::Result;
use crate::models::{AccountType, Transaction};

impl Database {
    /// A customer's newest transactions across all accounts
    pub fn recent_transactions(&self, customer_id: i64, limit: usize) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.transaction_id, t.account_id, t.transaction_type, t.amount,
                   t.transaction_date, t.description, t.status, t.recipient_account_id,
                   a.account_type, a.currency
            FROM transactions t
            JOIN accounts a ON t.account_id = a.account_id
            WHERE a.customer_id = ?
            ORDER BY t.transaction_date DESC, t.transaction_id DESC
            LIMIT ?
            "#,
        )?;

        let transactions = stmt
            .query_map(params![customer_id, limit as i64], |row| {
                let account_type: Option<String> = row.get(8)?;
                Ok(Transaction {
                    transaction_id: row.get(0)?,
                    account_id: row.get(1)?,
                    transaction_type: enum_column(row, 2)?,
                    amount: row.get(3)?,
                    transaction_date: datetime_column(row, 4)?,
                    description: row.get(5)?,
                    status: enum_column(row, 6)?,
                    recipient_account_id: row.get(7)?,
                    account_type: account_type.and_then(|s| s.parse::<AccountType>().ok()),
                    currency: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Insert (or replace) a transaction with an explicit id
    ///
    /// Amounts are stored unsigned; the transaction type carries direction.
    pub fn insert_transaction(&self, tx: &Transaction) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO transactions
                (transaction_id, account_id, transaction_type, amount,
                 transaction_date, description, status, recipient_account_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.transaction_id,
                tx.account_id,
                tx.transaction_type.as_str(),
                tx.amount.abs(),
                tx.transaction_date.format(DATETIME_FORMAT).to_string(),
                tx.description,
                tx.status.as_str(),
                tx.recipient_account_id,
            ],
        )?;
        Ok(())
    }
}
