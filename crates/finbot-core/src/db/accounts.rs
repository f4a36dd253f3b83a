//! Account operations

use rusqlite::params;

use super::{date_column, enum_column, Database};
use crate::error::Result;
use crate::models::{Account, AccountStatus};

impl Database {
    /// List a customer's active accounts, largest balance first
    pub fn list_accounts(&self, customer_id: i64) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT account_id, customer_id, account_type, balance, currency, opening_date, status
            FROM accounts
            WHERE customer_id = ? AND status = ?
            ORDER BY balance DESC, account_id
            "#,
        )?;

        let accounts = stmt
            .query_map(params![customer_id, AccountStatus::Active.as_str()], |row| {
                Ok(Account {
                    account_id: row.get(0)?,
                    customer_id: row.get(1)?,
                    account_type: enum_column(row, 2)?,
                    balance: row.get(3)?,
                    currency: row.get(4)?,
                    opening_date: date_column(row, 5)?,
                    status: enum_column(row, 6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Insert (or replace) an account with an explicit id
    pub fn insert_account(&self, account: &Account) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO accounts
                (account_id, customer_id, account_type, balance, currency, opening_date, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                account.account_id,
                account.customer_id,
                account.account_type.as_str(),
                account.balance,
                account.currency.to_uppercase(),
                account.opening_date.map(|d| d.to_string()),
                account.status.as_str(),
            ],
        )?;
        Ok(())
    }
}
