//! Currency conversion and amount formatting

use std::collections::HashMap;

use tracing::warn;

use crate::models::{Account, Transaction};

/// Fixed conversion table to USD
#[derive(Debug, Clone)]
pub struct CurrencyConverter {
    rates: HashMap<String, f64>,
}

impl CurrencyConverter {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        let rates = rates
            .into_iter()
            .map(|(code, rate)| (code.to_uppercase(), rate))
            .collect();
        Self { rates }
    }

    /// Rate for a currency code; unknown codes convert at 1.0
    pub fn rate(&self, currency: &str) -> f64 {
        match self.rates.get(&currency.trim().to_uppercase()) {
            Some(rate) => *rate,
            None => {
                warn!(currency, "Unknown currency, converting at 1.0");
                1.0
            }
        }
    }

    pub fn to_usd(&self, amount: f64, currency: &str) -> f64 {
        amount * self.rate(currency)
    }

    /// Sum of all account balances converted to USD
    pub fn total_in_usd(&self, accounts: &[Account]) -> f64 {
        accounts
            .iter()
            .map(|a| self.to_usd(a.balance, &a.currency))
            .sum()
    }

    /// Copies of `transactions` with amounts restated in USD
    ///
    /// Transactions without a joined currency are taken to be USD already.
    pub fn transactions_in_usd(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        transactions
            .iter()
            .map(|tx| {
                let mut tx = tx.clone();
                if let Some(currency) = tx.currency.take() {
                    tx.amount = self.to_usd(tx.amount, &currency);
                }
                tx.currency = Some("USD".to_string());
                tx
            })
            .collect()
    }

    /// Accounts ordered by USD value, largest first
    pub fn sort_by_usd_desc(&self, accounts: &mut [Account]) {
        accounts.sort_by(|a, b| {
            self.to_usd(b.balance, &b.currency)
                .total_cmp(&self.to_usd(a.balance, &a.currency))
        });
    }
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self::new(crate::config::AssistantConfig::default().currency_rates)
    }
}

/// Format an amount with thousands separators and two decimals
///
/// `1234567.891` becomes `"1,234,567.89"`.
pub fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!(
        "{}{}.{:02}",
        if negative && cents > 0 { "-" } else { "" },
        grouped,
        fraction
    )
}
