//! Financial context for LLM prompts
//!
//! Gathers a customer's profile, accounts and recent transactions and renders
//! them into the profile section of the prompt sent to the LLM.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::anomaly::suspicious_activity;
use crate::currency::{format_amount, CurrencyConverter};
use crate::db::Database;
use crate::error::Result;
use crate::models::{Account, Customer, Language, Transaction, TransactionStatus};

/// System prompt for the financial advisor persona
pub const SYSTEM_PROMPT: &str = include_str!("../../../prompts/financial_advisor.md");

/// Description keywords mapped to spending categories
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Housing", &["rent", "mortgage", "إيجار"]),
    ("Groceries", &["grocery", "supermarket", "market", "بقالة"]),
    ("Dining", &["restaurant", "cafe", "coffee", "مطعم"]),
    ("Utilities", &["electric", "water", "internet", "utility", "phone", "كهرباء"]),
    ("Transport", &["fuel", "gas station", "uber", "taxi", "وقود"]),
    ("Shopping", &["amazon", "mall", "store", "shop"]),
    ("Health", &["pharmacy", "clinic", "hospital"]),
];

/// Spending category for a transaction from its description, falling back to its type
pub fn categorize(tx: &Transaction) -> String {
    let description = tx.description.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| description.contains(w)))
        .map(|(category, _)| category.to_string())
        .unwrap_or_else(|| tx.transaction_type.as_str().to_string())
}

/// Everything the LLM gets to know about one customer
#[derive(Debug, Clone)]
pub struct FinancialContext {
    pub customer: Option<Customer>,
    /// Largest USD value first
    pub accounts: Vec<Account>,
    /// Newest first, amounts in USD
    pub transactions: Vec<Transaction>,
    pub total_balance_usd: f64,
}

impl FinancialContext {
    /// Load a customer's profile, active accounts and recent transactions
    pub fn assemble(
        db: &Database,
        customer_id: i64,
        converter: &CurrencyConverter,
        transaction_limit: usize,
    ) -> Result<Self> {
        let customer = db.get_customer(customer_id)?;
        let mut accounts = db.list_accounts(customer_id)?;
        converter.sort_by_usd_desc(&mut accounts);
        let transactions =
            converter.transactions_in_usd(&db.recent_transactions(customer_id, transaction_limit)?);
        let total_balance_usd = converter.total_in_usd(&accounts);

        Ok(Self {
            customer,
            accounts,
            transactions,
            total_balance_usd,
        })
    }

    fn successful(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.status == TransactionStatus::Success)
    }

    /// Successful deposits in the loaded window
    pub fn income(&self) -> f64 {
        self.successful()
            .filter(|t| t.transaction_type.is_income())
            .map(|t| t.amount)
            .sum()
    }

    /// Successful withdrawals and bill payments in the loaded window
    pub fn spending(&self) -> f64 {
        self.successful()
            .filter(|t| t.transaction_type.is_expense())
            .map(|t| t.amount)
            .sum()
    }

    /// Largest spending categories, biggest first
    pub fn top_categories(&self, n: usize) -> Vec<(String, f64)> {
        let mut totals: HashMap<String, f64> = HashMap::new();
        for tx in self.successful().filter(|t| t.transaction_type.is_expense()) {
            *totals.entry(categorize(tx)).or_insert(0.0) += tx.amount;
        }
        let mut sorted: Vec<(String, f64)> = totals.into_iter().collect();
        sorted.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        sorted.truncate(n);
        sorted
    }

    /// Render the customer profile block of the prompt
    pub fn to_prompt_section(&self) -> String {
        let mut out = String::from("CUSTOMER FINANCIAL PROFILE:\n");

        if let Some(customer) = &self.customer {
            let mut profile = customer.full_name();
            if let Some(city) = &customer.city {
                let _ = write!(profile, ", {}", city);
            }
            if let Some(age) = customer.age_on(chrono::Utc::now().date_naive()) {
                let _ = write!(profile, ", age {}", age);
            }
            let _ = writeln!(out, "- Customer: {}", profile);
        }

        let _ = writeln!(
            out,
            "- Total balance: ${} across {} accounts",
            format_amount(self.total_balance_usd),
            self.accounts.len()
        );
        for account in self.accounts.iter().take(2) {
            let _ = writeln!(
                out,
                "- {} account: {} {}",
                account.account_type,
                format_amount(account.balance),
                account.currency
            );
        }

        let _ = writeln!(
            out,
            "- Recent income: ${}, recent spending: ${} ({} transactions)",
            format_amount(self.income()),
            format_amount(self.spending()),
            self.transactions.len()
        );

        let categories = self.top_categories(2);
        if !categories.is_empty() {
            let list: Vec<String> = categories
                .iter()
                .map(|(name, amount)| format!("{} (${})", name, format_amount(*amount)))
                .collect();
            let _ = writeln!(out, "- Top spending: {}", list.join(", "));
        }

        out
    }
}

/// Assemble the full LLM prompt
pub fn build_prompt(
    system_prompt: &str,
    context: &FinancialContext,
    question: &str,
    language: Language,
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "{}", system_prompt.trim());
    prompt.push('\n');
    let _ = writeln!(
        prompt,
        "{}",
        match language {
            Language::Arabic => "The user wrote in Arabic. Respond in Arabic.",
            Language::English => "The user wrote in English. Respond in English.",
        }
    );
    prompt.push('\n');
    prompt.push_str(&context.to_prompt_section());

    let alerts = suspicious_activity(&context.transactions);
    if !alerts.is_empty() {
        let messages: Vec<&str> = alerts.iter().map(|a| a.message.as_str()).collect();
        let _ = writeln!(prompt, "SECURITY ALERTS: {}", messages.join("; "));
    }

    prompt.push('\n');
    let _ = write!(prompt, "User question: {}", question.trim());
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountStatus, AccountType, TransactionType};
    use chrono::NaiveDate;

    fn tx(id: i64, kind: TransactionType, amount: f64, description: &str) -> Transaction {
        Transaction {
            transaction_id: id,
            account_id: 1,
            transaction_type: kind,
            amount,
            transaction_date: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            description: description.to_string(),
            status: TransactionStatus::Success,
            recipient_account_id: None,
            account_type: None,
            currency: None,
        }
    }

    fn context(transactions: Vec<Transaction>) -> FinancialContext {
        FinancialContext {
            customer: None,
            accounts: vec![Account {
                account_id: 1,
                customer_id: 1,
                account_type: AccountType::Checking,
                balance: 2500.0,
                currency: "USD".into(),
                opening_date: None,
                status: AccountStatus::Active,
            }],
            transactions,
            total_balance_usd: 2500.0,
        }
    }

    #[test]
    fn test_categorize() {
        assert_eq!(
            categorize(&tx(1, TransactionType::BillPayment, 90.0, "Electric bill")),
            "Utilities"
        );
        assert_eq!(
            categorize(&tx(2, TransactionType::Withdrawal, 1500.0, "Monthly RENT")),
            "Housing"
        );
        assert_eq!(
            categorize(&tx(3, TransactionType::Withdrawal, 40.0, "ATM")),
            "Withdrawal"
        );
    }

    #[test]
    fn test_income_spending_and_categories() {
        let ctx = context(vec![
            tx(1, TransactionType::Deposit, 5000.0, "Salary"),
            tx(2, TransactionType::Withdrawal, 1500.0, "Rent payment"),
            tx(3, TransactionType::BillPayment, 120.0, "Internet"),
            tx(4, TransactionType::BillPayment, 80.0, "Water"),
            tx(5, TransactionType::Transfer, 300.0, "To savings"),
        ]);
        assert_eq!(ctx.income(), 5000.0);
        assert_eq!(ctx.spending(), 1700.0);
        assert_eq!(
            ctx.top_categories(2),
            vec![("Housing".to_string(), 1500.0), ("Utilities".to_string(), 200.0)]
        );

        let section = ctx.to_prompt_section();
        assert!(section.contains("Total balance: $2,500.00 across 1 accounts"));
        assert!(section.contains("Top spending: Housing ($1,500.00), Utilities ($200.00)"));
    }

    #[test]
    fn test_build_prompt_layout() {
        let ctx = context(vec![tx(1, TransactionType::Deposit, 100.0, "Salary")]);
        let prompt = build_prompt(SYSTEM_PROMPT, &ctx, "  How am I doing? ", Language::Arabic);

        assert!(prompt.starts_with("You are a specialized Financial and Banking Advisor"));
        assert!(prompt.contains("Respond in Arabic."));
        assert!(prompt.contains("CUSTOMER FINANCIAL PROFILE:"));
        assert!(!prompt.contains("SECURITY ALERTS"));
        assert!(prompt.ends_with("User question: How am I doing?"));
    }

    #[test]
    fn test_build_prompt_includes_security_alerts() {
        let mut txs: Vec<Transaction> = (0..6)
            .map(|i| tx(i, TransactionType::Withdrawal, 2.0, "Card check"))
            .collect();
        txs.push(tx(10, TransactionType::Withdrawal, 50.0, "PENDING reversal"));
        let prompt = build_prompt(SYSTEM_PROMPT, &context(txs), "anything odd?", Language::English);
        assert!(prompt.contains("SECURITY ALERTS:"));
        assert!(prompt.contains("possible card testing"));
    }

    #[test]
    fn test_assemble_converts_to_usd() {
        let db = Database::in_memory().unwrap();
        db.insert_customer(&Customer {
            customer_id: 1,
            first_name: "Noura".into(),
            last_name: "Test".into(),
            email: None,
            phone: None,
            date_of_birth: None,
            gender: None,
            city: None,
            registration_date: None,
        })
        .unwrap();
        for (id, balance, currency) in [(1, 15_250.0, "USD"), (2, 85_000.0, "SAR")] {
            db.insert_account(&Account {
                account_id: id,
                customer_id: 1,
                account_type: AccountType::Checking,
                balance,
                currency: currency.into(),
                opening_date: None,
                status: AccountStatus::Active,
            })
            .unwrap();
        }
        let mut rent = tx(1, TransactionType::Withdrawal, 3750.0, "Rent");
        rent.account_id = 2;
        db.insert_transaction(&rent).unwrap();

        let ctx = FinancialContext::assemble(&db, 1, &CurrencyConverter::default(), 100)
            .unwrap();

        // 85,000 SAR outranks 15,250 USD
        assert_eq!(ctx.accounts[0].account_id, 2);
        assert!((ctx.spending() - 3750.0 * 0.267).abs() < 1e-9);
        let section = ctx.to_prompt_section();
        assert!(section.contains("recent spending: $1,001.25"), "{}", section);
        assert!(section.contains("Housing ($1,001.25)"), "{}", section);
    }
}
