//! Domain models for FinBot
//!
//! Records mirror the banking schema (customers, accounts, transactions).
//! Enumerations accept both the canonical English values and the Arabic
//! values used by the original bank dataset.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A bank customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub city: Option<String>,
    pub registration_date: Option<NaiveDate>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Age in whole years on the given day
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let dob = self.date_of_birth?;
        let mut age = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }
}

/// Account types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
    Investment,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "Checking",
            Self::Savings => "Savings",
            Self::Investment => "Investment",
        }
    }

    pub fn label(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (_, Language::English) => self.as_str(),
            (Self::Checking, Language::Arabic) => "جاري",
            (Self::Savings, Language::Arabic) => "توفير",
            (Self::Investment, Language::Arabic) => "استثمار",
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "checking" | "current" | "جاري" => Ok(Self::Checking),
            "savings" | "saving" | "توفير" => Ok(Self::Savings),
            "investment" | "استثمار" => Ok(Self::Investment),
            _ => Err(format!("Unknown account type: {}", s)),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Closed => "Closed",
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" | "نشط" => Ok(Self::Active),
            "inactive" | "غير نشط" => Ok(Self::Inactive),
            "closed" | "مغلق" => Ok(Self::Closed),
            _ => Err(format!("Unknown account status: {}", s)),
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bank account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_id: i64,
    pub customer_id: i64,
    pub account_type: AccountType,
    pub balance: f64,
    /// ISO currency code (USD, SAR, EUR, ...)
    pub currency: String,
    pub opening_date: Option<NaiveDate>,
    pub status: AccountStatus,
}

/// Transaction types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    BillPayment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "Deposit",
            Self::Withdrawal => "Withdrawal",
            Self::Transfer => "Transfer",
            Self::BillPayment => "Bill Payment",
        }
    }

    pub fn label(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (_, Language::English) => self.as_str(),
            (Self::Deposit, Language::Arabic) => "إيداع",
            (Self::Withdrawal, Language::Arabic) => "سحب",
            (Self::Transfer, Language::Arabic) => "تحويل",
            (Self::BillPayment, Language::Arabic) => "دفع فواتير",
        }
    }

    /// Money leaving the customer (counted as spending)
    pub fn is_expense(&self) -> bool {
        matches!(self, Self::Withdrawal | Self::BillPayment)
    }

    pub fn is_income(&self) -> bool {
        matches!(self, Self::Deposit)
    }

    pub fn all() -> &'static [TransactionType] {
        &[
            Self::Deposit,
            Self::Withdrawal,
            Self::Transfer,
            Self::BillPayment,
        ]
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deposit" | "credit" | "إيداع" => Ok(Self::Deposit),
            "withdrawal" | "debit" | "سحب" => Ok(Self::Withdrawal),
            "transfer" | "تحويل" => Ok(Self::Transfer),
            "bill payment" | "bill_payment" | "دفع فواتير" => Ok(Self::BillPayment),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failed,
    Pending,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failed => "Failed",
            Self::Pending => "Pending",
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "success" | "completed" | "ناجحة" => Ok(Self::Success),
            "failed" | "فاشلة" => Ok(Self::Failed),
            "pending" | "معلقة" => Ok(Self::Pending),
            _ => Err(format!("Unknown transaction status: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: i64,
    pub account_id: i64,
    pub transaction_type: TransactionType,
    /// Always positive; direction comes from `transaction_type`
    pub amount: f64,
    pub transaction_date: NaiveDateTime,
    pub description: String,
    pub status: TransactionStatus,
    pub recipient_account_id: Option<i64>,
    /// Owning account's type (populated by joined reads)
    pub account_type: Option<AccountType>,
    /// Owning account's currency (populated by joined reads)
    pub currency: Option<String>,
}

/// Spending total for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAmount {
    /// "YYYY-MM"
    pub month: String,
    pub amount: f64,
    pub count: i64,
}

/// Successful transactions of one type in one month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSummary {
    pub transaction_type: TransactionType,
    pub month: String,
    pub count: i64,
    pub total: f64,
    pub average: f64,
}

/// Per-type totals for one month (newest first when listed)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub withdrawals: f64,
    pub bills: f64,
    pub transfers: f64,
    pub deposits: f64,
    pub count: i64,
}

impl MonthlyTrend {
    pub fn spending(&self) -> f64 {
        self.withdrawals + self.bills
    }
}

/// Row counts for status output
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub customers: i64,
    pub accounts: i64,
    pub transactions: i64,
}

/// Language of a user message (and of the reply)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Arabic,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Arabic => "arabic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_parses_arabic_and_english() {
        assert_eq!(
            "سحب".parse::<TransactionType>().unwrap(),
            TransactionType::Withdrawal
        );
        assert_eq!(
            "دفع فواتير".parse::<TransactionType>().unwrap(),
            TransactionType::BillPayment
        );
        assert_eq!(
            "Bill Payment".parse::<TransactionType>().unwrap(),
            TransactionType::BillPayment
        );
        assert_eq!(
            "credit".parse::<TransactionType>().unwrap(),
            TransactionType::Deposit
        );
        assert!("lottery".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_status_and_account_enums() {
        assert_eq!(
            "ناجحة".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Success
        );
        assert_eq!(
            "نشط".parse::<AccountStatus>().unwrap(),
            AccountStatus::Active
        );
        assert_eq!(
            "توفير".parse::<AccountType>().unwrap(),
            AccountType::Savings
        );
        assert_eq!(AccountType::Checking.label(Language::Arabic), "جاري");
    }

    #[test]
    fn test_customer_age() {
        let customer = Customer {
            customer_id: 1,
            first_name: "Ahmed".into(),
            last_name: "Al-Rashid".into(),
            email: None,
            phone: None,
            date_of_birth: NaiveDate::from_ymd_opt(1992, 6, 15),
            gender: None,
            city: None,
            registration_date: None,
        };
        let before_birthday = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let on_birthday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(customer.age_on(before_birthday), Some(31));
        assert_eq!(customer.age_on(on_birthday), Some(32));
        assert_eq!(customer.full_name(), "Ahmed Al-Rashid");
    }
}
