//! CSV import and demo data
//!
//! The bank dataset ships as three CSV files (`customers.csv`, `accounts.csv`,
//! `transactions.csv`) written by a pandas generator: UTF-8 with a BOM,
//! Arabic enum values, integer ids that may carry a trailing `.0`, and empty
//! cells for missing values. Columns are looked up by header name, so extra
//! columns (address, nationality, ...) are ignored.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::{parse_date, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    Account, AccountStatus, AccountType, Customer, Transaction, TransactionStatus, TransactionType,
};

/// Rows loaded per table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportStats {
    pub customers: usize,
    pub accounts: usize,
    pub transactions: usize,
    /// Rows dropped because a required value was missing or unparseable
    pub skipped: usize,
}

/// Parsed rows plus the number of rows that had to be dropped
struct Parsed<T> {
    rows: Vec<T>,
    skipped: usize,
}

/// Header name to column index
struct Columns(HashMap<String, usize>);

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        Self(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.trim_start_matches('\u{feff}').trim().to_lowercase(), i))
                .collect(),
        )
    }

    /// Non-empty cell value
    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.0
            .get(name)
            .and_then(|&i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != "nan")
    }

    fn required<'r>(&self, record: &'r StringRecord, name: &str) -> Result<&'r str> {
        self.get(record, name)
            .ok_or_else(|| Error::InvalidData(format!("Missing {}", name)))
    }
}

/// Parse an id column; pandas writes nullable integer columns as floats
fn parse_id(s: &str) -> Result<i64> {
    s.parse::<i64>()
        .ok()
        .or_else(|| {
            s.parse::<f64>()
                .ok()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i64)
        })
        .ok_or_else(|| Error::InvalidData(format!("Invalid id: {}", s)))
}

fn parse_amount(s: &str) -> Result<f64> {
    s.replace(',', "")
        .parse::<f64>()
        .map_err(|_| Error::InvalidData(format!("Invalid amount: {}", s)))
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    // Drop fractional seconds
    let whole = s.split('.').next().unwrap_or(s);
    parse_datetime(whole).ok_or_else(|| Error::InvalidData(format!("Invalid timestamp: {}", s)))
}

fn parse_enum<T: std::str::FromStr<Err = String>>(s: &str) -> Result<T> {
    s.parse().map_err(Error::InvalidData)
}

/// Run `parse_row` over every record, dropping rows that fail
fn parse_rows<R, T, F>(reader: R, table: &str, parse_row: F) -> Result<Parsed<T>>
where
    R: Read,
    F: Fn(&Columns, &StringRecord) -> Result<T>,
{
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let columns = Columns::new(rdr.headers()?);

    let mut rows = Vec::new();
    let mut skipped = 0;
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        match parse_row(&columns, &record) {
            Ok(row) => rows.push(row),
            Err(e) => {
                debug!(table, line = line + 2, error = %e, "Skipping row");
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        warn!(table, skipped, "Some rows could not be parsed");
    }
    Ok(Parsed { rows, skipped })
}

fn parse_customers<R: Read>(reader: R) -> Result<Parsed<Customer>> {
    parse_rows(reader, "customers", |c, r| {
        Ok(Customer {
            customer_id: parse_id(c.required(r, "customer_id")?)?,
            first_name: c.required(r, "first_name")?.to_string(),
            last_name: c.get(r, "last_name").unwrap_or_default().to_string(),
            email: c.get(r, "email").map(str::to_string),
            phone: c
                .get(r, "phone_number")
                .or_else(|| c.get(r, "phone"))
                .map(str::to_string),
            date_of_birth: c.get(r, "date_of_birth").and_then(parse_date),
            gender: c.get(r, "gender").map(str::to_string),
            city: c.get(r, "city").map(str::to_string),
            registration_date: c.get(r, "registration_date").and_then(parse_date),
        })
    })
}

fn parse_accounts<R: Read>(reader: R) -> Result<Parsed<Account>> {
    parse_rows(reader, "accounts", |c, r| {
        Ok(Account {
            account_id: parse_id(c.required(r, "account_id")?)?,
            customer_id: parse_id(c.required(r, "customer_id")?)?,
            account_type: parse_enum(c.required(r, "account_type")?)?,
            balance: parse_amount(c.required(r, "balance")?)?,
            currency: c.get(r, "currency").unwrap_or("USD").to_uppercase(),
            opening_date: c.get(r, "opening_date").and_then(parse_date),
            status: match c.get(r, "status") {
                Some(s) => parse_enum(s)?,
                None => AccountStatus::Active,
            },
        })
    })
}

fn parse_transactions<R: Read>(reader: R) -> Result<Parsed<Transaction>> {
    parse_rows(reader, "transactions", |c, r| {
        Ok(Transaction {
            transaction_id: parse_id(c.required(r, "transaction_id")?)?,
            account_id: parse_id(c.required(r, "account_id")?)?,
            transaction_type: parse_enum(c.required(r, "transaction_type")?)?,
            amount: parse_amount(c.required(r, "amount")?)?.abs(),
            transaction_date: parse_timestamp(c.required(r, "transaction_date")?)?,
            description: c.get(r, "description").unwrap_or_default().to_string(),
            status: match c.get(r, "status") {
                Some(s) => parse_enum(s)?,
                None => TransactionStatus::Success,
            },
            recipient_account_id: c.get(r, "recipient_account_id").map(parse_id).transpose()?,
            account_type: None,
            currency: None,
        })
    })
}

fn open_table(dir: &Path, file: &str) -> Result<Option<std::fs::File>> {
    let path = dir.join(file);
    if !path.exists() {
        warn!(path = %path.display(), "CSV file not found, skipping table");
        return Ok(None);
    }
    Ok(Some(std::fs::File::open(path)?))
}

/// Load `customers.csv`, `accounts.csv` and `transactions.csv` from a directory
///
/// Missing files are skipped. Existing rows with the same ids are replaced,
/// so importing the same directory twice is harmless.
pub fn import_directory(db: &Database, dir: &Path) -> Result<ImportStats> {
    if !dir.is_dir() {
        return Err(Error::InvalidInput(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }
    let mut stats = ImportStats::default();

    if let Some(file) = open_table(dir, "customers.csv")? {
        let parsed = parse_customers(file)?;
        for customer in &parsed.rows {
            db.insert_customer(customer)?;
        }
        stats.customers = parsed.rows.len();
        stats.skipped += parsed.skipped;
    }

    if let Some(file) = open_table(dir, "accounts.csv")? {
        let parsed = parse_accounts(file)?;
        for account in &parsed.rows {
            db.insert_account(account)?;
        }
        stats.accounts = parsed.rows.len();
        stats.skipped += parsed.skipped;
    }

    if let Some(file) = open_table(dir, "transactions.csv")? {
        let parsed = parse_transactions(file)?;
        for tx in &parsed.rows {
            db.insert_transaction(tx)?;
        }
        stats.transactions = parsed.rows.len();
        stats.skipped += parsed.skipped;
    }

    info!(
        customers = stats.customers,
        accounts = stats.accounts,
        transactions = stats.transactions,
        skipped = stats.skipped,
        "Import complete"
    );
    Ok(stats)
}

/// Id of the seeded demo customer
pub const DEMO_CUSTOMER_ID: i64 = 1;
/// Checking account of the demo customer
pub const DEMO_CHECKING_ACCOUNT: i64 = 1001;
const DEMO_SAVINGS_ACCOUNT: i64 = 1002;
const DEMO_INVESTMENT_ACCOUNT: i64 = 1003;

fn date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Insert one deterministic demo customer
///
/// Three accounts (USD checking, SAR savings, EUR investment) and twelve
/// months (2024) of salary, rent, bills, groceries and savings transfers,
/// plus one unusually large purchase and one failed withdrawal.
pub fn seed_demo_data(db: &Database) -> Result<ImportStats> {
    let customer = Customer {
        customer_id: DEMO_CUSTOMER_ID,
        first_name: "Ahmed".to_string(),
        last_name: "Al-Rashid".to_string(),
        email: Some("ahmed.alrashid@example.com".to_string()),
        phone: Some("+966 50 123 4567".to_string()),
        date_of_birth: date(1988, 4, 12),
        gender: Some("male".to_string()),
        city: Some("Riyadh".to_string()),
        registration_date: date(2019, 3, 1),
    };
    db.insert_customer(&customer)?;

    let accounts = [
        (DEMO_CHECKING_ACCOUNT, AccountType::Checking, 15_250.75, "USD"),
        (DEMO_SAVINGS_ACCOUNT, AccountType::Savings, 85_000.0, "SAR"),
        (DEMO_INVESTMENT_ACCOUNT, AccountType::Investment, 12_000.0, "EUR"),
    ];
    for (account_id, account_type, balance, currency) in accounts {
        db.insert_account(&Account {
            account_id,
            customer_id: DEMO_CUSTOMER_ID,
            account_type,
            balance,
            currency: currency.to_string(),
            opening_date: date(2019, 3, 1),
            status: AccountStatus::Active,
        })?;
    }

    let mut transactions = Vec::new();
    let mut push = |when: Option<NaiveDateTime>,
                    kind: TransactionType,
                    amount: f64,
                    description: &str,
                    status: TransactionStatus,
                    recipient: Option<i64>|
     -> Result<()> {
        let transaction_date =
            when.ok_or_else(|| Error::InvalidData("Invalid demo date".to_string()))?;
        transactions.push(Transaction {
            transaction_id: transactions.len() as i64 + 1,
            account_id: DEMO_CHECKING_ACCOUNT,
            transaction_type: kind,
            amount,
            transaction_date,
            description: description.to_string(),
            status,
            recipient_account_id: recipient,
            account_type: None,
            currency: None,
        });
        Ok(())
    };

    let start =
        date(2024, 1, 1).ok_or_else(|| Error::InvalidData("Invalid demo date".to_string()))?;
    for m in 0..12u32 {
        let month = start
            .checked_add_months(Months::new(m))
            .ok_or_else(|| Error::InvalidData("Invalid demo date".to_string()))?;
        let at = |day: u32, hour: u32| {
            month
                .with_day(day)
                .and_then(|d| d.and_hms_opt(hour, 0, 0))
        };
        let step = f64::from(m + 1);
        let ok = TransactionStatus::Success;

        push(at(1, 9), TransactionType::Deposit, 8_000.0, "Monthly salary", ok, None)?;
        push(at(3, 10), TransactionType::Withdrawal, 2_500.0, "Apartment rent", ok, None)?;
        push(
            at(10, 11),
            TransactionType::BillPayment,
            150.0 + 5.0 * step,
            "Electric bill",
            ok,
            None,
        )?;
        push(at(12, 11), TransactionType::BillPayment, 80.0, "Internet subscription", ok, None)?;
        push(
            at(15, 18),
            TransactionType::Withdrawal,
            400.0 + 20.0 * step,
            "Supermarket groceries",
            ok,
            None,
        )?;
        push(
            at(20, 12),
            TransactionType::Transfer,
            1_000.0,
            "Transfer to savings",
            ok,
            Some(DEMO_SAVINGS_ACCOUNT),
        )?;
    }
    push(
        date(2024, 6, 18).and_then(|d| d.and_hms_opt(22, 15, 0)),
        TransactionType::Withdrawal,
        300.0,
        "ATM withdrawal",
        TransactionStatus::Failed,
        None,
    )?;
    push(
        date(2024, 11, 25).and_then(|d| d.and_hms_opt(16, 30, 0)),
        TransactionType::Withdrawal,
        9_500.0,
        "Jewelry store purchase",
        TransactionStatus::Success,
        None,
    )?;

    for tx in &transactions {
        db.insert_transaction(tx)?;
    }

    let stats = ImportStats {
        customers: 1,
        accounts: accounts.len(),
        transactions: transactions.len(),
        skipped: 0,
    };
    info!(transactions = stats.transactions, "Seeded demo customer");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyConverter;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id("17.0").unwrap(), 17);
        assert!(parse_id("17.5").is_err());
        assert!(parse_id("abc").is_err());
    }

    #[test]
    fn test_parse_timestamp_drops_fraction() {
        let ts = parse_timestamp("2023-04-05 12:34:56.789012").unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2023-04-05 12:34:56");
    }

    #[test]
    fn test_parse_customers_with_bom_and_extra_columns() {
        let csv = "\u{feff}customer_id,first_name,last_name,date_of_birth,gender,address,city,phone_number,email,registration_date\n\
                   1,محمد,العتيبي,1985-02-10,ذكر,شارع الملك,الرياض,0501234567,m@example.com,2020-01-15\n\
                   ,missing,id,,,,,,,\n";
        let parsed = parse_customers(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.skipped, 1);
        let c = &parsed.rows[0];
        assert_eq!(c.customer_id, 1);
        assert_eq!(c.city.as_deref(), Some("الرياض"));
        assert_eq!(c.phone.as_deref(), Some("0501234567"));
        assert_eq!(c.date_of_birth, NaiveDate::from_ymd_opt(1985, 2, 10));
    }

    #[test]
    fn test_parse_accounts_arabic_values() {
        let csv = "account_id,customer_id,account_type,balance,currency,opening_date,status\n\
                   1,1,توفير,1500.5,sar,2021-05-01,نشط\n\
                   2,1,جاري,200,USD,2022-01-01,\n\
                   3,1,unknown,10,USD,,\n";
        let parsed = parse_accounts(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.rows[0].account_type, AccountType::Savings);
        assert_eq!(parsed.rows[0].currency, "SAR");
        assert_eq!(parsed.rows[0].status, AccountStatus::Active);
        assert_eq!(parsed.rows[1].account_type, AccountType::Checking);
        assert_eq!(parsed.rows[1].status, AccountStatus::Active);
    }

    #[test]
    fn test_parse_transactions_arabic_values() {
        let csv = "transaction_id,account_id,transaction_type,amount,transaction_date,description,status,recipient_account_id\n\
                   1,1,إيداع,1200.00,2024-01-05 10:00:00,راتب,ناجحة,\n\
                   2,1,تحويل,300.25,2024-01-06 11:30:00.123,تحويل,معلقة,2.0\n\
                   3,1,دفع فواتير,-80,2024-01-07,فاتورة,فاشلة,\n";
        let parsed = parse_transactions(csv.as_bytes()).unwrap();
        assert_eq!(parsed.skipped, 0);
        let txs = parsed.rows;
        assert_eq!(txs[0].transaction_type, TransactionType::Deposit);
        assert_eq!(txs[0].status, TransactionStatus::Success);
        assert_eq!(txs[1].transaction_type, TransactionType::Transfer);
        assert_eq!(txs[1].status, TransactionStatus::Pending);
        assert_eq!(txs[1].recipient_account_id, Some(2));
        assert_eq!(txs[2].transaction_type, TransactionType::BillPayment);
        assert_eq!(txs[2].amount, 80.0);
        assert_eq!(txs[2].status, TransactionStatus::Failed);
    }

    #[test]
    fn test_import_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("customers.csv"),
            "customer_id,first_name,last_name\n5,Sara,Khan\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("accounts.csv"),
            "account_id,customer_id,account_type,balance,currency,status\n50,5,Savings,900,USD,Active\n",
        )
        .unwrap();
        // transactions.csv deliberately absent

        let db = Database::in_memory().unwrap();
        let stats = import_directory(&db, dir.path()).unwrap();
        assert_eq!(
            stats,
            ImportStats {
                customers: 1,
                accounts: 1,
                transactions: 0,
                skipped: 0
            }
        );
        assert_eq!(db.get_customer(5).unwrap().unwrap().first_name, "Sara");
        assert_eq!(db.list_accounts(5).unwrap()[0].balance, 900.0);
    }

    #[test]
    fn test_import_directory_rejects_missing_dir() {
        let db = Database::in_memory().unwrap();
        let result = import_directory(&db, Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_seed_demo_data() {
        let db = Database::in_memory().unwrap();
        let stats = seed_demo_data(&db).unwrap();
        assert_eq!(stats.accounts, 3);
        assert_eq!(stats.transactions, 74);

        let accounts = db.list_accounts(DEMO_CUSTOMER_ID).unwrap();
        assert_eq!(accounts.len(), 3);
        let history = db
            .monthly_spending(DEMO_CUSTOMER_ID, &CurrencyConverter::default())
            .unwrap();
        assert_eq!(history.len(), 12);
        assert_eq!(history[0].month, "2024-01");
        // rent + electric + internet + groceries
        assert_eq!(history[0].amount, 2_500.0 + 155.0 + 80.0 + 420.0);

        // Seeding twice replaces rather than duplicates
        seed_demo_data(&db).unwrap();
        assert_eq!(db.dashboard_stats().unwrap().transactions, 74);
    }
}
