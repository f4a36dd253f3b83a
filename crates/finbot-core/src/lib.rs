//! FinBot Core Library
//!
//! Shared functionality for the FinBot financial assistant:
//! - Database access and migrations (customers, accounts, transactions)
//! - CSV import of the bank dataset and demo seeding
//! - Naive Bayes intent classifier and financial scope filter
//! - Spending forecasts, anomaly / fraud heuristics, health score
//! - Bilingual (English / Arabic) response templates
//! - Pluggable LLM backends (Gemini, mock) with a response cache
//! - Per-customer session profiles
//! - `FinancialAssistant`, which ties the above into one chat pipeline

pub mod ai;
pub mod anomaly;
pub mod assistant;
pub mod classifier;
pub mod config;
pub mod context;
pub mod currency;
pub mod db;
pub mod error;
pub mod forecast;
pub mod health;
pub mod import;
pub mod keywords;
pub mod models;
pub mod responses;
pub mod session;

/// Test utilities including mock Gemini server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, GeminiBackend, MockBackend, ResponseCache};
pub use anomaly::{Anomaly, SecurityAlert, Severity};
pub use assistant::{
    ActivityScan, ChatReply, FinancialAssistant, ForecastOutcome, FILTER_MODEL, LOCAL_MODEL,
};
pub use classifier::{Classification, Intent, IntentClassifier};
pub use config::{AssistantConfig, LlmConfig};
pub use context::FinancialContext;
pub use currency::{format_amount, CurrencyConverter};
pub use db::Database;
pub use error::{Error, Result};
pub use forecast::{LinearTrend, SpendingForecast};
pub use health::{HealthReport, HealthStatus};
pub use import::{import_directory, seed_demo_data, ImportStats};
pub use keywords::{detect_language, ScopeDecision, ScopeFilter};
pub use models::{Account, Customer, Language, Transaction, TransactionStatus, TransactionType};
pub use session::{SessionStore, UserProfile};
