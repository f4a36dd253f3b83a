//! Report command implementations (accounts, transactions, forecast, anomalies, health)

use anyhow::Result;
use finbot_core::{format_amount, FinancialAssistant, ForecastOutcome};

use super::truncate;

pub fn cmd_accounts(assistant: &FinancialAssistant, customer: Option<i64>) -> Result<()> {
    let customer_id = assistant.resolve_customer(customer)?;
    let (accounts, total_usd) = assistant.balances(customer_id)?;

    if accounts.is_empty() {
        println!("No active accounts for customer {}.", customer_id);
        return Ok(());
    }

    println!();
    println!("🏦 Accounts");
    println!("   ─────────────────────────────────────────────");
    for account in &accounts {
        println!(
            "   {:>6}  {:<12} {:>16} {}",
            account.account_id,
            account.account_type.as_str(),
            format_amount(account.balance),
            account.currency
        );
    }
    println!("   ─────────────────────────────────────────────");
    println!("   Total (USD): ${}", format_amount(total_usd));
    println!();

    Ok(())
}

pub fn cmd_transactions(
    assistant: &FinancialAssistant,
    customer: Option<i64>,
    limit: usize,
) -> Result<()> {
    let customer_id = assistant.resolve_customer(customer)?;
    let transactions = assistant.db().recent_transactions(customer_id, limit)?;

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!();
    println!(
        "{:<10} {:<16} {:<12} {:>12}  {:<9} DESCRIPTION",
        "ID", "DATE", "TYPE", "AMOUNT", "STATUS"
    );
    println!("{}", "-".repeat(90));

    for tx in &transactions {
        let sign = if tx.transaction_type.is_income() {
            "+"
        } else {
            "-"
        };
        println!(
            "{:<10} {:<16} {:<12} {:>12}  {:<9} {}",
            tx.transaction_id,
            tx.transaction_date.format("%Y-%m-%d %H:%M").to_string(),
            tx.transaction_type.as_str(),
            format!("{}{}", sign, format_amount(tx.amount)),
            tx.status.as_str(),
            truncate(&tx.description, 30)
        );
    }

    println!();
    println!("Showing {} transactions", transactions.len());
    Ok(())
}

pub async fn cmd_forecast(
    assistant: &FinancialAssistant,
    customer: Option<i64>,
    months: usize,
) -> Result<()> {
    let customer_id = assistant.resolve_customer(customer)?;

    match assistant.forecast(customer_id, months).await? {
        ForecastOutcome::NotEnoughData { have, need } => {
            println!(
                "📉 Not enough history to forecast: {} months of spending, {} needed.",
                have, need
            );
        }
        ForecastOutcome::Ready { forecast, risk } => {
            println!();
            println!("🔮 Spending Forecast");
            println!("   ─────────────────────────────");
            println!("   Based on {} months of history", forecast.observed);
            println!(
                "   Trend: {} (${}/month)",
                if forecast.is_increasing() {
                    "increasing 📈"
                } else {
                    "decreasing 📉"
                },
                format_amount(forecast.trend.slope.abs())
            );
            println!("   Spending risk: {:.0}/100", risk);
            println!();
            for month in &forecast.predictions {
                println!(
                    "   {}  ${:>12}  (confidence {:.0}%)",
                    month.month,
                    format_amount(month.amount),
                    month.confidence * 100.0
                );
            }
            println!();
        }
    }

    Ok(())
}

pub fn cmd_anomalies(assistant: &FinancialAssistant, customer: Option<i64>) -> Result<()> {
    let customer_id = assistant.resolve_customer(customer)?;
    let scan = assistant.scan_activity(customer_id)?;

    println!();
    println!("🔍 Unusual Activity");
    println!("   ─────────────────────────────");

    if scan.anomalies.is_empty() {
        println!("   No unusual transactions found.");
    }
    for anomaly in &scan.anomalies {
        let tx = &anomaly.transaction;
        println!(
            "   [{}] {} {} ${} - {} (z = {:.1}, typical ${})",
            anomaly.severity.as_str(),
            tx.transaction_date.format("%Y-%m-%d"),
            tx.transaction_type,
            format_amount(tx.amount),
            truncate(&tx.description, 30),
            anomaly.z_score,
            format_amount(anomaly.type_mean)
        );
    }

    if !scan.alerts.is_empty() {
        println!();
        println!("   🚨 Security alerts");
        for alert in &scan.alerts {
            println!("   • {}", alert.message);
        }
    }
    println!();

    Ok(())
}

pub fn cmd_health(assistant: &FinancialAssistant, customer: Option<i64>) -> Result<()> {
    let customer_id = assistant.resolve_customer(customer)?;
    let report = assistant.health(customer_id)?;

    println!();
    println!("💪 Financial Health");
    println!("   ─────────────────────────────");
    println!(
        "   Score: {:.0}/100 ({})",
        report.score,
        report.status.as_str()
    );
    for factor in &report.factors {
        println!("   {:+5.0}  {}", factor.points, factor.label);
    }
    println!(
        "   Failed transactions: {:.1}%",
        report.failure_rate * 100.0
    );
    println!();

    Ok(())
}
