//! Spending forecast
//!
//! Fits an ordinary least squares line through monthly spending (amount
//! against month index) and extrapolates the next few months.

use chrono::{Months, NaiveDate};
use serde::Serialize;

use crate::models::MonthlyAmount;

/// A fitted line `amount = slope * index + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearTrend {
    /// Least squares fit of `values[i]` against `i`
    ///
    /// Returns `None` for fewer than two points.
    pub fn fit(values: &[f64]) -> Option<Self> {
        let n = values.len();
        if n < 2 {
            return None;
        }
        let n_f = n as f64;
        let mean_x = (n_f - 1.0) / 2.0;
        let mean_y = values.iter().sum::<f64>() / n_f;

        let (mut sxy, mut sxx) = (0.0, 0.0);
        for (i, y) in values.iter().enumerate() {
            let dx = i as f64 - mean_x;
            sxy += dx * (y - mean_y);
            sxx += dx * dx;
        }
        if sxx == 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, index: f64) -> f64 {
        self.slope * index + self.intercept
    }
}

/// Predicted spending for one future month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthForecast {
    /// "YYYY-MM"
    pub month: String,
    pub amount: f64,
    /// 0.5-1.0, decreasing with distance
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpendingForecast {
    pub trend: LinearTrend,
    pub predictions: Vec<MonthForecast>,
    /// Points the trend was fitted on
    pub observed: usize,
}

impl SpendingForecast {
    pub fn is_increasing(&self) -> bool {
        self.trend.slope > 0.0
    }
}

/// Forecast the next `horizon` months from an oldest-first history
///
/// Returns `None` when fewer than `min_points` months are available.
pub fn forecast_spending(
    history: &[MonthlyAmount],
    horizon: usize,
    min_points: usize,
) -> Option<SpendingForecast> {
    if history.len() < min_points.max(2) {
        return None;
    }
    let values: Vec<f64> = history.iter().map(|m| m.amount).collect();
    let trend = LinearTrend::fit(&values)?;
    let n = values.len();
    let last_month = history.last().and_then(|m| parse_month(&m.month));

    let predictions = (1..=horizon)
        .map(|i| {
            // Index n is the first month after the history
            let index = (n + i - 1) as f64;
            MonthForecast {
                month: label_month(last_month, i),
                amount: trend.predict(index).max(0.0),
                confidence: (1.0 - i as f64 * 0.1).max(0.5),
            }
        })
        .collect();

    Some(SpendingForecast {
        trend,
        predictions,
        observed: n,
    })
}

/// Spending risk on a 0-100 scale from volatility and trend
pub fn risk_score(values: &[f64]) -> f64 {
    let std = std_dev(values);
    let slope = LinearTrend::fit(values).map(|t| t.slope).unwrap_or(0.0);
    let score = 50.0 + (std / 100.0).min(30.0) + (-slope * 10.0).max(-20.0);
    score.clamp(0.0, 100.0)
}

/// Population standard deviation (0 for an empty slice)
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

fn parse_month(month: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d").ok()
}

fn label_month(last: Option<NaiveDate>, ahead: usize) -> String {
    match last.and_then(|d| d.checked_add_months(Months::new(ahead as u32))) {
        Some(date) => date.format("%Y-%m").to_string(),
        None => format!("+{} month", ahead),
    }
}
