//! Response templates
//!
//! Turn query results into the text shown to the user. Every template takes
//! the reply language; amounts use `format_amount` (thousands separators,
//! two decimals).

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::anomaly::Anomaly;
use crate::currency::format_amount;
use crate::forecast::SpendingForecast;
use crate::health::HealthReport;
use crate::models::{Account, Customer, Language, MonthlyTrend, Transaction, TypeSummary};

/// Transactions shown in a listing
const LIST_LIMIT: usize = 10;
/// Width of the longest bar in the spending chart
const BAR_WIDTH: usize = 20;

static DOLLAR_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+(?:\.\d{2})?)").expect("valid regex"));
static NUMERIC_DOLLARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+(?:\.\d{2})?)\s*dollars?\b").expect("valid regex"));
static WORD_DOLLARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(one|two|three|four|five|six|seven|eight|nine|ten|twenty|thirty|forty|fifty|hundred|thousand)\s+dollars?\b",
    )
    .expect("valid regex")
});
static RECIPIENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:send to|to)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)").expect("valid regex")
});

fn pick(lang: Language, english: &'static str, arabic: &'static str) -> &'static str {
    match lang {
        Language::English => english,
        Language::Arabic => arabic,
    }
}

fn usd(amount: f64) -> String {
    format!("${}", format_amount(amount))
}

/// Reply for messages outside the financial domain
pub fn rejection(lang: Language) -> String {
    pick(
        lang,
        "I'm a financial assistant and can only help with banking and money questions: \
         balances, transactions, spending, budgeting, savings and fraud checks. \
         What would you like to know about your finances?",
        "أنا مساعد مالي ويمكنني فقط المساعدة في الأسئلة المصرفية والمالية: \
         الأرصدة والمعاملات والإنفاق والميزانية والادخار وكشف الاحتيال. \
         ماذا تريد أن تعرف عن أموالك؟",
    )
    .to_string()
}

/// Reply when there is too little history for an analysis
pub fn not_enough_data(lang: Language, have: usize, need: usize) -> String {
    match lang {
        Language::English => format!(
            "Not enough data yet: I need at least {} months of spending history and have {}.",
            need, have
        ),
        Language::Arabic => format!(
            "لا توجد بيانات كافية بعد: أحتاج إلى {} أشهر على الأقل من سجل الإنفاق ولدي {}.",
            need, have
        ),
    }
}

/// Accounts with native balances plus the USD total
pub fn balance_summary(lang: Language, accounts: &[Account], total_usd: f64) -> String {
    if accounts.is_empty() {
        return pick(lang, "You have no active accounts.", "ليس لديك حسابات نشطة.").to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", pick(lang, "Your account balances:", "أرصدة حساباتك:"));
    for account in accounts {
        let _ = writeln!(
            out,
            "- {} #{}: {} {}",
            account.account_type.label(lang),
            account.account_id,
            format_amount(account.balance),
            account.currency
        );
    }
    let _ = write!(
        out,
        "{} {}",
        pick(lang, "Total (USD):", "الإجمالي (دولار):"),
        usd(total_usd)
    );
    out
}

/// The most recent transactions, newest first
pub fn transaction_list(lang: Language, transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return pick(lang, "No transactions found.", "لم يتم العثور على معاملات.").to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        pick(lang, "Your recent transactions:", "معاملاتك الأخيرة:")
    );
    for tx in transactions.iter().take(LIST_LIMIT) {
        let sign = if tx.transaction_type.is_income() { "+" } else { "-" };
        let _ = writeln!(
            out,
            "- {} | {} | {}{} {} | {} ({})",
            tx.transaction_date.format("%Y-%m-%d"),
            tx.transaction_type.label(lang),
            sign,
            format_amount(tx.amount),
            tx.currency.as_deref().unwrap_or("USD"),
            tx.description,
            tx.status
        );
    }
    if transactions.len() > LIST_LIMIT {
        let _ = write!(
            out,
            "{}",
            match lang {
                Language::English => format!("...and {} more", transactions.len() - LIST_LIMIT),
                Language::Arabic => format!("...و {} أخرى", transactions.len() - LIST_LIMIT),
            }
        );
    }
    out.trim_end().to_string()
}

/// Expense totals per transaction type with a text bar chart
///
/// Deposits and transfers are not spending; income is reported on its own line.
pub fn spending_breakdown(lang: Language, summaries: &[TypeSummary]) -> String {
    let mut totals: BTreeMap<_, (f64, i64)> = BTreeMap::new();
    let mut income = 0.0;
    for s in summaries {
        if s.transaction_type.is_income() {
            income += s.total;
        }
        if !s.transaction_type.is_expense() {
            continue;
        }
        let entry = totals.entry(s.transaction_type).or_insert((0.0, 0));
        entry.0 += s.total;
        entry.1 += s.count;
    }
    if totals.is_empty() {
        return pick(
            lang,
            "No completed spending to analyze yet.",
            "لا توجد مصروفات مكتملة لتحليلها بعد.",
        )
        .to_string();
    }

    let mut rows: Vec<_> = totals.into_iter().collect();
    rows.sort_by(|a, b| b.1 .0.total_cmp(&a.1 .0));
    let max = rows.first().map(|r| r.1 .0).unwrap_or(0.0);
    let months = summaries
        .iter()
        .map(|s| s.month.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        match lang {
            Language::English => format!("Spending breakdown ({} months):", months),
            Language::Arabic => format!("تحليل الإنفاق ({} أشهر):", months),
        }
    );
    for (kind, (total, count)) in &rows {
        let bar_len = if max > 0.0 {
            ((total / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let _ = writeln!(
            out,
            "{:<14} {:<20} {} ({} {})",
            kind.label(lang),
            "█".repeat(bar_len.max(1)),
            usd(*total),
            count,
            pick(lang, "transactions", "معاملة")
        );
    }
    if income > 0.0 {
        let _ = writeln!(out, "{} {}", pick(lang, "Income:", "الدخل:"), usd(income));
    }
    let spending: f64 = rows.iter().map(|(_, (t, _))| t).sum();
    let _ = write!(
        out,
        "{} {}",
        pick(lang, "Total spending:", "إجمالي الإنفاق:"),
        usd(spending)
    );
    out
}

/// Forecast table with trend direction and risk
pub fn prediction_table(lang: Language, forecast: &SpendingForecast, risk: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        match lang {
            Language::English => format!(
                "Spending forecast (based on {} months):",
                forecast.observed
            ),
            Language::Arabic => format!("توقعات الإنفاق (بناءً على {} أشهر):", forecast.observed),
        }
    );
    for p in &forecast.predictions {
        let _ = writeln!(
            out,
            "- {}: {} ({:.0}% {})",
            p.month,
            usd(p.amount),
            p.confidence * 100.0,
            pick(lang, "confidence", "ثقة")
        );
    }
    let trend = if forecast.is_increasing() {
        pick(lang, "increasing", "متزايد")
    } else {
        pick(lang, "stable or decreasing", "مستقر أو متناقص")
    };
    let _ = writeln!(
        out,
        "{} {} ({}{}/{})",
        pick(lang, "Trend:", "الاتجاه:"),
        trend,
        if forecast.trend.slope >= 0.0 { "+" } else { "-" },
        usd(forecast.trend.slope.abs()),
        pick(lang, "month", "شهر")
    );
    let _ = write!(
        out,
        "{} {:.0}/100",
        pick(lang, "Spending risk score:", "مؤشر مخاطر الإنفاق:"),
        risk
    );
    out
}

/// Health score with the factors behind it
pub fn health_assessment(lang: Language, report: &HealthReport) -> String {
    let mut out = String::new();
    let status = match lang {
        Language::English => report.status.as_str(),
        Language::Arabic => report.status.arabic(),
    };
    let _ = writeln!(
        out,
        "{} {:.0}/100 ({})",
        pick(lang, "Financial health score:", "مؤشر الصحة المالية:"),
        report.score,
        status
    );
    for factor in &report.factors {
        let _ = writeln!(out, "- {}: {:+.0}", factor.label, factor.points);
    }
    let _ = write!(
        out,
        "{} {:.1}%",
        pick(lang, "Failed transaction rate:", "نسبة المعاملات الفاشلة:"),
        report.failure_rate * 100.0
    );
    out
}

/// Flagged transactions, highest score first
pub fn anomaly_report(lang: Language, anomalies: &[Anomaly]) -> String {
    if anomalies.is_empty() {
        return pick(
            lang,
            "No unusual transactions detected. Your activity looks normal.",
            "لم يتم اكتشاف معاملات غير عادية. نشاطك يبدو طبيعياً.",
        )
        .to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        match lang {
            Language::English => format!("{} unusual transactions found:", anomalies.len()),
            Language::Arabic => format!("تم العثور على {} معاملات غير عادية:", anomalies.len()),
        }
    );
    for a in anomalies {
        let tx = &a.transaction;
        let _ = writeln!(
            out,
            "- [{}] {} {} {} {} ({} {}, z={:.1})",
            a.severity.as_str().to_uppercase(),
            tx.transaction_date.format("%Y-%m-%d"),
            tx.transaction_type.label(lang),
            usd(tx.amount),
            tx.description,
            pick(lang, "typical", "المعتاد"),
            usd(a.type_mean),
            a.z_score
        );
    }
    let _ = write!(
        out,
        "{}",
        pick(
            lang,
            "If you don't recognize any of these, contact your bank.",
            "إذا لم تتعرف على أي منها، تواصل مع البنك.",
        )
    );
    out
}

/// Suggestions derived from the customer's numbers
pub fn recommendations(
    lang: Language,
    health: &HealthReport,
    trends: &[MonthlyTrend],
    total_usd: f64,
) -> String {
    let mut tips: Vec<String> = Vec::new();

    if total_usd < 10_000.0 {
        tips.push(
            pick(
                lang,
                "Build an emergency fund covering three to six months of expenses.",
                "ابنِ صندوق طوارئ يغطي نفقات ثلاثة إلى ستة أشهر.",
            )
            .to_string(),
        );
    }
    if let [current, previous, ..] = trends {
        if previous.spending() > 0.0 && current.spending() > previous.spending() {
            let rise = (current.spending() / previous.spending() - 1.0) * 100.0;
            tips.push(match lang {
                Language::English => format!(
                    "Spending rose {:.0}% in {} compared to {}. Review discretionary purchases.",
                    rise, current.month, previous.month
                ),
                Language::Arabic => format!(
                    "ارتفع إنفاقك بنسبة {:.0}% في {} مقارنة بـ {}. راجع المشتريات غير الضرورية.",
                    rise, current.month, previous.month
                ),
            });
        }
    }
    if let Some(latest) = trends.first() {
        let surplus = latest.deposits - latest.spending();
        if surplus > 0.0 {
            tips.push(match lang {
                Language::English => format!(
                    "You kept {} of last month's income. Consider moving 20% of it into savings or investments.",
                    usd(surplus)
                ),
                Language::Arabic => format!(
                    "وفرت {} من دخل الشهر الماضي. فكر في تحويل 20% منها إلى الادخار أو الاستثمار.",
                    usd(surplus)
                ),
            });
        }
    }
    if health.failure_rate > 0.1 {
        tips.push(
            pick(
                lang,
                "Several transactions failed. Check balances before scheduled payments.",
                "فشلت عدة معاملات. تحقق من رصيدك قبل المدفوعات المجدولة.",
            )
            .to_string(),
        );
    }
    tips.push(
        pick(
            lang,
            "Automate a fixed monthly transfer to savings right after payday.",
            "اجعل تحويلاً شهرياً ثابتاً إلى الادخار تلقائياً بعد استلام الراتب.",
        )
        .to_string(),
    );

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        pick(lang, "Recommendations for you:", "توصيات لك:")
    );
    for (i, tip) in tips.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, tip);
    }
    out.trim_end().to_string()
}

/// Latest month against the one before
pub fn comparison(lang: Language, trends: &[MonthlyTrend]) -> String {
    let [current, previous, ..] = trends else {
        return not_enough_data(lang, trends.len(), 2);
    };

    let change = |now: f64, before: f64| -> String {
        if before == 0.0 {
            "n/a".to_string()
        } else {
            format!("{:+.1}%", (now / before - 1.0) * 100.0)
        }
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} vs {}:",
        pick(lang, "Month-over-month", "مقارنة شهرية"),
        current.month,
        previous.month
    );
    let rows = [
        (pick(lang, "Spending", "الإنفاق"), current.spending(), previous.spending()),
        (pick(lang, "Withdrawals", "السحوبات"), current.withdrawals, previous.withdrawals),
        (pick(lang, "Bill payments", "الفواتير"), current.bills, previous.bills),
        (pick(lang, "Transfers", "التحويلات"), current.transfers, previous.transfers),
        (pick(lang, "Deposits", "الإيداعات"), current.deposits, previous.deposits),
    ];
    for (label, now, before) in rows {
        let _ = writeln!(
            out,
            "- {}: {} vs {} ({})",
            label,
            usd(now),
            usd(before),
            change(now, before)
        );
    }
    out.trim_end().to_string()
}

/// Amount and recipient pulled from a transfer request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferRequest {
    pub amount: Option<f64>,
    pub recipient: Option<String>,
}

/// Extract a transfer amount and recipient from free text
pub fn parse_transfer(text: &str) -> TransferRequest {
    let amount = DOLLAR_AMOUNT
        .captures(text)
        .or_else(|| NUMERIC_DOLLARS.captures(text))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .or_else(|| {
            WORD_DOLLARS
                .captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| number_word(&m.as_str().to_lowercase()))
        });
    let recipient = RECIPIENT
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    TransferRequest { amount, recipient }
}

fn number_word(word: &str) -> Option<f64> {
    let value = match word {
        "one" => 1.0,
        "two" => 2.0,
        "three" => 3.0,
        "four" => 4.0,
        "five" => 5.0,
        "six" => 6.0,
        "seven" => 7.0,
        "eight" => 8.0,
        "nine" => 9.0,
        "ten" => 10.0,
        "twenty" => 20.0,
        "thirty" => 30.0,
        "forty" => 40.0,
        "fifty" => 50.0,
        "hundred" => 100.0,
        "thousand" => 1000.0,
        _ => return None,
    };
    Some(value)
}

/// Acknowledge a transfer request; nothing is executed
pub fn transfer_acknowledgement(lang: Language, request: &TransferRequest) -> String {
    match (request.amount, request.recipient.as_deref()) {
        (Some(amount), Some(recipient)) => match lang {
            Language::English => format!(
                "Transfer request noted: {} to {}. This is a demo assistant, so no money has been moved. \
                 Please complete transfers in your banking app.",
                usd(amount),
                recipient
            ),
            Language::Arabic => format!(
                "تم تسجيل طلب التحويل: {} إلى {}. هذا مساعد تجريبي ولم يتم تحويل أي أموال. \
                 يرجى إتمام التحويلات من تطبيق البنك.",
                usd(amount),
                recipient
            ),
        },
        _ => pick(
            lang,
            "To prepare a transfer, tell me the amount and the recipient, \
             for example: \"send $50 to John Smith\". No money is moved by this assistant.",
            "لإعداد تحويل، أخبرني بالمبلغ والمستلم، مثلاً: \"حول 50$ إلى أحمد\". \
             لا يقوم هذا المساعد بتحويل أي أموال.",
        )
        .to_string(),
    }
}

/// What the assistant can do
pub fn help(lang: Language) -> String {
    pick(
        lang,
        "I can help you with:\n\
         - Balances: \"What's my balance?\"\n\
         - Transactions: \"Show my recent transactions\"\n\
         - Spending analysis: \"Analyze my spending\"\n\
         - Forecasts: \"Predict my spending\"\n\
         - Financial health: \"How healthy are my finances?\"\n\
         - Fraud checks: \"Any suspicious transactions?\"\n\
         - Advice: \"Give me saving tips\"\n\
         - Comparisons: \"Compare my spending with last month\"\n\
         - Reports: \"Give me a full financial report\"",
        "يمكنني مساعدتك في:\n\
         - الأرصدة: \"كم رصيدي؟\"\n\
         - المعاملات: \"اعرض معاملاتي\"\n\
         - تحليل الإنفاق: \"تحليل الإنفاق\"\n\
         - التوقعات: \"توقع الإنفاق\"\n\
         - الصحة المالية: \"الصحة المالية\"\n\
         - كشف الاحتيال: \"معاملات مشبوهة\"\n\
         - النصائح: \"نصائح مالية\"\n\
         - المقارنات: \"مقارنة الإنفاق\"\n\
         - التقارير: \"تقرير مالي\"",
    )
    .to_string()
}

/// Reply for accepted messages no handler matches
pub fn general(lang: Language, customer: Option<&Customer>) -> String {
    let name = customer.map(|c| c.first_name.as_str()).unwrap_or("");
    match lang {
        Language::English => format!(
            "Hello{}{}! I can check balances, list transactions, analyze and forecast spending, \
             score your financial health and look for suspicious activity. Type \"help\" for examples.",
            if name.is_empty() { "" } else { " " },
            name
        ),
        Language::Arabic => format!(
            "مرحباً{}{}! يمكنني عرض الأرصدة والمعاملات وتحليل الإنفاق وتوقعه وتقييم صحتك المالية \
             والبحث عن النشاط المشبوه. اكتب \"مساعدة\" للأمثلة.",
            if name.is_empty() { "" } else { " " },
            name
        ),
    }
}

/// Inputs for the comprehensive report
pub struct ReportData<'a> {
    pub customer: Option<&'a Customer>,
    pub accounts: &'a [Account],
    pub total_usd: f64,
    pub health: &'a HealthReport,
    pub trends: &'a [MonthlyTrend],
    pub anomalies: &'a [Anomaly],
    pub forecast: Option<&'a SpendingForecast>,
}

/// Everything at once: balances, health, trend, forecast and flags
pub fn comprehensive_report(lang: Language, data: &ReportData<'_>) -> String {
    let mut sections = Vec::new();

    let title = match (lang, data.customer) {
        (Language::English, Some(c)) => format!("Financial report for {}", c.full_name()),
        (Language::Arabic, Some(c)) => format!("التقرير المالي لـ {}", c.full_name()),
        (_, None) => pick(lang, "Financial report", "التقرير المالي").to_string(),
    };
    sections.push(format!("{}\n{}", title, "=".repeat(title.chars().count())));
    sections.push(balance_summary(lang, data.accounts, data.total_usd));
    sections.push(health_assessment(lang, data.health));
    if data.trends.len() >= 2 {
        sections.push(comparison(lang, data.trends));
    }
    if let Some(forecast) = data.forecast {
        let next = &forecast.predictions;
        if let Some(first) = next.first() {
            sections.push(format!(
                "{} {}: {}",
                pick(lang, "Forecast for", "التوقع لشهر"),
                first.month,
                usd(first.amount)
            ));
        }
    }
    sections.push(anomaly_report(lang, data.anomalies));

    sections.join("\n\n")
}
