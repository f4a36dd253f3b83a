//! Chat orchestration
//!
//! `FinancialAssistant` turns one user message into one reply:
//!
//! 1. Reject empty input
//! 2. Scope filter (financial vs non-financial)
//! 3. LLM answer with the customer's financial context, if a backend is configured
//! 4. Local template answer for the classified intent (also the LLM fallback)
//! 5. Record the exchange in the session store
//!
//! Database calls are made sequentially within a request.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai::{cache_key, AIBackend, AIClient, ResponseCache};
use crate::anomaly::{detect_anomalies, suspicious_activity, Anomaly, SecurityAlert};
use crate::classifier::{Classification, Intent, IntentClassifier};
use crate::config::AssistantConfig;
use crate::context::{build_prompt, FinancialContext, SYSTEM_PROMPT};
use crate::currency::CurrencyConverter;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::forecast::{forecast_spending, risk_score, SpendingForecast};
use crate::health::{health_score, HealthReport};
use crate::keywords::{detect_language, KeywordLists, RejectReason, ScopeDecision, ScopeFilter};
use crate::models::{Account, Language, Transaction};
use crate::responses::{self, ReportData};
use crate::session::{is_follow_up, SessionStore, Turn};

/// Model name reported for template answers
pub const LOCAL_MODEL: &str = "financial-advisor";
/// Model name reported for scope rejections
pub const FILTER_MODEL: &str = "domain-filter";

/// Months of per-type totals used for recommendations
const RECOMMENDATION_MONTHS: usize = 6;

/// One answer to one message
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub text: String,
    /// `None` for rejected messages
    pub intent: Option<Intent>,
    pub confidence: f64,
    pub language: Language,
    pub model: String,
    pub rejected: bool,
}

/// Result of a spending forecast request
#[derive(Debug, Clone)]
pub enum ForecastOutcome {
    Ready {
        forecast: SpendingForecast,
        /// 0-100
        risk: f64,
    },
    NotEnoughData {
        have: usize,
        need: usize,
    },
}

/// Statistical outliers plus rule-based fraud signals
#[derive(Debug, Clone, Default)]
pub struct ActivityScan {
    pub anomalies: Vec<Anomaly>,
    pub alerts: Vec<SecurityAlert>,
}

pub struct FinancialAssistant {
    db: Database,
    config: AssistantConfig,
    classifier: IntentClassifier,
    scope: ScopeFilter,
    converter: CurrencyConverter,
    ai: Option<AIClient>,
    cache: ResponseCache,
    sessions: SessionStore,
}

impl FinancialAssistant {
    /// Build an assistant without an LLM backend
    pub fn new(db: Database, config: AssistantConfig) -> Result<Self> {
        let classifier = IntentClassifier::new()?;
        let scope = ScopeFilter::new(KeywordLists::embedded()?, config.min_confidence);
        let converter = CurrencyConverter::new(config.currency_rates.clone());
        let cache = ResponseCache::new(config.llm.cache_ttl(), config.llm.cache_capacity);
        let sessions = SessionStore::new(config.history_limit);

        Ok(Self {
            db,
            config,
            classifier,
            scope,
            converter,
            ai: None,
            cache,
            sessions,
        })
    }

    /// Attach (or remove) an LLM backend
    pub fn with_ai(mut self, ai: Option<AIClient>) -> Self {
        if let Some(client) = &ai {
            info!(model = %client.model(), host = %client.host(), "LLM backend enabled");
        }
        self.ai = ai;
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    pub fn ai(&self) -> Option<&AIClient> {
        self.ai.as_ref()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// The requested customer if it exists, otherwise the first one in the database
    pub fn resolve_customer(&self, user_id: Option<i64>) -> Result<i64> {
        if let Some(id) = user_id {
            if self.db.get_customer(id)?.is_some() {
                return Ok(id);
            }
            debug!(customer_id = id, "Unknown customer, using default");
        }
        self.db
            .first_customer_id()?
            .ok_or_else(|| Error::NotFound("No customers in database".to_string()))
    }

    /// Answer one message from a customer
    pub async fn respond(&self, customer_id: i64, message: &str) -> Result<ChatReply> {
        let text = message.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("Message cannot be empty".to_string()));
        }
        let language = detect_language(text);
        let last_intent = self.sessions.last_intent(customer_id).await;
        let follow_up = is_follow_up(text) && last_intent.is_some();

        if let ScopeDecision::Rejected(reason) = self.scope.check(text, &self.classifier) {
            // A bare "more details" has no keywords; let it through when there is
            // a topic to continue
            let continues_topic = follow_up && matches!(reason, RejectReason::LowConfidence(_));
            if !continues_topic {
                info!(customer_id, reason = ?reason, "Rejected out-of-scope message");
                let confidence = match reason {
                    RejectReason::LowConfidence(c) => c,
                    RejectReason::NonFinancialKeyword(_) => 0.0,
                };
                return Ok(ChatReply {
                    text: responses::rejection(language),
                    intent: None,
                    confidence,
                    language,
                    model: FILTER_MODEL.to_string(),
                    rejected: true,
                });
            }
        }

        let classification = self.classify(text, if follow_up { last_intent } else { None });
        debug!(
            customer_id,
            intent = %classification.intent,
            confidence = classification.confidence,
            "Classified message"
        );

        let (reply, model) = match &self.ai {
            Some(ai) => match self.ask_llm(ai, customer_id, text, language).await {
                Ok(reply) => (reply, ai.model().to_string()),
                Err(e) => {
                    warn!(error = %e, "LLM request failed, falling back to local responder");
                    let reply = self
                        .answer(customer_id, classification.intent, language, text)
                        .await?;
                    (reply, LOCAL_MODEL.to_string())
                }
            },
            None => {
                let reply = self
                    .answer(customer_id, classification.intent, language, text)
                    .await?;
                (reply, LOCAL_MODEL.to_string())
            }
        };

        self.sessions
            .record(
                customer_id,
                Turn {
                    message: text.to_string(),
                    reply: reply.clone(),
                    intent: classification.intent,
                },
            )
            .await;

        Ok(ChatReply {
            text: reply,
            intent: Some(classification.intent),
            confidence: classification.confidence,
            language,
            model,
            rejected: false,
        })
    }

    /// Best intent; a follow-up keeps the previous intent
    fn classify(&self, text: &str, previous: Option<Intent>) -> Classification {
        let best = self.classifier.classify(text);
        if let Some(intent) = previous {
            return Classification {
                intent,
                confidence: best.map(|c| c.confidence).unwrap_or(0.0),
            };
        }
        best.unwrap_or(Classification {
            intent: Intent::General,
            confidence: 0.0,
        })
    }

    async fn ask_llm(
        &self,
        ai: &AIClient,
        customer_id: i64,
        text: &str,
        language: Language,
    ) -> Result<String> {
        let context = FinancialContext::assemble(
            &self.db,
            customer_id,
            &self.converter,
            self.config.recent_transaction_limit,
        )?;
        let key = cache_key(text, context.total_balance_usd, context.transactions.len());
        if let Some(cached) = self.cache.get(&key) {
            debug!(customer_id, "Answer served from cache");
            return Ok(cached);
        }

        let prompt = build_prompt(SYSTEM_PROMPT, &context, text, language);
        let reply = ai.generate(&prompt).await?;
        self.cache.insert(key, reply.clone());
        Ok(reply)
    }

    /// Template answer for an intent
    pub async fn answer(
        &self,
        customer_id: i64,
        intent: Intent,
        lang: Language,
        text: &str,
    ) -> Result<String> {
        let reply = match intent {
            Intent::Balance => {
                let (accounts, total) = self.balances(customer_id)?;
                responses::balance_summary(lang, &accounts, total)
            }
            Intent::Transactions => {
                responses::transaction_list(lang, &self.recent_transactions(customer_id)?)
            }
            Intent::SpendingAnalysis => {
                let summaries = self.db.spending_by_type(customer_id, &self.converter)?;
                responses::spending_breakdown(lang, &summaries)
            }
            Intent::Prediction => {
                match self
                    .forecast(customer_id, self.config.forecast_horizon)
                    .await?
                {
                    ForecastOutcome::Ready { forecast, risk } => {
                        responses::prediction_table(lang, &forecast, risk)
                    }
                    ForecastOutcome::NotEnoughData { have, need } => {
                        responses::not_enough_data(lang, have, need)
                    }
                }
            }
            Intent::FinancialHealth => {
                responses::health_assessment(lang, &self.health(customer_id)?)
            }
            Intent::Anomalies => {
                let scan = self.scan_activity(customer_id)?;
                let mut out = responses::anomaly_report(lang, &scan.anomalies);
                if !scan.alerts.is_empty() {
                    out.push_str(match lang {
                        Language::English => "\n\nSecurity alerts:",
                        Language::Arabic => "\n\nتنبيهات أمنية:",
                    });
                    for alert in &scan.alerts {
                        out.push_str("\n- ");
                        out.push_str(&alert.message);
                    }
                }
                out
            }
            Intent::Recommendations => {
                let (_, total) = self.balances(customer_id)?;
                let health = self.health(customer_id)?;
                let rates = &self.converter;
                let trends = self.db.monthly_trends(customer_id, RECOMMENDATION_MONTHS, rates)?;
                responses::recommendations(lang, &health, &trends, total)
            }
            Intent::Comparison => {
                let trends = self.db.monthly_trends(customer_id, 2, &self.converter)?;
                responses::comparison(lang, &trends)
            }
            Intent::Transfer => {
                responses::transfer_acknowledgement(lang, &responses::parse_transfer(text))
            }
            Intent::Report => self.report(customer_id, lang).await?,
            Intent::Help => responses::help(lang),
            Intent::General => {
                responses::general(lang, self.db.get_customer(customer_id)?.as_ref())
            }
        };
        Ok(reply)
    }

    /// Active accounts and their USD total
    pub fn balances(&self, customer_id: i64) -> Result<(Vec<Account>, f64)> {
        let accounts = self.db.list_accounts(customer_id)?;
        let total = self.converter.total_in_usd(&accounts);
        Ok((accounts, total))
    }

    /// Newest transactions, up to the configured limit
    pub fn recent_transactions(&self, customer_id: i64) -> Result<Vec<Transaction>> {
        self.db
            .recent_transactions(customer_id, self.config.recent_transaction_limit)
    }

    /// Recent transactions with amounts restated in USD
    fn recent_transactions_usd(&self, customer_id: i64) -> Result<Vec<Transaction>> {
        Ok(self
            .converter
            .transactions_in_usd(&self.recent_transactions(customer_id)?))
    }

    /// Forecast monthly spending `horizon` months ahead
    ///
    /// The fitted trend is remembered in the customer's session profile.
    pub async fn forecast(&self, customer_id: i64, horizon: usize) -> Result<ForecastOutcome> {
        let history = self.db.monthly_spending(customer_id, &self.converter)?;
        let need = self.config.forecast_min_points.max(2);
        let Some(forecast) = forecast_spending(&history, horizon, need) else {
            return Ok(ForecastOutcome::NotEnoughData {
                have: history.len(),
                need,
            });
        };

        let values: Vec<f64> = history.iter().map(|m| m.amount).collect();
        let risk = risk_score(&values);
        self.sessions
            .set_spending_model(customer_id, forecast.trend)
            .await;
        Ok(ForecastOutcome::Ready { forecast, risk })
    }

    pub fn health(&self, customer_id: i64) -> Result<HealthReport> {
        let (_, total) = self.balances(customer_id)?;
        let transactions = self.recent_transactions_usd(customer_id)?;
        Ok(health_score(total, &transactions))
    }

    /// Outliers by z-score and rule-based fraud alerts over recent transactions
    pub fn scan_activity(&self, customer_id: i64) -> Result<ActivityScan> {
        let transactions = self.recent_transactions_usd(customer_id)?;
        Ok(ActivityScan {
            anomalies: detect_anomalies(&transactions, self.config.anomaly_z_threshold),
            alerts: suspicious_activity(&transactions),
        })
    }

    async fn report(&self, customer_id: i64, lang: Language) -> Result<String> {
        let customer = self.db.get_customer(customer_id)?;
        let (accounts, total_usd) = self.balances(customer_id)?;
        let health = self.health(customer_id)?;
        let trends = self.db.monthly_trends(customer_id, 2, &self.converter)?;
        let scan = self.scan_activity(customer_id)?;
        let forecast = match self
            .forecast(customer_id, self.config.forecast_horizon)
            .await?
        {
            ForecastOutcome::Ready { forecast, .. } => Some(forecast),
            ForecastOutcome::NotEnoughData { .. } => None,
        };

        Ok(responses::comprehensive_report(
            lang,
            &ReportData {
                customer: customer.as_ref(),
                accounts: &accounts,
                total_usd,
                health: &health,
                trends: &trends,
                anomalies: &scan.anomalies,
                forecast: forecast.as_ref(),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::import::{seed_demo_data, DEMO_CUSTOMER_ID};

    fn seeded() -> FinancialAssistant {
        let db = Database::in_memory().unwrap();
        seed_demo_data(&db).unwrap();
        FinancialAssistant::new(db, AssistantConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_balance_answer_locally() {
        let assistant = seeded();
        let reply = assistant
            .respond(DEMO_CUSTOMER_ID, "What's my balance?")
            .await
            .unwrap();

        assert!(!reply.rejected);
        assert_eq!(reply.intent, Some(Intent::Balance));
        assert_eq!(reply.model, LOCAL_MODEL);
        assert_eq!(reply.language, Language::English);
        assert!(reply.text.contains("15,250.75"), "{}", reply.text);
        // 15,250.75 USD + 85,000 SAR * 0.267 + 12,000 EUR * 1.18
        assert!(reply.text.contains("$52,105.75"), "{}", reply.text);
    }

    #[tokio::test]
    async fn test_arabic_balance_answer() {
        let assistant = seeded();
        let reply = assistant.respond(DEMO_CUSTOMER_ID, "كم رصيدي").await.unwrap();
        assert_eq!(reply.language, Language::Arabic);
        assert!(reply.text.contains("أرصدة حساباتك"));
    }

    #[tokio::test]
    async fn test_rejects_non_financial() {
        let assistant = seeded();
        let reply = assistant
            .respond(DEMO_CUSTOMER_ID, "Tell me a joke")
            .await
            .unwrap();
        assert!(reply.rejected);
        assert_eq!(reply.intent, None);
        assert_eq!(reply.model, FILTER_MODEL);
        assert_eq!(reply.text, responses::rejection(Language::English));
        // Rejections are not recorded
        assert!(assistant.sessions().profile(DEMO_CUSTOMER_ID).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_message_is_invalid() {
        let assistant = seeded();
        let result = assistant.respond(DEMO_CUSTOMER_ID, "   ").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_prediction_and_follow_up() {
        let assistant = seeded();
        let reply = assistant
            .respond(DEMO_CUSTOMER_ID, "Predict my spending")
            .await
            .unwrap();
        assert_eq!(reply.intent, Some(Intent::Prediction));
        assert!(reply.text.contains("based on 12 months"), "{}", reply.text);

        let profile = assistant.sessions().profile(DEMO_CUSTOMER_ID).await.unwrap();
        assert!(profile.spending_model.is_some());

        let follow_up = assistant
            .respond(DEMO_CUSTOMER_ID, "more details")
            .await
            .unwrap();
        assert!(!follow_up.rejected);
        assert_eq!(follow_up.intent, Some(Intent::Prediction));

        let profile = assistant.sessions().profile(DEMO_CUSTOMER_ID).await.unwrap();
        assert_eq!(profile.interaction_count, 2);
        assert_eq!(profile.history.len(), 4);
    }

    #[tokio::test]
    async fn test_forecast_not_enough_data() {
        let db = Database::in_memory().unwrap();
        seed_demo_data(&db).unwrap();
        let config = AssistantConfig {
            forecast_min_points: 24,
            ..AssistantConfig::default()
        };
        let assistant = FinancialAssistant::new(db, config).unwrap();
        match assistant.forecast(DEMO_CUSTOMER_ID, 3).await.unwrap() {
            ForecastOutcome::NotEnoughData { have, need } => {
                assert_eq!(have, 12);
                assert_eq!(need, 24);
            }
            ForecastOutcome::Ready { .. } => panic!("expected not enough data"),
        }
    }

    #[tokio::test]
    async fn test_transfer_is_acknowledged_only() {
        let assistant = seeded();
        let reply = assistant
            .respond(DEMO_CUSTOMER_ID, "transfer $50 to John Smith")
            .await
            .unwrap();
        assert_eq!(reply.intent, Some(Intent::Transfer));
        assert!(reply.text.contains("$50.00 to John Smith"), "{}", reply.text);
        assert!(reply.text.contains("no money has been moved"));
    }

    #[tokio::test]
    async fn test_scan_flags_large_purchase() {
        let assistant = seeded();
        let scan = assistant.scan_activity(DEMO_CUSTOMER_ID).unwrap();
        assert!(scan
            .anomalies
            .iter()
            .any(|a| a.transaction.description == "Jewelry store purchase"));
    }

    #[tokio::test]
    async fn test_llm_answer_is_cached() {
        let mock = MockBackend::new();
        let assistant = seeded().with_ai(Some(AIClient::Mock(mock.clone())));

        let first = assistant
            .respond(DEMO_CUSTOMER_ID, "What's my balance?")
            .await
            .unwrap();
        assert_eq!(first.model, "mock");
        assert_eq!(
            first.text,
            "Mock financial advice for: User question: What's my balance?"
        );

        let second = assistant
            .respond(DEMO_CUSTOMER_ID, "  what's my BALANCE? ")
            .await
            .unwrap();
        assert_eq!(second.text, first.text);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back_to_templates() {
        let mock = MockBackend::failing();
        let assistant = seeded().with_ai(Some(AIClient::Mock(mock.clone())));

        let reply = assistant
            .respond(DEMO_CUSTOMER_ID, "What's my balance?")
            .await
            .unwrap();
        assert_eq!(mock.calls(), 1);
        assert_eq!(reply.model, LOCAL_MODEL);
        assert!(reply.text.contains("15,250.75"));
    }

    #[tokio::test]
    async fn test_spending_analysis_in_usd_for_foreign_account() {
        use crate::models::{
            Account, AccountStatus, AccountType, Customer, TransactionStatus, TransactionType,
        };

        let db = Database::in_memory().unwrap();
        db.insert_customer(&Customer {
            customer_id: 1,
            first_name: "Layla".into(),
            last_name: "Test".into(),
            email: None,
            phone: None,
            date_of_birth: None,
            gender: None,
            city: None,
            registration_date: None,
        })
        .unwrap();
        db.insert_account(&Account {
            account_id: 7,
            customer_id: 1,
            account_type: AccountType::Savings,
            balance: 3750.0,
            currency: "SAR".into(),
            opening_date: None,
            status: AccountStatus::Active,
        })
        .unwrap();
        db.insert_transaction(&Transaction {
            transaction_id: 1,
            account_id: 7,
            transaction_type: TransactionType::Withdrawal,
            amount: 3750.0,
            transaction_date: crate::db::parse_datetime("2024-03-05 10:00:00").unwrap(),
            description: "Furniture".into(),
            status: TransactionStatus::Success,
            recipient_account_id: None,
            account_type: None,
            currency: None,
        })
        .unwrap();
        let assistant = FinancialAssistant::new(db, AssistantConfig::default()).unwrap();

        let reply = assistant.respond(1, "analyze my spending").await.unwrap();
        assert_eq!(reply.intent, Some(Intent::SpendingAnalysis));
        // 3750 SAR * 0.267
        assert!(reply.text.contains("Total spending: $1,001.25"), "{}", reply.text);
        assert!(!reply.text.contains("$3,750.00"), "{}", reply.text);

        let balance = assistant.respond(1, "What's my balance?").await.unwrap();
        assert!(balance.text.contains("$1,001.25"), "{}", balance.text);
    }

    #[test]
    fn test_resolve_customer() {
        let assistant = seeded();
        assert_eq!(assistant.resolve_customer(Some(DEMO_CUSTOMER_ID)).unwrap(), 1);
        assert_eq!(assistant.resolve_customer(Some(999)).unwrap(), 1);
        assert_eq!(assistant.resolve_customer(None).unwrap(), 1);

        let empty =
            FinancialAssistant::new(Database::in_memory().unwrap(), AssistantConfig::default())
                .unwrap();
        assert!(matches!(empty.resolve_customer(None), Err(Error::NotFound(_))));
    }
}
