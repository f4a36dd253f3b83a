//! Per-customer conversation state
//!
//! Profiles live in memory only: they are created on the first message and
//! lost on restart. History is trimmed to the configured length; there is no
//! other eviction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::classifier::Intent;
use crate::forecast::LinearTrend;

/// Words that ask to expand on the previous answer
const FOLLOW_UP_WORDS: &[&str] = &["more", "details", "detail", "المزيد", "تفاصيل"];

/// Whether a message asks to continue the previous topic
pub fn is_follow_up(text: &str) -> bool {
    let lowered = text.to_lowercase();
    FOLLOW_UP_WORDS.iter().any(|w| lowered.contains(w))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
    pub intent: Option<Intent>,
    pub at: DateTime<Utc>,
}

/// One question and its answer
#[derive(Debug, Clone)]
pub struct Turn {
    pub message: String,
    pub reply: String,
    pub intent: Intent,
}

/// What we remember about a customer between messages
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub interaction_count: u64,
    /// How often each intent was asked (behavior tags)
    pub intent_counts: HashMap<Intent, u64>,
    /// Oldest first, bounded
    pub history: Vec<HistoryEntry>,
    pub last_intent: Option<Intent>,
    /// Most recently fitted spending trend
    pub spending_model: Option<LinearTrend>,
    pub first_seen: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl UserProfile {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            interaction_count: 0,
            intent_counts: HashMap::new(),
            history: Vec::new(),
            last_intent: None,
            spending_model: None,
            first_seen: now,
            last_activity: now,
        }
    }

    fn add_turn(&mut self, turn: Turn, history_limit: usize) {
        let now = Utc::now();
        self.interaction_count += 1;
        *self.intent_counts.entry(turn.intent).or_insert(0) += 1;
        self.last_intent = Some(turn.intent);
        self.last_activity = now;

        self.history.push(HistoryEntry {
            role: Role::User,
            text: turn.message,
            intent: Some(turn.intent),
            at: now,
        });
        self.history.push(HistoryEntry {
            role: Role::Assistant,
            text: turn.reply,
            intent: None,
            at: now,
        });
        // Keep most recent
        if self.history.len() > history_limit {
            let excess = self.history.len() - history_limit;
            self.history.drain(..excess);
        }
    }

    /// Most frequently asked intents, most frequent first
    pub fn top_intents(&self, n: usize) -> Vec<(Intent, u64)> {
        let mut counts: Vec<(Intent, u64)> =
            self.intent_counts.iter().map(|(i, c)| (*i, *c)).collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        counts.truncate(n);
        counts
    }
}

/// In-memory profile store shared by all requests
#[derive(Debug)]
pub struct SessionStore {
    profiles: RwLock<HashMap<i64, UserProfile>>,
    history_limit: usize,
}

impl SessionStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
            history_limit,
        }
    }

    /// Record a completed exchange, creating the profile if needed
    pub async fn record(&self, customer_id: i64, turn: Turn) {
        let mut profiles = self.profiles.write().await;
        profiles
            .entry(customer_id)
            .or_insert_with(UserProfile::new)
            .add_turn(turn, self.history_limit);
    }

    pub async fn last_intent(&self, customer_id: i64) -> Option<Intent> {
        let profiles = self.profiles.read().await;
        profiles.get(&customer_id).and_then(|p| p.last_intent)
    }

    pub async fn set_spending_model(&self, customer_id: i64, trend: LinearTrend) {
        let mut profiles = self.profiles.write().await;
        profiles
            .entry(customer_id)
            .or_insert_with(UserProfile::new)
            .spending_model = Some(trend);
    }

    /// Snapshot of a customer's profile
    pub async fn profile(&self, customer_id: i64) -> Option<UserProfile> {
        let profiles = self.profiles.read().await;
        profiles.get(&customer_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(message: &str, intent: Intent) -> Turn {
        Turn {
            message: message.to_string(),
            reply: format!("reply to {}", message),
            intent,
        }
    }

    #[test]
    fn test_is_follow_up() {
        assert!(is_follow_up("tell me MORE"));
        assert!(is_follow_up("more details please"));
        assert!(is_follow_up("أريد المزيد"));
        assert!(!is_follow_up("what's my balance"));
    }

    #[tokio::test]
    async fn test_record_creates_profile_and_counts() {
        let store = SessionStore::new(20);
        assert!(store.is_empty().await);
        assert_eq!(store.last_intent(1).await, None);

        store.record(1, turn("balance?", Intent::Balance)).await;
        store.record(1, turn("balance again", Intent::Balance)).await;
        store.record(1, turn("forecast", Intent::Prediction)).await;

        let profile = store.profile(1).await.unwrap();
        assert_eq!(profile.interaction_count, 3);
        assert_eq!(profile.intent_counts[&Intent::Balance], 2);
        assert_eq!(profile.last_intent, Some(Intent::Prediction));
        assert_eq!(profile.history.len(), 6);
        assert_eq!(profile.history[0].role, Role::User);
        assert_eq!(profile.history[1].role, Role::Assistant);
        assert_eq!(profile.top_intents(1), vec![(Intent::Balance, 2)]);
        assert_eq!(store.last_intent(1).await, Some(Intent::Prediction));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_history_is_truncated_keeping_newest() {
        let store = SessionStore::new(4);
        for i in 0..5 {
            store.record(7, turn(&format!("q{}", i), Intent::General)).await;
        }
        let profile = store.profile(7).await.unwrap();
        assert_eq!(profile.history.len(), 4);
        assert_eq!(profile.history[0].text, "q3");
        assert_eq!(profile.history[3].text, "reply to q4");
        assert_eq!(profile.interaction_count, 5);
    }

    #[tokio::test]
    async fn test_spending_model_stored() {
        let store = SessionStore::default();
        let trend = LinearTrend {
            slope: 12.5,
            intercept: 300.0,
        };
        store.set_spending_model(3, trend).await;
        assert_eq!(store.profile(3).await.unwrap().spending_model, Some(trend));
    }
}
