//! Intent classification
//!
//! A multinomial naive Bayes model with Laplace smoothing, trained at startup
//! from the phrase lists in `config/intents.toml`. Tokens that never appeared
//! in training carry no evidence and are ignored; an input with no known
//! tokens has no classification at all.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Embedded intent training phrases
const DEFAULT_INTENTS: &str = include_str!("../../../config/intents.toml");

/// English words that carry no intent signal
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "am", "was", "be", "i", "me", "my", "mine", "of", "to",
    "for", "and", "or", "in", "on", "at", "with", "do", "does", "please", "your", "you",
    "it", "its", "this", "that", "have", "has", "can", "could", "would",
];

/// Classified purpose of a user message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Balance,
    Transactions,
    SpendingAnalysis,
    Prediction,
    FinancialHealth,
    Anomalies,
    Recommendations,
    Comparison,
    Transfer,
    Report,
    Help,
    /// Accepted input the classifier cannot place
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Transactions => "transactions",
            Self::SpendingAnalysis => "spending_analysis",
            Self::Prediction => "prediction",
            Self::FinancialHealth => "financial_health",
            Self::Anomalies => "anomalies",
            Self::Recommendations => "recommendations",
            Self::Comparison => "comparison",
            Self::Transfer => "transfer",
            Self::Report => "report",
            Self::Help => "help",
            Self::General => "general",
        }
    }
}

impl std::str::FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "balance" => Ok(Self::Balance),
            "transactions" => Ok(Self::Transactions),
            "spending_analysis" => Ok(Self::SpendingAnalysis),
            "prediction" => Ok(Self::Prediction),
            "financial_health" => Ok(Self::FinancialHealth),
            "anomalies" => Ok(Self::Anomalies),
            "recommendations" => Ok(Self::Recommendations),
            "comparison" => Ok(Self::Comparison),
            "transfer" => Ok(Self::Transfer),
            "report" => Ok(Self::Report),
            "help" => Ok(Self::Help),
            "general" => Ok(Self::General),
            _ => Err(format!("Unknown intent: {}", s)),
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A label with its posterior probability (0-1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub intent: Intent,
    pub confidence: f64,
}

/// Split text into normalized tokens
///
/// Lowercases, splits on anything that is not a letter or digit (Arabic
/// letters count as letters), drops English stopwords and single characters,
/// and strips a few common English suffixes.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
        .filter(|t| !STOPWORDS.contains(t))
        .map(stem)
        .collect()
}

fn stem(token: &str) -> String {
    if !token.is_ascii() {
        return token.to_string();
    }
    for suffix in ["ing", "ed", "ly"] {
        if let Some(root) = token.strip_suffix(suffix) {
            if root.len() >= 3 {
                return root.to_string();
            }
        }
    }
    if let Some(root) = token.strip_suffix('s') {
        if root.len() >= 3 && !root.ends_with('s') {
            return root.to_string();
        }
    }
    token.to_string()
}

#[derive(Debug, Default)]
struct LabelModel {
    documents: usize,
    token_counts: HashMap<String, usize>,
    total_tokens: usize,
}

/// Multinomial naive Bayes intent classifier
#[derive(Debug)]
pub struct IntentClassifier {
    labels: BTreeMap<Intent, LabelModel>,
    vocabulary: HashSet<String>,
    total_documents: usize,
}

impl IntentClassifier {
    /// Train on the embedded phrase lists
    pub fn new() -> Result<Self> {
        Self::from_toml(DEFAULT_INTENTS)
    }

    /// Train on a TOML table of `label = ["phrase", ...]`
    pub fn from_toml(content: &str) -> Result<Self> {
        let table: BTreeMap<String, Vec<String>> = toml::from_str(content)?;
        let mut examples = Vec::new();
        for (label, phrases) in &table {
            match label.parse::<Intent>() {
                Ok(intent) => {
                    examples.extend(phrases.iter().map(|p| (intent, p.as_str())));
                }
                Err(e) => warn!(label, error = %e, "Skipping unknown intent label"),
            }
        }
        Self::train(examples)
    }

    /// Train from labelled phrases
    pub fn train<'a, I>(examples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Intent, &'a str)>,
    {
        let mut labels: BTreeMap<Intent, LabelModel> = BTreeMap::new();
        let mut vocabulary = HashSet::new();
        let mut total_documents = 0;

        for (intent, phrase) in examples {
            let tokens = tokenize(phrase);
            if tokens.is_empty() {
                continue;
            }
            let model = labels.entry(intent).or_default();
            model.documents += 1;
            for token in tokens {
                model.total_tokens += 1;
                *model.token_counts.entry(token.clone()).or_insert(0) += 1;
                vocabulary.insert(token);
            }
            total_documents += 1;
        }

        if total_documents == 0 {
            return Err(Error::Classifier(
                "Cannot train on an empty example set".to_string(),
            ));
        }

        debug!(
            labels = labels.len(),
            vocabulary = vocabulary.len(),
            documents = total_documents,
            "Trained intent classifier"
        );

        Ok(Self {
            labels,
            vocabulary,
            total_documents,
        })
    }

    /// All labels with their posterior probabilities, highest first
    ///
    /// Empty when no token of the input was seen in training.
    pub fn classifications(&self, text: &str) -> Vec<Classification> {
        let tokens: Vec<String> = tokenize(text)
            .into_iter()
            .filter(|t| self.vocabulary.contains(t))
            .collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let vocab_size = self.vocabulary.len() as f64;
        let log_scores: Vec<(Intent, f64)> = self
            .labels
            .iter()
            .map(|(intent, model)| {
                let prior = (model.documents as f64 / self.total_documents as f64).ln();
                let denominator = model.total_tokens as f64 + vocab_size;
                let likelihood: f64 = tokens
                    .iter()
                    .map(|t| {
                        let count = model.token_counts.get(t).copied().unwrap_or(0) as f64;
                        ((count + 1.0) / denominator).ln()
                    })
                    .sum();
                (*intent, prior + likelihood)
            })
            .collect();

        // Log-sum-exp normalization
        let max = log_scores
            .iter()
            .map(|(_, s)| *s)
            .fold(f64::NEG_INFINITY, f64::max);
        let norm: f64 = log_scores.iter().map(|(_, s)| (s - max).exp()).sum();

        let mut results: Vec<Classification> = log_scores
            .into_iter()
            .map(|(intent, score)| Classification {
                intent,
                confidence: (score - max).exp() / norm,
            })
            .collect();
        results.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.intent.cmp(&b.intent))
        });
        results
    }

    /// Most probable label, or `None` when the input has no known tokens
    pub fn classify(&self, text: &str) -> Option<Classification> {
        self.classifications(text).into_iter().next()
    }

    /// Confidence of the best label (0 when unclassifiable)
    pub fn confidence(&self, text: &str) -> f64 {
        self.classify(text).map(|c| c.confidence).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::new().unwrap()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("What's my SPENDING on Transactions?"),
            vec!["what", "spend", "transaction"]
        );
        assert_eq!(tokenize("كم رصيدي"), vec!["كم", "رصيدي"]);
        assert_eq!(tokenize("monthly expenses"), vec!["month", "expense"]);
        assert!(tokenize("a I ?!").is_empty());
    }

    #[test]
    fn test_classifies_common_intents() {
        let c = classifier();
        assert_eq!(c.classify("show my balance").unwrap().intent, Intent::Balance);
        assert_eq!(
            c.classify("any suspicious transactions?").unwrap().intent,
            Intent::Anomalies
        );
        assert_eq!(
            c.classify("predict my spending for next month").unwrap().intent,
            Intent::Prediction
        );
        assert_eq!(c.classify("كم رصيدي").unwrap().intent, Intent::Balance);
        assert_eq!(c.classify("help me").unwrap().intent, Intent::Help);
    }

    #[test]
    fn test_probabilities_are_normalized() {
        let c = classifier();
        let all = c.classifications("transfer money to a friend");
        let sum: f64 = all.iter().map(|c| c.confidence).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(all.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        assert_eq!(all[0].intent, Intent::Transfer);
    }

    #[test]
    fn test_unknown_tokens_have_no_classification() {
        let c = classifier();
        assert!(c.classify("xyzzy plugh").is_none());
        assert_eq!(c.confidence(""), 0.0);
    }

    #[test]
    fn test_empty_training_set_is_an_error() {
        let empty: Vec<(Intent, &str)> = Vec::new();
        assert!(matches!(
            IntentClassifier::train(empty),
            Err(Error::Classifier(_))
        ));
        assert!(IntentClassifier::from_toml("").is_err());
    }

    #[test]
    fn test_unknown_labels_are_skipped() {
        let c = IntentClassifier::from_toml(
            r#"
            balance = ["show balance"]
            weather = ["is it raining"]
            "#,
        )
        .unwrap();
        assert!(c.classify("raining").is_none());
        assert_eq!(c.classify("balance").unwrap().intent, Intent::Balance);
    }
}
