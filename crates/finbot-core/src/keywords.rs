//! Scope filter: keeps the assistant on financial topics
//!
//! A message is checked in a fixed order:
//! 1. any non-financial keyword rejects it outright
//! 2. any financial keyword accepts it
//! 3. otherwise the intent classifier's confidence decides
//!
//! Matching is case-insensitive substring matching against the keyword lists
//! of both languages, so mixed-language messages are handled.

use serde::Deserialize;

use crate::classifier::IntentClassifier;
use crate::error::Result;
use crate::models::Language;

/// Embedded keyword lists
const DEFAULT_KEYWORDS: &str = include_str!("../../../config/keywords.toml");

/// Detect the message language from its script
///
/// Arabic if any character falls in one of the Arabic Unicode blocks.
pub fn detect_language(text: &str) -> Language {
    let arabic = text.chars().any(|c| {
        matches!(c as u32,
            0x0600..=0x06FF | 0x0750..=0x077F | 0x08A0..=0x08FF | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF)
    });
    if arabic {
        Language::Arabic
    } else {
        Language::English
    }
}

#[derive(Debug, Deserialize)]
struct KeywordFile {
    #[serde(default)]
    financial: PerLanguage,
    #[serde(default)]
    non_financial: PerLanguage,
}

#[derive(Debug, Default, Deserialize)]
struct PerLanguage {
    #[serde(default)]
    english: Vec<String>,
    #[serde(default)]
    arabic: Vec<String>,
}

impl PerLanguage {
    fn merged(self) -> Vec<String> {
        self.english
            .into_iter()
            .chain(self.arabic)
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// Financial and non-financial keyword lists (both languages)
#[derive(Debug, Clone)]
pub struct KeywordLists {
    financial: Vec<String>,
    non_financial: Vec<String>,
}

impl KeywordLists {
    /// Load the embedded lists
    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_KEYWORDS)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: KeywordFile = toml::from_str(content)?;
        Ok(Self {
            financial: file.financial.merged(),
            non_financial: file.non_financial.merged(),
        })
    }

    /// First financial keyword found in the text
    pub fn financial_match(&self, text: &str) -> Option<&str> {
        find_keyword(&self.financial, text)
    }

    /// First non-financial keyword found in the text
    pub fn non_financial_match(&self, text: &str) -> Option<&str> {
        find_keyword(&self.non_financial, text)
    }
}

fn find_keyword<'a>(keywords: &'a [String], text: &str) -> Option<&'a str> {
    let lowered = text.to_lowercase();
    keywords
        .iter()
        .find(|k| lowered.contains(k.as_str()))
        .map(String::as_str)
}

/// Why a message was accepted
#[derive(Debug, Clone, PartialEq)]
pub enum AcceptReason {
    FinancialKeyword(String),
    /// Classifier confidence at or above the threshold
    Classifier(f64),
}

/// Why a message was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    NonFinancialKeyword(String),
    /// Classifier confidence below the threshold (0 when unclassifiable)
    LowConfidence(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScopeDecision {
    Accepted(AcceptReason),
    Rejected(RejectReason),
}

impl ScopeDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Decides whether a message is within the financial domain
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    keywords: KeywordLists,
    min_confidence: f64,
}

impl ScopeFilter {
    pub fn new(keywords: KeywordLists, min_confidence: f64) -> Self {
        Self {
            keywords,
            min_confidence,
        }
    }

    pub fn check(&self, text: &str, classifier: &IntentClassifier) -> ScopeDecision {
        if let Some(keyword) = self.keywords.non_financial_match(text) {
            return ScopeDecision::Rejected(RejectReason::NonFinancialKeyword(keyword.to_string()));
        }
        if let Some(keyword) = self.keywords.financial_match(text) {
            return ScopeDecision::Accepted(AcceptReason::FinancialKeyword(keyword.to_string()));
        }

        let confidence = classifier.confidence(text);
        if confidence >= self.min_confidence {
            ScopeDecision::Accepted(AcceptReason::Classifier(confidence))
        } else {
            ScopeDecision::Rejected(RejectReason::LowConfidence(confidence))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Intent;

    fn filter() -> ScopeFilter {
        ScopeFilter::new(KeywordLists::embedded().unwrap(), 0.3)
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("What is my balance?"), Language::English);
        assert_eq!(detect_language("ما هو رصيدي"), Language::Arabic);
        assert_eq!(detect_language("balance رصيد"), Language::Arabic);
        assert_eq!(detect_language(""), Language::English);
    }

    #[test]
    fn test_non_financial_keyword_rejects() {
        let classifier = IntentClassifier::new().unwrap();
        let f = filter();
        for text in [
            "What's the weather like today?",
            "Tell me a JOKE",
            "who won the football match",
            "ما هو الطقس اليوم",
        ] {
            assert!(
                matches!(
                    f.check(text, &classifier),
                    ScopeDecision::Rejected(RejectReason::NonFinancialKeyword(_))
                ),
                "expected rejection for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_non_financial_checked_before_financial() {
        // Classifier that would happily accept anything about money
        let classifier =
            IntentClassifier::train(vec![(Intent::Balance, "money movie balance")]).unwrap();
        let decision = filter().check("how much money did that movie make", &classifier);
        assert_eq!(
            decision,
            ScopeDecision::Rejected(RejectReason::NonFinancialKeyword("movie".to_string()))
        );
    }

    #[test]
    fn test_financial_keyword_accepts() {
        let classifier = IntentClassifier::new().unwrap();
        let f = filter();
        assert_eq!(
            f.check("What is my BALANCE?", &classifier),
            ScopeDecision::Accepted(AcceptReason::FinancialKeyword("balance".to_string()))
        );
        assert!(f.check("كم رصيدي", &classifier).is_accepted());
    }

    #[test]
    fn test_classifier_decides_without_keywords() {
        let classifier = IntentClassifier::new().unwrap();
        let f = filter();
        assert!(matches!(
            f.check("what are your features and instructions", &classifier),
            ScopeDecision::Accepted(AcceptReason::Classifier(_))
        ));
        assert_eq!(
            f.check("xyzzy plugh", &classifier),
            ScopeDecision::Rejected(RejectReason::LowConfidence(0.0))
        );
    }
}
