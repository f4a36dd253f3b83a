//! Mock backend for testing
//!
//! Returns a canned answer (or a configured failure) without any network.
//! Counts calls so tests can observe cache hits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::AIBackend;

/// Mock AI backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Fixed answer; when unset the prompt's last line is echoed back
    pub response: Option<String>,
    /// Whether generate should fail
    pub failing: bool,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self::default()
    }

    /// Mock that always answers with `response`
    pub fn with_response(response: &str) -> Self {
        Self {
            healthy: true,
            response: Some(response.to_string()),
            ..Default::default()
        }
    }

    /// Mock whose generate calls fail
    pub fn failing() -> Self {
        Self {
            healthy: true,
            failing: true,
            ..Default::default()
        }
    }

    /// Number of generate calls so far (shared across clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Error::Llm("mock backend configured to fail".to_string()));
        }
        Ok(self.response.clone().unwrap_or_else(|| {
            let question = prompt.lines().last().unwrap_or_default();
            format!("Mock financial advice for: {}", question)
        }))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_calls_shared_across_clones() {
        let mock = MockBackend::with_response("ok");
        let clone = mock.clone();
        assert_eq!(clone.generate("a").await.unwrap(), "ok");
        assert_eq!(mock.generate("b").await.unwrap(), "ok");
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockBackend::failing();
        assert!(matches!(mock.generate("x").await, Err(Error::Llm(_))));
        assert_eq!(mock.calls(), 1);
    }
}
