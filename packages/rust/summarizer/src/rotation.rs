//! Model rotation across accepted summaries.

use summarybook_shared::{Result, SummaryBookError};

/// Cycles through a fixed model list, advancing after every `per_model`
/// accepted summaries. Owned by the caller for the lifetime of one run.
#[derive(Debug, Clone)]
pub struct ModelRotator {
    models: Vec<String>,
    per_model: u32,
    index: usize,
    accepted: u32,
}

impl ModelRotator {
    /// Create a rotator starting at the first model.
    pub fn new(models: Vec<String>, per_model: u32) -> Result<Self> {
        if models.is_empty() {
            return Err(SummaryBookError::config("at least one model must be configured"));
        }
        if per_model == 0 {
            return Err(SummaryBookError::config("summaries_per_model must be at least 1"));
        }
        Ok(Self {
            models,
            per_model,
            index: 0,
            accepted: 0,
        })
    }

    /// The model to use for the next request.
    pub fn current(&self) -> &str {
        &self.models[self.index]
    }

    /// Record one accepted summary, switching model when the quota is reached.
    pub fn record_accepted(&mut self) {
        self.accepted += 1;
        if self.accepted >= self.per_model {
            self.index = (self.index + 1) % self.models.len();
            self.accepted = 0;
            tracing::debug!(model = %self.current(), "rotated to next model");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rotates_after_each_summary_by_default() {
        let mut rotator = ModelRotator::new(models(&["a", "b", "c"]), 1).unwrap();
        assert_eq!(rotator.current(), "a");
        rotator.record_accepted();
        assert_eq!(rotator.current(), "b");
        rotator.record_accepted();
        assert_eq!(rotator.current(), "c");
        rotator.record_accepted();
        assert_eq!(rotator.current(), "a");
    }

    #[test]
    fn honors_per_model_quota() {
        let mut rotator = ModelRotator::new(models(&["a", "b"]), 2).unwrap();
        rotator.record_accepted();
        assert_eq!(rotator.current(), "a");
        rotator.record_accepted();
        assert_eq!(rotator.current(), "b");
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert!(ModelRotator::new(vec![], 1).is_err());
        assert!(ModelRotator::new(models(&["a"]), 0).is_err());
    }
}
