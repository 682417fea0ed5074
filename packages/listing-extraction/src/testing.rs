//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the extraction library
//! without making real AI calls.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

use tokio::time::Instant;

use crate::error::{ExtractionError, Result};
use crate::traits::ai::AI;

/// Response returned when the script runs out.
pub const EMPTY_RESPONSE: &str = "[]";

/// A mock AI implementation for testing.
///
/// Answers are scripted: each call pops the next queued response or error,
/// in order. Once the queue is empty every call returns `[]`. Every call is
/// recorded with its prompts and the (tokio) time it was made, so tests can
/// assert on ordering and on the pauses between calls.
#[derive(Default)]
pub struct MockAI {
    /// Scripted answers, consumed front to back
    script: Mutex<VecDeque<Result<String>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockAICall>>>,
}

/// Record of a call made to the mock AI.
#[derive(Debug, Clone)]
pub struct MockAICall {
    pub system_prompt: String,
    pub user_prompt: String,
    pub at: Instant,
}

impl MockAI {
    /// Create a new mock AI with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.push(Ok(response.into()));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: ExtractionError) -> Self {
        self.push(Err(error));
        self
    }

    /// Queue several successful responses.
    pub fn with_responses<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for response in responses {
            self.push(Ok(response.into()));
        }
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockAICall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    /// Responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }

    fn push(&self, answer: Result<String>) {
        self.script.lock().unwrap().push_back(answer);
    }
}

#[async_trait]
impl AI for MockAI {
    async fn extract_structured(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.calls.write().unwrap().push(MockAICall {
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            at: Instant::now(),
        });

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(EMPTY_RESPONSE.to_string()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
