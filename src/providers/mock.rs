//! Scripted provider for tests
//!
//! Returns pre-programmed outcomes per model and records every call so
//! tests can assert which models were invoked and how often.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::tiers::catalog::ModelSpec;
use crate::tiers::types::Provider;

use super::provider::{AnalysisRequest, Completion, FailureReason, LlmProvider, ProviderFailure};

#[derive(Debug, Clone)]
enum Outcome {
    Reply(String),
    Fail(FailureReason),
    Stall(Duration),
}

/// Test double implementing `LlmProvider`
///
/// Outcomes are queued per routing model name. Once a queue drains, its last
/// outcome repeats. Models with no script fail with `unknown`.
pub struct ScriptedProvider {
    provider: Provider,
    scripts: Mutex<HashMap<String, VecDeque<Outcome>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn push(self, model: &str, outcome: Outcome) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    /// Queue a successful reply for `model`
    pub fn reply(self, model: &str, content: impl Into<String>) -> Self {
        self.push(model, Outcome::Reply(content.into()))
    }

    /// Queue a failure for `model`
    pub fn fail(self, model: &str, reason: FailureReason) -> Self {
        self.push(model, Outcome::Fail(reason))
    }

    /// Queue a call that sleeps for `delay` before replying "{}"
    pub fn stall(self, model: &str, delay: Duration) -> Self {
        self.push(model, Outcome::Stall(delay))
    }

    /// Routing model names in invocation order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, model: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|m| *m == model)
            .count()
    }

    fn next_outcome(&self, model: &str) -> Option<Outcome> {
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts.get_mut(model)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn complete(
        &self,
        model: &ModelSpec,
        request: &AnalysisRequest,
    ) -> Result<Completion, ProviderFailure> {
        self.calls.lock().unwrap().push(model.model.clone());

        let input_tokens = request.prompt.len() as u32;
        match self.next_outcome(&model.model) {
            Some(Outcome::Reply(content)) => Ok(Completion {
                output_tokens: content.len() as u32,
                content,
                input_tokens,
            }),
            Some(Outcome::Fail(reason)) => {
                Err(ProviderFailure::new(reason, format!("scripted {}", reason)))
            }
            Some(Outcome::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(Completion {
                    content: "{}".to_string(),
                    input_tokens,
                    output_tokens: 2,
                })
            }
            None => Err(ProviderFailure::new(
                FailureReason::Unknown,
                format!("no script for {}", model.model),
            )),
        }
    }
}
