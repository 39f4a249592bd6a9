//! Test utilities for recollect - deterministic oracles
//!
//! Engines are exercised against scripted oracles so tests never touch a
//! real completion API. `ScriptedOracle` replays canned replies in call
//! order and records every prompt it saw; `FailingOracle` fails every
//! call, for exercising the degrade-to-empty paths.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::oracle::{Oracle, OracleError};

/// Oracle that replays a fixed sequence of replies.
///
/// Replies are consumed in call order; once the script runs out, further
/// calls fail like an unavailable service. Prompts are recorded for
/// assertions on what the engines actually sent.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    replies: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    /// Build a script from replies in the order they should be returned.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut replies: Vec<String> = replies.into_iter().map(Into::into).collect();
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts seen so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Number of scripted replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(
        &self,
        prompt: &str,
        _system_instruction: &str,
        _temperature: f32,
    ) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| OracleError::ApiError("script exhausted".to_string()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Oracle that fails every call
#[derive(Debug, Default)]
pub struct FailingOracle;

#[async_trait]
impl Oracle for FailingOracle {
    async fn complete(
        &self,
        _prompt: &str,
        _system_instruction: &str,
        _temperature: f32,
    ) -> Result<String, OracleError> {
        Err(OracleError::ApiError("oracle offline".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_oracle_replays_in_order() {
        let oracle = ScriptedOracle::new(["first", "second"]);

        assert_eq!(oracle.complete("a", "sys", 0.2).await.unwrap(), "first");
        assert_eq!(oracle.complete("b", "sys", 0.2).await.unwrap(), "second");
        assert!(oracle.complete("c", "sys", 0.2).await.is_err());

        assert_eq!(oracle.prompts(), vec!["a", "b", "c"]);
        assert_eq!(oracle.remaining(), 0);
    }

    #[tokio::test]
    async fn failing_oracle_always_fails() {
        let oracle = FailingOracle;
        assert!(oracle.complete("a", "sys", 0.2).await.is_err());
    }
}
