use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use anyhow::Context;
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::sync::Mutex;

use super::prompt::{build_control_prompt, PromptConfig};
use super::step::{now_millis, AgentStep};
use super::wire::parse_press;
use crate::emulator::Button;
use crate::llm::OllamaClient;

/// What the policy chose for one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub thought: String,
    pub action: Button,
}

/// Pluggable "thought" source: observation string in, button out.
///
/// A deterministic test double and the LLM-backed policy are interchangeable
/// through this slot without touching the loop.
pub trait DecisionPolicy: Send + Sync {
    fn decide<'a>(
        &'a self,
        observation: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Decision>> + Send + 'a>>;
}

/// Uniform random walk over the d-pad. Reference behavior while no model is
/// wired in.
#[derive(Debug, Default)]
pub struct RandomWalk;

impl DecisionPolicy for RandomWalk {
    fn decide<'a>(
        &'a self,
        observation: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Decision>> + Send + 'a>> {
        Box::pin(async move {
            let idx = (OsRng.next_u32() as usize) % Button::DPAD.len();
            let action = Button::DPAD[idx];
            Ok(Decision {
                thought: format!("{observation} I should move around."),
                action,
            })
        })
    }
}

/// Asks a local model which button to press.
///
/// Keeps its own short history of past decisions so the prompt can show the
/// model what it already tried.
pub struct LlmPolicy {
    llm: OllamaClient,
    prompt_cfg: PromptConfig,
    history: Mutex<VecDeque<AgentStep>>,
}

impl LlmPolicy {
    pub fn new(llm: OllamaClient) -> Self {
        Self {
            llm,
            prompt_cfg: PromptConfig::default(),
            history: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_prompt_config(mut self, prompt_cfg: PromptConfig) -> Self {
        self.prompt_cfg = prompt_cfg;
        self
    }
}

impl DecisionPolicy for LlmPolicy {
    fn decide<'a>(
        &'a self,
        observation: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Decision>> + Send + 'a>> {
        Box::pin(async move {
            let recent: Vec<AgentStep> = {
                let history = self.history.lock().await;
                history.iter().cloned().collect()
            };

            let prompt = build_control_prompt(observation, &recent, &self.prompt_cfg);
            let raw = self.llm.generate(&prompt).await.context("llm generate")?;
            let call = parse_press(&raw).context("llm press contract")?;

            let decision = Decision {
                thought: if call.thought.is_empty() {
                    raw.trim().to_string()
                } else {
                    call.thought
                },
                action: call.button,
            };

            let mut history = self.history.lock().await;
            history.push_back(AgentStep {
                observation: observation.to_string(),
                thought: decision.thought.clone(),
                action: decision.action.name().to_string(),
                timestamp: now_millis(),
            });
            while history.len() > self.prompt_cfg.history_limit {
                history.pop_front();
            }

            Ok(decision)
        })
    }
}
