//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the tutoring proxy
//! and configuration shared by every handler.

use crate::config::Config;
use anyhow::Context;
use async_openai::config::OpenAIConfig;
use parabola_core::{
    llm_client::{CompletionClient, OpenAICompatibleClient, UnconfiguredClient},
    prompt::DEFAULT_SYSTEM_PROMPT,
    tutor::TutorService,
};
use secrecy::ExposeSecret;
use std::{path::Path, sync::Arc};
use tracing::{info, warn};

/// The shared application state, created once at startup and passed to all handlers.
/// Nothing in it is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub tutor: Arc<TutorService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Builds the completion client and tutoring proxy described by `config`.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let client: Arc<dyn CompletionClient> = match &config.openai_api_key {
            Some(api_key) => {
                let openai_config = OpenAIConfig::new()
                    .with_api_key(api_key.expose_secret())
                    .with_api_base(&config.openai_api_base);
                Arc::new(OpenAICompatibleClient::new(
                    openai_config,
                    config.chat_model.clone(),
                ))
            }
            None => {
                warn!(
                    "OPENAI_API_KEY is not set. Every tutoring request will receive the fallback reply."
                );
                Arc::new(UnconfiguredClient)
            }
        };

        let system_prompt = load_system_prompt(&config.prompts_path)?;
        Ok(Self::with_client(config, client, system_prompt))
    }

    /// Assembles the state around an existing completion client.
    pub fn with_client(
        config: Config,
        client: Arc<dyn CompletionClient>,
        system_prompt: String,
    ) -> Self {
        let tutor = TutorService::new(client, Arc::new(system_prompt))
            .with_timeout(config.completion_timeout);
        Self {
            tutor: Arc::new(tutor),
            config: Arc::new(config),
        }
    }
}

/// Reads `system_prompt.md` from `prompts_path`, falling back to the built-in prompt.
pub fn load_system_prompt(prompts_path: &Path) -> anyhow::Result<String> {
    let path = prompts_path.join("system_prompt.md");
    if !path.is_file() {
        info!(path = %path.display(), "No system prompt override found; using the built-in prompt.");
        return Ok(DEFAULT_SYSTEM_PROMPT.to_string());
    }
    let prompt = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read system prompt at {}", path.display()))?;
    info!(path = %path.display(), "Loaded system prompt override.");
    Ok(prompt)
}
