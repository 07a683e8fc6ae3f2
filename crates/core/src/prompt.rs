//! Built-in behavioral contract for the completion service.

/// The system prompt used when no override is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("../../../prompts/system_prompt.md");
