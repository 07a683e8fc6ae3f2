//! Tutoring Proxy
//!
//! Turns one user turn (mode, message, graph snapshot and history) into a
//! [`TutorResponse`]. The proxy answers without the completion service when
//! the graph state is missing or the student asks for a reset, and absorbs
//! every upstream or format failure into a fixed reply so callers always get
//! a well-formed response.

use crate::{
    command::Command, graph_state::GraphState, history::History, llm_client::CompletionClient,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

pub const NOT_READY_REPLY: &str = "Ainda não consegui ler o estado do GeoGebra.";

pub const RESET_KEYWORD: &str = "resetar";

pub const RESET_REPLY: &str = "Função resetada para o modelo inicial f(x) = -0,5x² + 2. Explore novamente o gráfico e peça uma nova explicação.";

pub const UNPARSEABLE_REPLY_PREFIX: &str =
    "Tive um problema ao interpretar a resposta da IA. Resumo: ";

pub const EMPTY_REPLY: &str = "Não consegui gerar uma explicação adequada.";

pub const UPSTREAM_FAILURE_REPLY: &str = "Ocorreu um erro ao falar com a OpenAI. Verifique a chave de API e a conexão. Enquanto isso, analise o gráfico: como o valor de a influencia a concavidade da parábola?";

pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

/// Phrases in which the tutor claims to have changed the construction itself.
const MUTATION_CLAIMS: [&str; 10] = [
    "atualizei",
    "alterei",
    "mudei",
    "movi",
    "resetei",
    "modifiquei",
    "transladei",
    "i updated",
    "i changed",
    "i moved",
];

/// The proxy's output: text for the chat log and commands for the surface.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TutorResponse {
    pub reply: String,
    pub actions: Vec<Command>,
}

impl TutorResponse {
    /// A reply without actions.
    pub fn text(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            actions: Vec::new(),
        }
    }

    pub fn not_ready() -> Self {
        Self::text(NOT_READY_REPLY)
    }

    pub fn upstream_failure() -> Self {
        Self::text(UPSTREAM_FAILURE_REPLY)
    }

    /// Resets the quadratic to `f(x) = -0.5x² + 2`.
    pub fn reset() -> Self {
        Self {
            reply: RESET_REPLY.to_string(),
            actions: vec![
                Command::set_value("a", -0.5),
                Command::set_value("b", 0.0),
                Command::set_value("c", 2.0),
            ],
        }
    }

    /// Builds a response from raw completion text, whatever its shape.
    ///
    /// Text that is not a JSON object is embedded in the reply. A missing or
    /// empty `reply` gets a default; `actions` that is not an array becomes
    /// empty, and malformed entries inside it are dropped.
    pub fn from_completion(raw: &str) -> Self {
        let object = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(object)) => object,
            _ => {
                warn!(raw, "Completion was not a JSON object.");
                return Self::text(format!("{UNPARSEABLE_REPLY_PREFIX}{raw}"));
            }
        };

        let reply = match object.get("reply").and_then(Value::as_str) {
            Some(reply) if !reply.is_empty() => reply.to_string(),
            _ => {
                warn!("Completion had no usable `reply`.");
                EMPTY_REPLY.to_string()
            }
        };

        let actions = match object.get("actions") {
            Some(Value::Array(entries)) => entries
                .iter()
                .enumerate()
                .filter_map(|(index, entry)| {
                    serde_json::from_value::<Command>(entry.clone())
                        .map_err(|e| warn!(index, %entry, error = %e, "Dropping malformed action."))
                        .ok()
                })
                .collect(),
            Some(other) => {
                warn!(actions = %other, "Completion `actions` was not an array.");
                Vec::new()
            }
            None => Vec::new(),
        };

        Self { reply, actions }
    }

    /// True when the reply says the tutor changed the graph but no command
    /// backs the claim.
    pub fn claims_unbacked_mutation(&self) -> bool {
        if !self.actions.is_empty() {
            return false;
        }
        let reply = self.reply.to_lowercase();
        let words: Vec<&str> = reply
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .collect();
        MUTATION_CLAIMS.iter().any(|claim| {
            let claim: Vec<&str> = claim.split(' ').collect();
            words.windows(claim.len()).any(|window| window == claim.as_slice())
        })
    }
}

/// Whether `message` asks for the local reset shortcut.
pub fn is_reset_request(message: &str) -> bool {
    message.to_lowercase().contains(RESET_KEYWORD)
}

/// The single user-level message sent to the completion service.
#[derive(Serialize)]
struct CompletionPayload<'a> {
    mode: &'a str,
    message: &'a str,
    #[serde(rename = "ggbState")]
    ggb_state: &'a GraphState,
    history: &'a History,
}

/// Stateless proxy between a tutoring client and the completion service.
pub struct TutorService {
    client: Arc<dyn CompletionClient>,
    system_prompt: Arc<String>,
    timeout: Duration,
}

impl TutorService {
    pub fn new(client: Arc<dyn CompletionClient>, system_prompt: Arc<String>) -> Self {
        Self {
            client,
            system_prompt,
            timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }

    /// Bounds each completion call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Answers one tutoring turn. Never fails.
    #[instrument(name = "tutor_respond", skip_all, fields(mode = %mode))]
    pub async fn respond(
        &self,
        mode: &str,
        message: &str,
        state: Option<&GraphState>,
        history: &History,
    ) -> TutorResponse {
        let Some(state) = state else {
            info!("No graph state supplied; answering locally.");
            return TutorResponse::not_ready();
        };

        if is_reset_request(message) {
            info!("Reset requested; answering locally.");
            return TutorResponse::reset();
        }

        let payload = match serde_json::to_string(&CompletionPayload {
            mode,
            message,
            ggb_state: state,
            history,
        }) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Failed to serialize completion payload.");
                return TutorResponse::upstream_failure();
            }
        };

        let call = self
            .client
            .complete_json(self.system_prompt.to_string(), payload);
        let raw = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                error!(error = ?e, "Completion service call failed.");
                return TutorResponse::upstream_failure();
            }
            Err(_) => {
                error!(timeout = ?self.timeout, "Completion service call timed out.");
                return TutorResponse::upstream_failure();
            }
        };

        let response = TutorResponse::from_completion(&raw);
        if response.claims_unbacked_mutation() {
            warn!(reply = %response.reply, "Reply claims a graph change without actions.");
        }
        info!(actions = response.actions.len(), "Tutor response ready.");
        response
    }
}
