//! Client-side tutoring session.
//!
//! A `TutorSession` holds what one page of the tutoring tool owns: the
//! graphing surface slot, the rolling history and the visible chat log. One
//! turn reads the graph, asks the tutoring endpoint, logs the reply and
//! replays the returned commands. Turns take `&mut self`, so a session never
//! has two requests in flight.

use crate::{
    graph_state::GraphState,
    history::{History, HistoryEntry},
    surface::{self, ApplyReport, FieldFault, GraphingSurface, SurfaceSlot, SurfaceSlotError},
    tutor::TutorResponse,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub const SURFACE_LOADED_MESSAGE: &str =
    "GeoGebra carregado. Use os controles da função e depois peça explicações ou desafios.";

pub const STILL_LOADING_MESSAGE: &str =
    "Ainda estou carregando o GeoGebra. Aguarde um instante e tente de novo.";

pub const BACKEND_UNREACHABLE_MESSAGE: &str =
    "Erro ao falar com o servidor de IA. Verifique se o backend está rodando.";

/// Body of `POST /api/ai`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TutorRequest {
    pub mode: String,
    pub message: String,
    pub ggb_state: Option<GraphState>,
    pub history: History,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Tutoring endpoint responded with status {0}")]
    Status(reqwest::StatusCode),
}

/// Delivers one request to the tutoring endpoint.
#[async_trait]
pub trait TutorTransport: Send + Sync {
    async fn ask(&self, request: &TutorRequest) -> Result<TutorResponse, TransportError>;
}

/// `TutorTransport` over HTTP using `reqwest`.
pub struct HttpTutorTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTutorTransport {
    /// `base_url` is the server origin, e.g. `http://localhost:3001`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/ai", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TutorTransport for HttpTutorTransport {
    async fn ask(&self, request: &TutorRequest) -> Result<TutorResponse, TransportError> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }
        Ok(response.json::<TutorResponse>().await?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Tutor,
}

/// One line of the visible chat log.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub speaker: Speaker,
    pub text: String,
}

/// What happened during one [`TutorSession::send`].
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The surface was not loaded; nothing was sent.
    NotReady,
    /// The tutor answered and its commands were replayed.
    Answered {
        response: TutorResponse,
        applied: ApplyReport,
        read_faults: Vec<FieldFault>,
    },
    /// The endpoint could not be reached or answered badly.
    TransportFailed,
}

pub struct TutorSession {
    surface: SurfaceSlot,
    history: History,
    log: Vec<ChatLine>,
    transport: Arc<dyn TutorTransport>,
}

impl TutorSession {
    pub fn new(transport: Arc<dyn TutorTransport>) -> Self {
        Self {
            surface: SurfaceSlot::new(),
            history: History::new(),
            log: Vec::new(),
            transport,
        }
    }

    pub fn surface(&self) -> &SurfaceSlot {
        &self.surface
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn log(&self) -> &[ChatLine] {
        &self.log
    }

    /// Called once the applet reports it has loaded.
    pub fn attach_surface(
        &mut self,
        surface: Arc<dyn GraphingSurface>,
    ) -> Result<(), SurfaceSlotError> {
        self.surface.load(surface)?;
        self.push_line(Speaker::Tutor, SURFACE_LOADED_MESSAGE);
        Ok(())
    }

    /// Starts over as after a page reload.
    pub fn reload(&mut self) {
        self.surface.reset();
        self.history.clear();
        self.log.clear();
    }

    /// Sends typed text in `chat` mode. Blank input is ignored.
    pub async fn send_chat(&mut self, text: &str) -> Option<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.push_line(Speaker::User, text);
        Some(self.send("chat", text).await)
    }

    /// Sends a mode button press (`explain`, `challenge`, ...) with no text.
    pub async fn press_button(&mut self, mode: &str, label: &str) -> TurnOutcome {
        self.push_line(Speaker::User, format!("[Botão] {label}"));
        self.send(mode, "").await
    }

    /// Runs one full turn: read, ask, log, apply.
    #[instrument(name = "tutor_turn", skip(self, message))]
    pub async fn send(&mut self, mode: &str, message: &str) -> TurnOutcome {
        let (ggb_state, read_faults) = match surface::read(&self.surface) {
            Ok(report) => (Some(report.state), report.faults),
            Err(e) => {
                warn!(error = %e, "Could not read graph state.");
                (None, Vec::new())
            }
        };

        if ggb_state.is_none() && !self.surface.is_loaded() && mode != "explain" {
            self.push_line(Speaker::Tutor, STILL_LOADING_MESSAGE);
            return TurnOutcome::NotReady;
        }

        let content = if message.is_empty() {
            format!("[botão:{mode}]")
        } else {
            message.to_string()
        };
        self.history.push(HistoryEntry::user(content));

        let request = TutorRequest {
            mode: mode.to_string(),
            message: message.to_string(),
            ggb_state,
            history: self.history.clone(),
        };

        let response = match self.transport.ask(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Failed to reach tutoring endpoint.");
                self.push_line(Speaker::Tutor, BACKEND_UNREACHABLE_MESSAGE);
                return TurnOutcome::TransportFailed;
            }
        };

        self.history
            .push(HistoryEntry::assistant(response.reply.clone()));
        self.push_line(Speaker::Tutor, response.reply.clone());
        let applied = surface::apply(&self.surface, &response.actions);
        info!(
            applied = applied.applied.len(),
            failed = applied.failed.len(),
            skipped = applied.skipped.len(),
            "Turn complete."
        );

        TurnOutcome::Answered {
            response,
            applied,
            read_faults,
        }
    }

    fn push_line(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.log.push(ChatLine {
            speaker,
            text: text.into(),
        });
    }
}
