//! API Models
//!
//! This module defines the HTTP request and response bodies of the tutoring
//! endpoint, with `utoipa` schemas for the OpenAPI documentation.

use parabola_core::{Command, GraphState, History, TutorResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /api/ai`. Every field is optional on the wire.
#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AiRequestPayload {
    #[schema(example = "chat")]
    #[serde(default)]
    pub mode: Option<String>,
    #[schema(example = "O que acontece se a for negativo?")]
    #[serde(default)]
    pub message: Option<String>,
    /// Snapshot of the construction; `null` when the applet is not ready.
    #[schema(value_type = Option<Object>)]
    #[serde(default)]
    pub ggb_state: Option<GraphState>,
    /// The most recent `{role, content}` entries, oldest first.
    #[schema(value_type = Option<Vec<Object>>)]
    #[serde(default)]
    pub history: Option<History>,
}

/// Body of every `POST /api/ai` response.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct AiResponse {
    #[schema(example = "Ainda não consegui ler o estado do GeoGebra.")]
    pub reply: String,
    /// Commands to replay against the construction, in order.
    #[schema(value_type = Vec<Object>)]
    pub actions: Vec<Command>,
}

impl From<TutorResponse> for AiResponse {
    fn from(response: TutorResponse) -> Self {
        Self {
            reply: response.reply,
            actions: response.actions,
        }
    }
}
