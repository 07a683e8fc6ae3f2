//! Axum Handlers for the REST API
//!
//! The tutoring endpoint always answers `200` with a well-formed body: every
//! failure, including an unreadable request body, is turned into a reply.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    models::{AiRequestPayload, AiResponse},
    state::AppState,
};

/// Ask the tutor about the current construction.
#[utoipa::path(
    post,
    path = "/api/ai",
    request_body = AiRequestPayload,
    responses(
        (status = 200, description = "Tutor reply and the commands to replay", body = AiResponse)
    )
)]
#[instrument(name = "ask_tutor", skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn ask_tutor(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AiRequestPayload>, JsonRejection>,
) -> Json<AiResponse> {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Unreadable request body; treating graph state as unavailable.");
            AiRequestPayload::default()
        }
    };

    let mode = payload.mode.unwrap_or_default();
    let message = payload.message.unwrap_or_default();
    let history = payload.history.unwrap_or_default();

    let response = state
        .tutor
        .respond(&mode, &message, payload.ggb_state.as_ref(), &history)
        .await;

    Json(response.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, router::create_router};
    use async_trait::async_trait;
    use parabola_core::{
        Command,
        llm_client::{CompletionClient, UnconfiguredClient},
        session::{HttpTutorTransport, TutorRequest, TutorTransport},
        tutor::{NOT_READY_REPLY, UPSTREAM_FAILURE_REPLY},
    };
    use serde_json::json;
    use std::{
        net::SocketAddr,
        path::PathBuf,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    /// A completion service that always answers with the same text.
    struct CannedClient {
        raw: &'static str,
        calls: AtomicUsize,
    }

    impl CannedClient {
        fn new(raw: &'static str) -> Arc<Self> {
            Arc::new(Self {
                raw,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for CannedClient {
        async fn complete_json(&self, _system: String, _payload: String) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.raw.to_string())
        }
    }

    fn test_config(static_dir: PathBuf) -> Config {
        Config {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
            openai_api_key: None,
            openai_api_base: "http://127.0.0.1:9".to_string(),
            chat_model: "gpt-4.1-mini".to_string(),
            completion_timeout: Duration::from_secs(2),
            log_level: tracing::Level::INFO,
            prompts_path: PathBuf::from("./prompts"),
            static_dir,
        }
    }

    async fn spawn_app(state: AppState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = create_router(Arc::new(state));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn app_with(client: Arc<dyn CompletionClient>) -> String {
        let state = AppState::with_client(
            test_config(PathBuf::from("./frontend")),
            client,
            "SYSTEM".to_string(),
        );
        spawn_app(state).await
    }

    async fn post(base_url: &str, body: serde_json::Value) -> (u16, serde_json::Value) {
        let response = reqwest::Client::new()
            .post(format!("{}/api/ai", base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_reset_request_returns_fixed_commands() {
        let client = CannedClient::new(r#"{"reply":"never","actions":[]}"#);
        let base_url = app_with(client.clone()).await;

        let (status, body) = post(
            &base_url,
            json!({
                "mode": "chat",
                "message": "resetar",
                "ggbState": { "a": 1, "b": 0, "c": 0, "x1": 0, "x2": 0,
                              "vertex": { "x": 0, "y": 0 }, "areaRect": 0 },
                "history": []
            }),
        )
        .await;

        assert_eq!(status, 200);
        assert!(body["reply"].as_str().unwrap().contains("f(x) = -0,5x² + 2"));
        assert_eq!(
            body["actions"],
            json!([
                { "command": "setValue", "object": "a", "value": -0.5 },
                { "command": "setValue", "object": "b", "value": 0.0 },
                { "command": "setValue", "object": "c", "value": 2.0 }
            ])
        );
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_null_state_returns_not_ready() {
        let client = CannedClient::new(r#"{"reply":"never","actions":[]}"#);
        let base_url = app_with(client.clone()).await;

        let (status, body) = post(
            &base_url,
            json!({ "mode": "explain", "message": "", "ggbState": null, "history": [] }),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(
            body,
            json!({ "reply": "Ainda não consegui ler o estado do GeoGebra.", "actions": [] })
        );
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_json_completion_is_wrapped() {
        let client = CannedClient::new("not json");
        let base_url = app_with(client.clone()).await;

        let (status, body) = post(
            &base_url,
            json!({ "mode": "chat", "message": "oi", "ggbState": { "a": 1 }, "history": [] }),
        )
        .await;

        assert_eq!(status, 200);
        assert!(body["reply"].as_str().unwrap().contains("not json"));
        assert_eq!(body["actions"], json!([]));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_history_entry_does_not_hide_state() {
        let client = CannedClient::new(r#"{"reply":"A parábola abre para cima.","actions":[]}"#);
        let base_url = app_with(client.clone()).await;

        let (status, body) = post(
            &base_url,
            json!({
                "mode": "chat",
                "message": "explique",
                "ggbState": { "a": 1 },
                "history": [
                    { "role": "system", "content": "x" },
                    { "role": "user", "content": null },
                    { "role": "user", "content": "oi" }
                ]
            }),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(body["reply"], "A parábola abre para cima.");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_api_key_degrades_to_fallback() {
        let base_url = app_with(Arc::new(UnconfiguredClient)).await;

        let (status, body) = post(
            &base_url,
            json!({ "mode": "chat", "message": "oi", "ggbState": { "a": 1 }, "history": [] }),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(body["reply"], UPSTREAM_FAILURE_REPLY);
        assert_eq!(body["actions"], json!([]));
    }

    #[tokio::test]
    async fn test_unreadable_body_still_answers() {
        let client = CannedClient::new(r#"{"reply":"never","actions":[]}"#);
        let base_url = app_with(client.clone()).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/ai", base_url))
            .header("content-type", "application/json")
            .body("{ this is not json")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["reply"], NOT_READY_REPLY);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_core_http_transport_round_trip() {
        let client = CannedClient::new(
            r#"{"reply":"Mudei c para 1.","actions":[{"command":"setValue","object":"c","value":1}]}"#,
        );
        let base_url = app_with(client).await;

        let transport = HttpTutorTransport::new(&base_url);
        let response = transport
            .ask(&TutorRequest {
                mode: "chat".into(),
                message: "mude c para 1".into(),
                ggb_state: Some(Default::default()),
                history: Default::default(),
            })
            .await
            .unwrap();

        assert_eq!(response.reply, "Mudei c para 1.");
        assert_eq!(response.actions, vec![Command::set_value("c", 1.0)]);
    }

    #[tokio::test]
    async fn test_serves_static_frontend() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Função quadrática</h1>").unwrap();
        let state = AppState::with_client(
            test_config(dir.path().to_path_buf()),
            CannedClient::new("{}"),
            String::new(),
        );
        let base_url = spawn_app(state).await;

        let response = reqwest::get(format!("{}/", base_url)).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert!(response.text().await.unwrap().contains("Função quadrática"));
    }

    #[tokio::test]
    async fn test_openapi_document_lists_tutor_route() {
        let base_url = app_with(CannedClient::new("{}")).await;

        let doc: serde_json::Value = reqwest::get(format!("{}/api-docs/openapi.json", base_url))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert!(doc["paths"]["/api/ai"]["post"].is_object());
    }
}
