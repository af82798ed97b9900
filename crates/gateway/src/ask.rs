//! The question-answering endpoint and its orchestration.
//!
//! One sequential flow per request: validate → resolve session → scan →
//! sort → assemble prompt → generate. Every stage failure propagates as a
//! typed `Error` and is converted to the response envelope exactly once,
//! here at the boundary.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use streamlens_core::chat::QueryRequest;
use streamlens_core::error::Error;
use streamlens_core::prompt::build_prompt;
use streamlens_store::collect_session_messages;

use crate::{GatewayState, SharedState};

/// Inbound request body. `maxMessagesPerChunk` keeps its original wire name.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,

    #[serde(default)]
    pub channel: String,

    #[serde(rename = "maxMessagesPerChunk", default)]
    pub max_messages_per_chunk: Option<usize>,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

pub type ErrorEnvelope = (StatusCode, Json<ErrorResponse>);

pub async fn ask_handler(
    State(state): State<SharedState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ErrorEnvelope> {
    let Json(payload) = payload.map_err(|e| {
        envelope(Error::InvalidRequest(format!(
            "Invalid JSON in request body: {e}"
        )))
    })?;

    let request = QueryRequest::new(
        &payload.question,
        &payload.channel,
        payload.max_messages_per_chunk,
        state.limits,
    )
    .map_err(envelope)?;

    info!(
        channel = %request.channel,
        max_messages = request.max_messages,
        "chat/ask request"
    );

    let answer = answer_question(&state, &request).await.map_err(envelope)?;
    Ok(Json(AskResponse { answer }))
}

/// Sequence the pipeline for one validated request.
async fn answer_question(state: &GatewayState, request: &QueryRequest) -> Result<String, Error> {
    let window = state.session.resolve(&request.channel).await?;

    let messages =
        collect_session_messages(state.store.as_ref(), &window, request.max_messages).await?;

    let prompt = build_prompt(&window, &messages, &request.question)?;

    let answer = state.answers.generate(&prompt).await?;
    Ok(answer)
}

/// Map a pipeline error to its response envelope.
fn envelope(err: Error) -> ErrorEnvelope {
    let status = match &err {
        Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(error = %err, "chat/ask failed");
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_router;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    use streamlens_core::chat::MessageLimits;
    use streamlens_core::error::{ProviderError, SessionError, StoreError};
    use streamlens_core::prompt::PromptSegment;
    use streamlens_core::provider::AnswerProvider;
    use streamlens_core::session::{SessionResolver, SessionWindow};
    use streamlens_core::store::{
        ChatLogStore, ScanPage, ScanRequest, StoredMessage,
    };
    use streamlens_providers::AnswerGateway;

    /// Resolver returning a fixed window, counting calls.
    struct FixedResolver {
        window: Result<SessionWindow, SessionError>,
        calls: Mutex<usize>,
    }

    impl FixedResolver {
        fn live(started_at: &str) -> Self {
            Self {
                window: Ok(SessionWindow::live("mychannel", started_at)),
                calls: Mutex::new(0),
            }
        }

        fn offline() -> Self {
            Self {
                window: Ok(SessionWindow::offline("mychannel")),
                calls: Mutex::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                window: Err(SessionError::LiveStatus {
                    status_code: 500,
                    message: "helix down".into(),
                }),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl SessionResolver for FixedResolver {
        async fn resolve(&self, channel: &str) -> Result<SessionWindow, SessionError> {
            *self.calls.lock().unwrap() += 1;
            self.window.clone().map(|mut w| {
                w.channel = channel.to_string();
                w
            })
        }
    }

    /// An in-memory store that emulates the scan primitive: filter semantics
    /// (channel equality, timestamp lower bound), limit, single page.
    struct MemoryStore {
        records: Vec<StoredMessage>,
        fail: bool,
        calls: Mutex<usize>,
    }

    impl MemoryStore {
        fn new(records: Vec<StoredMessage>) -> Self {
            Self {
                records,
                fail: false,
                calls: Mutex::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                records: vec![],
                fail: true,
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ChatLogStore for MemoryStore {
        async fn scan(&self, request: ScanRequest) -> Result<ScanPage, StoreError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(StoreError::Api {
                    status_code: 500,
                    message: "scan failed".into(),
                });
            }

            let items: Vec<StoredMessage> = self
                .records
                .iter()
                .filter(|r| match &request.filter {
                    Some(f) => r.channel == f.channel && r.timestamp >= f.since,
                    None => true,
                })
                .take(request.limit)
                .cloned()
                .collect();

            Ok(ScanPage {
                items,
                cursor: None,
            })
        }
    }

    /// Lane that records the prompt it received and answers with a summary.
    struct RecordingLane {
        prompts: Mutex<Vec<Vec<PromptSegment>>>,
    }

    impl RecordingLane {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<Vec<PromptSegment>> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnswerProvider for RecordingLane {
        fn name(&self) -> &str {
            "recording"
        }

        async fn generate(&self, prompt: &[PromptSegment]) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_vec());
            Ok("the answer".into())
        }
    }

    fn record(channel: &str, username: &str, timestamp: &str) -> StoredMessage {
        StoredMessage {
            channel: channel.into(),
            username: username.into(),
            message: format!("msg from {username}"),
            timestamp: timestamp.into(),
        }
    }

    struct TestHarness {
        resolver: Arc<FixedResolver>,
        store: Arc<MemoryStore>,
        lane: Arc<RecordingLane>,
        router: axum::Router,
    }

    fn harness(resolver: FixedResolver, store: MemoryStore) -> TestHarness {
        let resolver = Arc::new(resolver);
        let store = Arc::new(store);
        let lane = Arc::new(RecordingLane::new());
        let state = Arc::new(GatewayState {
            limits: MessageLimits::default(),
            session: resolver.clone(),
            store: store.clone(),
            answers: Arc::new(AnswerGateway::new().add(lane.clone())),
        });
        let router = build_router(state, "*");
        TestHarness {
            resolver,
            store,
            lane,
            router,
        }
    }

    fn ask_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat/ask")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn live_session_uses_only_in_session_messages() {
        // Scenario: live since midnight, store spans before and after.
        let h = harness(
            FixedResolver::live("2024-01-01T00:00:00Z"),
            MemoryStore::new(vec![
                record("mychannel", "early1", "2023-12-31T23:00:00Z"),
                record("mychannel", "early2", "2023-12-31T23:30:00Z"),
                record("mychannel", "late2", "2024-01-01T00:10:00Z"),
                record("mychannel", "late1", "2024-01-01T00:05:00Z"),
                record("mychannel", "late3", "2024-01-01T00:20:00Z"),
            ]),
        );

        let response = h
            .router
            .clone()
            .oneshot(ask_request(
                r#"{"question": "who chatted?", "channel": "mychannel"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["answer"], "the answer");

        // The prompt context holds the sorted in-session subset only.
        let prompts = h.lane.prompts();
        assert_eq!(prompts.len(), 1);
        let context = &prompts[0][1].content;
        assert!(!context.contains("early1"));
        assert!(!context.contains("early2"));
        assert!(context.contains("late1"));
        assert!(context.contains("\"messageCount\": 3"));
        assert!(context.find("late1").unwrap() < context.find("late2").unwrap());
        assert!(context.find("late2").unwrap() < context.find("late3").unwrap());
    }

    #[tokio::test]
    async fn offline_channel_filters_client_side() {
        let h = harness(
            FixedResolver::offline(),
            MemoryStore::new(vec![
                record("otherchannel", "stranger", "2024-01-01T00:05:00Z"),
                record("mychannel", "friend2", "2024-01-01T00:10:00Z"),
                record("mychannel", "friend1", "2024-01-01T00:01:00Z"),
            ]),
        );

        let response = h
            .router
            .clone()
            .oneshot(ask_request(
                r#"{"question": "who chatted?", "channel": "mychannel"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let prompts = h.lane.prompts();
        let context = &prompts[0][1].content;
        assert!(!context.contains("stranger"));
        assert!(context.contains("\"messageCount\": 2"));
        assert!(context.contains("\"startedAt\": null"));
        assert!(context.find("friend1").unwrap() < context.find("friend2").unwrap());
    }

    #[tokio::test]
    async fn empty_question_short_circuits_before_any_collaborator() {
        let h = harness(FixedResolver::live("2024-01-01T00:00:00Z"), MemoryStore::new(vec![]));

        let response = h
            .router
            .clone()
            .oneshot(ask_request(r#"{"question": "  ", "channel": "mychannel"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("question or channel"));

        assert_eq!(h.resolver.calls(), 0);
        assert_eq!(h.store.calls(), 0);
        assert!(h.lane.prompts().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_a_client_error_envelope() {
        let h = harness(FixedResolver::offline(), MemoryStore::new(vec![]));

        let response = h
            .router
            .clone()
            .oneshot(ask_request("{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("Invalid JSON"));
    }

    #[tokio::test]
    async fn session_failure_maps_to_server_error() {
        let h = harness(FixedResolver::failing(), MemoryStore::new(vec![]));

        let response = h
            .router
            .clone()
            .oneshot(ask_request(r#"{"question": "q", "channel": "mychannel"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("helix down"));
        // Hard failure: the pipeline stops before the store.
        assert_eq!(h.store.calls(), 0);
    }

    #[tokio::test]
    async fn store_failure_maps_to_server_error() {
        let h = harness(FixedResolver::live("2024-01-01T00:00:00Z"), MemoryStore::failing());

        let response = h
            .router
            .clone()
            .oneshot(ask_request(r#"{"question": "q", "channel": "mychannel"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(h.lane.prompts().is_empty());
    }

    #[tokio::test]
    async fn no_lanes_yields_distinct_configuration_error() {
        let resolver = Arc::new(FixedResolver::offline());
        let state = Arc::new(GatewayState {
            limits: MessageLimits::default(),
            session: resolver,
            store: Arc::new(MemoryStore::new(vec![])),
            answers: Arc::new(AnswerGateway::new()),
        });
        let router = build_router(state, "*");

        let response = router
            .oneshot(ask_request(r#"{"question": "q", "channel": "mychannel"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("No AI API key configured"));
    }

    #[tokio::test]
    async fn requested_cap_is_clamped() {
        let h = harness(
            FixedResolver::live("2024-01-01T00:00:00Z"),
            MemoryStore::new(
                (0..300)
                    .map(|i| {
                        record(
                            "mychannel",
                            &format!("u{i:03}"),
                            &format!("2024-01-01T01:00:{:02}Z", i % 60),
                        )
                    })
                    .collect(),
            ),
        );

        // Asks for 50, clamps up to the minimum of 200.
        let response = h
            .router
            .clone()
            .oneshot(ask_request(
                r#"{"question": "q", "channel": "mychannel", "maxMessagesPerChunk": 50}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let prompts = h.lane.prompts();
        assert!(prompts[0][1].content.contains("\"messageCount\": 200"));
    }

    #[tokio::test]
    async fn health_endpoint() {
        let h = harness(FixedResolver::offline(), MemoryStore::new(vec![]));

        let response = h
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }
}
