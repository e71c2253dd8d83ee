use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use url::Url;

use crate::assistant::{ChatSession, GenerativeService};
use crate::errors::AssistantError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Opens chat sessions against the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, api_key: &str) -> Result<Url, AssistantError> {
        let raw = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let mut url =
            Url::parse(&raw).map_err(|e| AssistantError::Setup(format!("invalid endpoint {}: {}", raw, e)))?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL, DEFAULT_BASE_URL)
    }
}

impl GenerativeService for GeminiClient {
    fn create_session(
        &self,
        credential: &str,
        system_instruction: &str,
    ) -> Result<Arc<dyn ChatSession>, AssistantError> {
        if credential.is_empty() {
            return Err(AssistantError::MissingCredential);
        }
        if credential
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || !c.is_ascii())
        {
            return Err(AssistantError::InvalidCredential(
                "API key contains whitespace or non-ASCII characters".to_string(),
            ));
        }

        let endpoint = self.endpoint(credential)?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AssistantError::Setup(e.to_string()))?;

        info!("Created Gemini chat session with model {}", self.model);

        Ok(Arc::new(GeminiSession {
            client,
            endpoint,
            system_instruction: Content::text(None, system_instruction),
            history: Mutex::new(Vec::new()),
        }))
    }
}

/// One multi-turn conversation. Every completed exchange is replayed to the
/// API on the next request.
pub struct GeminiSession {
    client: reqwest::Client,
    endpoint: Url,
    system_instruction: Content,
    history: Mutex<Vec<Content>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: &'a Content,
    contents: &'a [Content],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 1024,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetails {
    message: String,
}

impl GeminiSession {
    async fn request(&self, contents: &[Content]) -> Result<String, AssistantError> {
        let request_body = GenerateRequest {
            system_instruction: &self.system_instruction,
            contents,
            generation_config: GenerationConfig::default(),
        };

        if let Ok(pretty) = serde_json::to_string_pretty(&request_body) {
            debug!("Sending request to Gemini API: {}", pretty);
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request_body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.map_err(transport_error)?;
            error!("API request failed with status {}: {}", status, error_text);

            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(AssistantError::RateLimited(message));
            }
            return Err(AssistantError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let response_json: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::MalformedResponse(e.without_url().to_string()))?;

        debug!("Received {} candidate(s) from Gemini API", response_json.candidates.len());

        let candidate = response_json
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::MalformedResponse("no candidates".to_string()))?;

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AssistantError::MalformedResponse(format!(
                "candidate has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

// The endpoint carries the API key in its query string.
fn transport_error(e: reqwest::Error) -> AssistantError {
    AssistantError::Transport(e.without_url())
}

#[async_trait]
impl ChatSession for GeminiSession {
    async fn send_message(&self, text: &str) -> Result<String, AssistantError> {
        let mut history = self.history.lock().await;

        let user_turn = Content::text(Some("user"), text);
        let mut contents = history.clone();
        contents.push(user_turn.clone());

        let reply = self.request(&contents).await?;

        history.push(user_turn);
        history.push(Content::text(Some("model"), &reply));

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use axum::extract::State;
    use axum::http::{StatusCode as HttpStatus, Uri};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;

    #[derive(Clone)]
    struct MockState {
        replies: Arc<StdMutex<VecDeque<(HttpStatus, Value)>>>,
        requests: Arc<StdMutex<Vec<(String, Value)>>>,
    }

    async fn generate_handler(
        State(state): State<MockState>,
        uri: Uri,
        Json(body): Json<Value>,
    ) -> (HttpStatus, Json<Value>) {
        state.requests.lock().unwrap().push((uri.to_string(), body));
        let (status, reply) = state
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((HttpStatus::SERVICE_UNAVAILABLE, json!({})));
        (status, Json(reply))
    }

    async fn start_mock(replies: Vec<(HttpStatus, Value)>) -> (String, MockState) {
        let state = MockState {
            replies: Arc::new(StdMutex::new(VecDeque::from(replies))),
            requests: Arc::new(StdMutex::new(Vec::new())),
        };
        let app = Router::new()
            .fallback(generate_handler)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/v1beta", addr), state)
    }

    fn text_reply(text: &str) -> (HttpStatus, Value) {
        (
            HttpStatus::OK,
            json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": text}]},
                    "finishReason": "STOP"
                }]
            }),
        )
    }

    #[tokio::test]
    async fn sends_instruction_and_accumulates_history() {
        let (base_url, state) = start_mock(vec![
            text_reply("I built **Echo**."),
            text_reply("It uses WebRTC."),
        ])
        .await;

        let client = GeminiClient::new("gemini-test", base_url);
        let session = client.create_session("test-key", "Only talk about the portfolio").unwrap();

        assert_eq!(
            session.send_message("What projects?").await.unwrap(),
            "I built **Echo**."
        );
        assert_eq!(
            session.send_message("What does Echo use?").await.unwrap(),
            "It uses WebRTC."
        );

        let requests = state.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 2);

        let (uri, first) = &requests[0];
        assert_eq!(uri, "/v1beta/models/gemini-test:generateContent?key=test-key");
        assert_eq!(
            first["systemInstruction"]["parts"][0]["text"],
            "Only talk about the portfolio"
        );
        assert_eq!(first["contents"].as_array().unwrap().len(), 1);

        let (_, second) = &requests[1];
        let contents = second["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "I built **Echo**.");
        assert_eq!(contents[2]["parts"][0]["text"], "What does Echo use?");
    }

    #[tokio::test]
    async fn failed_exchange_is_not_recorded() {
        let (base_url, state) = start_mock(vec![
            (
                HttpStatus::INTERNAL_SERVER_ERROR,
                json!({"error": {"code": 500, "message": "backend exploded"}}),
            ),
            text_reply("Hello again."),
        ])
        .await;

        let client = GeminiClient::new("gemini-test", base_url);
        let session = client.create_session("test-key", "instruction").unwrap();

        let err = session.send_message("Hi").await.unwrap_err();
        match err {
            AssistantError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "backend exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        session.send_message("Hi again").await.unwrap();
        let requests = state.requests.lock().unwrap().clone();
        assert_eq!(requests[1].1["contents"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn quota_rejection_maps_to_rate_limited() {
        let (base_url, _state) = start_mock(vec![(
            HttpStatus::TOO_MANY_REQUESTS,
            json!({"error": {"code": 429, "message": "Resource has been exhausted"}}),
        )])
        .await;

        let session = GeminiClient::new("gemini-test", base_url)
            .create_session("test-key", "instruction")
            .unwrap();

        let err = session.send_message("Hi").await.unwrap_err();
        assert!(matches!(err, AssistantError::RateLimited(m) if m.contains("exhausted")));
    }

    #[tokio::test]
    async fn empty_candidate_is_malformed() {
        let (base_url, _state) = start_mock(vec![(
            HttpStatus::OK,
            json!({"candidates": [{"finishReason": "SAFETY"}]}),
        )])
        .await;

        let session = GeminiClient::new("gemini-test", base_url)
            .create_session("test-key", "instruction")
            .unwrap();

        let err = session.send_message("Hi").await.unwrap_err();
        assert!(matches!(err, AssistantError::MalformedResponse(m) if m.contains("SAFETY")));
    }

    #[tokio::test]
    async fn transport_failure_does_not_expose_key() {
        // Bind and release a port so nothing is listening on it.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let session = GeminiClient::new("gemini-test", format!("http://{}/v1beta", addr))
            .create_session("SECRETKEY123", "instruction")
            .unwrap();

        let err = session.send_message("Hi").await.unwrap_err();
        assert!(matches!(err, AssistantError::Transport(_)));
        assert!(!err.to_string().contains("SECRETKEY123"));
        assert!(!format!("{:?}", err).contains("SECRETKEY123"));

        let logged = crate::assistant::send_message(session.as_ref(), "Hi").await;
        assert_eq!(logged, crate::assistant::FALLBACK_MESSAGE);
    }

    #[test]
    fn rejects_malformed_credentials() {
        let client = GeminiClient::default();
        assert!(matches!(
            client.create_session("", "instruction"),
            Err(AssistantError::MissingCredential)
        ));
        assert!(matches!(
            client.create_session("abc def", "instruction"),
            Err(AssistantError::InvalidCredential(_))
        ));
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let client = GeminiClient::new("gemini-test", "not a url");
        assert!(matches!(
            client.create_session("key", "instruction"),
            Err(AssistantError::Setup(_))
        ));
    }
}
