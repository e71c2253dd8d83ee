//! In-memory stand-ins for the text-generation service.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{ChatSession, GenerativeService};
use crate::errors::AssistantError;

pub struct FakeSession {
    replies: Mutex<VecDeque<Result<String, AssistantError>>>,
    received: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            received: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// A session whose replies are held back until `gate` is notified.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn push_reply(&self, reply: Result<String, AssistantError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatSession for FakeSession {
    async fn send_message(&self, text: &str) -> Result<String, AssistantError> {
        self.received.lock().unwrap().push(text.to_string());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AssistantError::MalformedResponse("no reply queued".into())))
    }
}

pub struct FakeService {
    session: Option<Arc<FakeSession>>,
    instructions: Mutex<Vec<String>>,
}

impl FakeService {
    pub fn new(session: FakeSession) -> Self {
        Self {
            session: Some(Arc::new(session)),
            instructions: Mutex::new(Vec::new()),
        }
    }

    /// A service whose session setup always fails.
    pub fn failing() -> Self {
        Self {
            session: None,
            instructions: Mutex::new(Vec::new()),
        }
    }

    pub fn session(&self) -> Arc<FakeSession> {
        self.session.clone().expect("failing service has no session")
    }

    pub fn instructions(&self) -> Vec<String> {
        self.instructions.lock().unwrap().clone()
    }
}

impl GenerativeService for FakeService {
    fn create_session(
        &self,
        _credential: &str,
        system_instruction: &str,
    ) -> Result<Arc<dyn ChatSession>, AssistantError> {
        self.instructions
            .lock()
            .unwrap()
            .push(system_instruction.to_string());

        match &self.session {
            Some(session) => Ok(session.clone()),
            None => Err(AssistantError::Setup("service unreachable".to_string())),
        }
    }
}
