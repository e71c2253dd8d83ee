pub mod instruction;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::errors::AssistantError;

pub use instruction::{greeting, system_instruction};

/// Shown in place of a reply whenever a request to the service fails.
pub const FALLBACK_MESSAGE: &str = "I'm sorry, I encountered an error. Please try again later.";

/// A text-generation backend able to open chat sessions.
pub trait GenerativeService: Send + Sync {
    /// Opens a session bound to `system_instruction` for its whole lifetime.
    fn create_session(
        &self,
        credential: &str,
        system_instruction: &str,
    ) -> Result<Arc<dyn ChatSession>, AssistantError>;
}

/// A stateful conversation with the service.
#[async_trait]
pub trait ChatSession: Send + Sync {
    async fn send_message(&self, text: &str) -> Result<String, AssistantError>;
}

/// Owns the single chat session of a widget.
///
/// The session is created once, at construction. If that fails the gateway
/// stays unavailable for good and callers must not send through it.
pub struct SessionGateway {
    session: Option<Arc<dyn ChatSession>>,
}

impl SessionGateway {
    pub fn create_session(
        credential: Option<&str>,
        system_instruction: &str,
        service: &dyn GenerativeService,
    ) -> Self {
        let credential = match credential.map(str::trim) {
            Some(credential) if !credential.is_empty() => credential,
            _ => {
                info!("No API credential configured, assistant disabled");
                return Self::unavailable();
            }
        };

        match service.create_session(credential, system_instruction) {
            Ok(session) => {
                info!("Chat session initialized");
                Self {
                    session: Some(session),
                }
            }
            Err(e) => {
                error!("Failed to initialize chat session: {}", e);
                Self::unavailable()
            }
        }
    }

    pub fn unavailable() -> Self {
        Self { session: None }
    }

    pub fn is_available(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<Arc<dyn ChatSession>> {
        self.session.clone()
    }
}

/// Sends one visitor message and returns the reply, or [`FALLBACK_MESSAGE`]
/// if the request failed for any reason.
pub async fn send_message(session: &dyn ChatSession, text: &str) -> String {
    debug!("Sending visitor message ({} chars)", text.len());

    match session.send_message(text).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Chat error: {}", e);
            FALLBACK_MESSAGE.to_string()
        }
    }
}
