use std::sync::Arc;

use tracing::debug;

use super::conversation_state::{ConversationState, Message};
use crate::assistant::{self, ChatSession, GenerativeService, SessionGateway};
use crate::portfolio::PortfolioContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Closed,
    OpenIdle,
    OpenAwaitingReply,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub is_open: bool,
    pub is_loading: bool,
    pub draft: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
    pub alt: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            shift: false,
            alt: false,
        }
    }

    pub fn alt(key: Key) -> Self {
        Self {
            key,
            shift: false,
            alt: true,
        }
    }

    fn has_modifier(&self) -> bool {
        self.shift || self.alt
    }
}

/// A submitted message on its way to the assistant.
///
/// Holds its own handle to the session, so the widget stays free to be
/// closed, reopened or edited while the reply is outstanding.
pub struct PendingReply {
    session: Arc<dyn ChatSession>,
    text: String,
}

impl PendingReply {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Waits for the assistant. Failures settle to the fallback message.
    pub async fn settle(self) -> Reply {
        Reply {
            text: assistant::send_message(self.session.as_ref(), &self.text).await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    text: String,
}

impl Reply {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The assistant chat widget: conversation, session, and view flags.
pub struct ChatWidget {
    conversation: ConversationState,
    gateway: SessionGateway,
    ui: UiState,
    scroll_requested: bool,
}

impl ChatWidget {
    /// Builds a widget grounded in `context`. The chat session is created
    /// here, once; without a usable credential the widget works but never sends.
    pub fn new(
        context: &PortfolioContext,
        credential: Option<&str>,
        service: &dyn GenerativeService,
    ) -> Self {
        let instruction = assistant::system_instruction(context);
        let gateway = SessionGateway::create_session(credential, &instruction, service);
        Self::with_gateway(assistant::greeting(context), gateway)
    }

    pub fn with_gateway(greeting: impl Into<String>, gateway: SessionGateway) -> Self {
        Self {
            conversation: ConversationState::new(greeting),
            gateway,
            ui: UiState::default(),
            scroll_requested: false,
        }
    }

    pub fn state(&self) -> WidgetState {
        match (self.ui.is_open, self.ui.is_loading) {
            (false, _) => WidgetState::Closed,
            (true, false) => WidgetState::OpenIdle,
            (true, true) => WidgetState::OpenAwaitingReply,
        }
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.all()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.conversation.last()
    }

    pub fn is_open(&self) -> bool {
        self.ui.is_open
    }

    pub fn is_loading(&self) -> bool {
        self.ui.is_loading
    }

    pub fn draft(&self) -> &str {
        &self.ui.draft
    }

    pub fn is_available(&self) -> bool {
        self.gateway.is_available()
    }

    pub fn toggle_open(&mut self) {
        if self.ui.is_open {
            self.close();
        } else {
            self.open();
        }
    }

    pub fn open(&mut self) {
        if !self.ui.is_open {
            self.ui.is_open = true;
            self.scroll_requested = true;
        }
    }

    /// Hides the widget. A pending reply is not cancelled.
    pub fn close(&mut self) {
        self.ui.is_open = false;
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.ui.draft = text.into();
    }

    /// Whether the send control is enabled.
    pub fn can_submit(&self) -> bool {
        !self.ui.is_loading && !self.ui.draft.trim().is_empty() && self.gateway.is_available()
    }

    /// Moves the draft into the conversation and starts the request.
    ///
    /// Returns `None`, changing nothing, when the draft is blank, no session
    /// exists, or a reply is still pending.
    pub fn submit(&mut self) -> Option<PendingReply> {
        if !self.can_submit() {
            return None;
        }
        let session = self.gateway.session()?;

        let text = std::mem::take(&mut self.ui.draft);
        if !self.conversation.append(Message::visitor(text.clone())) {
            self.ui.draft = text;
            return None;
        }
        self.ui.is_loading = true;
        self.scroll_requested = true;

        debug!("Submitted visitor message, awaiting reply");
        Some(PendingReply { session, text })
    }

    /// Applies a settled reply, whether or not the widget is still open.
    pub fn complete(&mut self, reply: Reply) {
        self.conversation.append(Message::assistant(reply.text));
        self.ui.is_loading = false;
        self.scroll_requested = true;
    }

    /// Submits the draft and waits for the reply. Returns whether anything was sent.
    pub async fn send(&mut self) -> bool {
        match self.submit() {
            Some(pending) => {
                let reply = pending.settle().await;
                self.complete(reply);
                true
            }
            None => false,
        }
    }

    /// Enter submits. With Shift or Alt held it starts a new line instead.
    pub fn handle_key(&mut self, press: KeyPress) -> Option<PendingReply> {
        match press.key {
            Key::Enter if press.has_modifier() => {
                self.ui.draft.push('\n');
                None
            }
            Key::Enter => self.submit(),
            Key::Char(c) => {
                self.ui.draft.push(c);
                None
            }
        }
    }

    /// Returns and clears the request to scroll to the newest message.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }
}
