#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Visitor,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    text: String,
}

impl Message {
    pub fn visitor(text: impl Into<String>) -> Self {
        Self {
            role: Role::Visitor,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Append-only message history of one widget, oldest first.
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
        }
    }

    /// Appends `message`. Blank visitor messages are refused.
    pub fn append(&mut self, message: Message) -> bool {
        if message.role == Role::Visitor && message.text.trim().is_empty() {
            return false;
        }
        self.messages.push(message);
        true
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
