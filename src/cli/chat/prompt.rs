use rustyline::error::ReadlineError;
use rustyline::{Cmd, Config, Editor, KeyCode, KeyEvent, Modifiers, Result};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

pub fn generate_prompt(is_open: bool) -> String {
    if is_open { "> " } else { "(minimized) > " }.to_string()
}

/// Line editor for the chat input. Enter submits; Alt-Enter starts a new
/// line inside the same message.
pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();
    let mut editor = Editor::with_config(config)?;
    editor.bind_sequence(KeyEvent(KeyCode::Enter, Modifiers::ALT), Cmd::Newline);
    Ok(editor)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// Ctrl-C or Ctrl-D.
    Closed,
    Failed(String),
}

/// Reads lines off a blocking thread so the chat loop can keep applying
/// replies while the visitor types.
///
/// Each `request` reads exactly one line with the given prompt.
pub struct LineReader {
    prompts: UnboundedSender<String>,
    lines: UnboundedReceiver<InputEvent>,
}

impl LineReader {
    pub fn spawn() -> Self {
        let (prompt_tx, mut prompt_rx) = mpsc::unbounded_channel::<String>();
        let (line_tx, line_rx) = mpsc::unbounded_channel();

        tokio::task::spawn_blocking(move || {
            let mut rl = match rl() {
                Ok(rl) => rl,
                Err(e) => {
                    let _ = line_tx.send(InputEvent::Failed(e.to_string()));
                    return;
                }
            };

            // Ends when the reader is dropped and the prompt channel closes.
            while let Some(prompt) = prompt_rx.blocking_recv() {
                let event = match rl.readline(&prompt) {
                    Ok(line) => {
                        if !line.trim().is_empty() {
                            rl.add_history_entry(line.as_str());
                        }
                        InputEvent::Line(line)
                    }
                    Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => InputEvent::Closed,
                    Err(e) => InputEvent::Failed(e.to_string()),
                };

                let finished = !matches!(event, InputEvent::Line(_));
                if line_tx.send(event).is_err() || finished {
                    break;
                }
            }
            debug!("Line reader stopped");
        });

        Self::from_channels(prompt_tx, line_rx)
    }

    pub fn from_channels(prompts: UnboundedSender<String>, lines: UnboundedReceiver<InputEvent>) -> Self {
        Self { prompts, lines }
    }

    pub fn request(&self, prompt: String) {
        if self.prompts.send(prompt).is_err() {
            debug!("Line reader is gone, prompt dropped");
        }
    }

    /// Next line from the visitor. Cancel safe.
    pub async fn next(&mut self) -> Option<InputEvent> {
        self.lines.recv().await
    }
}
