pub mod conversation_state;
pub mod prompt;
pub mod render;
pub mod widget;

use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::process::ExitCode;
use std::sync::Arc;

use color_print::cformat;
use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use eyre::Result;
use prompt::{generate_prompt, InputEvent, LineReader};
use render::MarkdownRenderer;
use tracing::debug;
use widget::{ChatWidget, Key, KeyPress, PendingReply, Reply};

use crate::portfolio::{Portfolio, PortfolioContext};

const HELP_TEXT: &str = "
Portfolio Assistant

/open         Open the assistant
/close        Minimize the assistant (pending replies still arrive)
/toggle       Open or minimize the assistant
/context      Show the portfolio context the assistant answers from
/projects     List the showcased projects
/help         Show this help dialogue
/quit         Quit the application

Enter sends your message, Alt-Enter starts a new line.
";

const OFFLINE_TEXT: &str =
    "The assistant is offline. Set GEMINI_API_KEY (or API_KEY) to enable it.";

const MINIMIZED_TEXT: &str = "Assistant minimized. Type /open to bring it back.";

type InFlight = Pin<Box<dyn Future<Output = Reply>>>;

enum Step {
    Reply(Reply),
    Input(Option<InputEvent>),
}

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    widget: ChatWidget,
    portfolio: Arc<Portfolio>,
    context: Arc<PortfolioContext>,
    renderer: MarkdownRenderer,
    shown: usize,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        interactive: bool,
        widget: ChatWidget,
        portfolio: Arc<Portfolio>,
        context: Arc<PortfolioContext>,
    ) -> Result<Self> {
        Ok(Self {
            output,
            input,
            interactive,
            widget,
            portfolio,
            context,
            renderer: MarkdownRenderer::new()?,
            shown: 0,
        })
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        // Handle non-interactive mode (single question)
        if let Some(input) = self.input.take() {
            return self.ask(&input).await;
        }

        if self.interactive {
            self.print_welcome()?;
            // The launcher button: the widget starts closed.
            self.widget.open();
            self.refresh_view(true)?;
            let mut reader = LineReader::spawn();
            self.event_loop(&mut reader).await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    async fn ask(&mut self, question: &str) -> Result<ExitCode> {
        if !self.widget.is_available() {
            writeln!(self.output, "{}", OFFLINE_TEXT)?;
            return Ok(ExitCode::FAILURE);
        }

        self.widget.open();
        self.widget.set_draft(question);
        if !self.widget.send().await {
            writeln!(self.output, "Nothing to send.")?;
            return Ok(ExitCode::FAILURE);
        }

        if let Some(reply) = self.widget.last_message() {
            writeln!(self.output, "{}", self.renderer.render(reply.text()))?;
        }
        Ok(ExitCode::SUCCESS)
    }

    fn print_welcome(&mut self) -> Result<()> {
        let profile = &self.portfolio.profile;
        writeln!(
            self.output,
            "{}",
            cformat!(
                "\n<bold>{}</> <dim>· {} · {}</>",
                profile.name,
                profile.role,
                profile.location
            )
        )?;
        writeln!(
            self.output,
            "{}",
            cformat!("<dim>Portfolio Assistant · answers strictly limited to portfolio context · /help for commands</>\n")
        )?;
        if !self.widget.is_available() {
            writeln!(self.output, "{}\n", OFFLINE_TEXT.yellow())?;
        }
        Ok(())
    }

    /// Runs until the visitor quits. At most one reply is in flight; it is
    /// applied as soon as it settles, whatever the visitor is doing.
    async fn event_loop(&mut self, reader: &mut LineReader) -> Result<()> {
        let mut in_flight: Option<InFlight> = None;
        reader.request(generate_prompt(self.widget.is_open()));

        loop {
            let step = match in_flight.as_mut() {
                Some(pending) => tokio::select! {
                    biased;
                    reply = pending => Step::Reply(reply),
                    event = reader.next() => Step::Input(event),
                },
                None => Step::Input(reader.next().await),
            };

            match step {
                Step::Reply(reply) => {
                    in_flight = None;
                    self.apply_reply(reply)?;
                }
                Step::Input(Some(InputEvent::Line(line))) => {
                    if line.trim() == "/quit" {
                        break;
                    }
                    if let Some(pending) = self.handle_input(&line)? {
                        in_flight = Some(Box::pin(pending.settle()));
                    }
                    reader.request(generate_prompt(self.widget.is_open()));
                }
                Step::Input(Some(InputEvent::Failed(e))) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
                Step::Input(Some(InputEvent::Closed)) | Step::Input(None) => break,
            }
        }

        if in_flight.is_some() {
            debug!("Quitting with a reply still pending");
        }
        Ok(())
    }

    fn handle_input(&mut self, input: &str) -> Result<Option<PendingReply>> {
        match input.trim() {
            "/help" => {
                writeln!(self.output, "{}", HELP_TEXT)?;
            }
            "/open" => {
                let was_open = self.widget.is_open();
                self.widget.open();
                self.refresh_view(!was_open)?;
            }
            "/close" => {
                self.widget.close();
                writeln!(self.output, "{}", MINIMIZED_TEXT)?;
            }
            "/toggle" => {
                self.widget.toggle_open();
                if self.widget.is_open() {
                    self.refresh_view(true)?;
                } else {
                    writeln!(self.output, "{}", MINIMIZED_TEXT)?;
                }
            }
            "/context" => {
                writeln!(self.output, "{}", self.context.as_str())?;
            }
            "/projects" => {
                print_projects(&mut self.output, &self.portfolio)?;
            }
            _ => return self.process_chat_input(input),
        }

        Ok(None)
    }

    /// Types `input` into the widget and presses Enter. Newlines from
    /// Alt-Enter reach the widget as modified Enter presses.
    fn process_chat_input(&mut self, input: &str) -> Result<Option<PendingReply>> {
        if !self.widget.is_open() {
            writeln!(self.output, "The assistant is minimized. Type /open to chat.")?;
            return Ok(None);
        }

        self.widget.set_draft(String::new());
        for c in input.chars() {
            let press = if c == '\n' {
                KeyPress::alt(Key::Enter)
            } else {
                KeyPress::plain(Key::Char(c))
            };
            let _ = self.widget.handle_key(press);
        }

        match self.widget.handle_key(KeyPress::plain(Key::Enter)) {
            Some(pending) => {
                debug!("Waiting for a reply to {} chars", pending.text().len());
                // Show the visitor's message before the reply arrives.
                self.refresh_view(false)?;
                writeln!(self.output, "{}", "assistant is typing…".dark_grey())?;
                self.output.flush()?;
                Ok(Some(pending))
            }
            None if !self.widget.is_available() => {
                writeln!(self.output, "{}", OFFLINE_TEXT.yellow())?;
                Ok(None)
            }
            None if self.widget.is_loading() => {
                writeln!(
                    self.output,
                    "{}",
                    format!(
                        "Still waiting for the assistant's reply; \"{}\" was not sent.",
                        self.widget.draft()
                    )
                    .yellow()
                )?;
                Ok(None)
            }
            None => {
                debug!("Ignoring empty input");
                Ok(None)
            }
        }
    }

    fn apply_reply(&mut self, reply: Reply) -> Result<()> {
        debug!("Reply received ({} chars)", reply.text().len());
        self.widget.complete(reply);
        debug!("Widget state: {:?} {:?}", self.widget.state(), self.widget.ui());

        if self.interactive {
            // The reply lands while the prompt is on screen.
            execute!(self.output, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        }
        if self.widget.is_open() {
            self.refresh_view(false)?;
        } else {
            writeln!(self.output, "New reply from the assistant. Type /open to read it.")?;
        }
        if self.interactive {
            write!(self.output, "{}", generate_prompt(self.widget.is_open()))?;
            self.output.flush()?;
        }
        Ok(())
    }

    /// Prints whatever the widget asked to scroll into view. A full refresh
    /// reprints the transcript, as when the widget is reopened.
    fn refresh_view(&mut self, full: bool) -> Result<()> {
        if !self.widget.take_scroll_request() || !self.widget.is_open() {
            return Ok(());
        }

        let messages = self.widget.messages();
        let start = if full { 0 } else { self.shown.min(messages.len()) };
        for message in &messages[start..] {
            writeln!(self.output, "{}\n", self.renderer.message(message))?;
        }
        self.shown = messages.len();
        self.output.flush()?;
        Ok(())
    }
}

pub fn print_projects(output: &mut dyn Write, portfolio: &Portfolio) -> Result<()> {
    for project in &portfolio.projects {
        writeln!(
            output,
            "{} {}",
            project.title.as_str().bold(),
            format!("({})", project.kind).dark_grey()
        )?;
        writeln!(output, "  {}", project.description)?;
        writeln!(output, "  tech:    {}", project.tech_stack.join(", "))?;
        if let Some(link) = &project.link {
            writeln!(output, "  link:    {}", link)?;
        }
        writeln!(
            output,
            "  scene:   {} ({})\n",
            project.variant(),
            project.color
        )?;
    }
    Ok(())
}
