use crossterm::style::Stylize;
use eyre::Result;
use regex::Regex;

use super::conversation_state::{Message, Role};

/// Renders the Markdown subset the assistant is allowed to use (bold,
/// bullet and numbered lists, headings, inline code) for a terminal.
pub struct MarkdownRenderer {
    bold: Regex,
    code: Regex,
    bullet: Regex,
    numbered: Regex,
    heading: Regex,
}

impl MarkdownRenderer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            bold: Regex::new(r"\*\*([^*]+)\*\*|__([^_]+)__")?,
            code: Regex::new(r"`([^`]+)`")?,
            bullet: Regex::new(r"^(\s*)[-*+]\s+(.*)$")?,
            numbered: Regex::new(r"^(\s*)(\d+)[.)]\s+(.*)$")?,
            heading: Regex::new(r"^#{1,6}\s+(.*)$")?,
        })
    }

    pub fn render(&self, text: &str) -> String {
        text.lines()
            .map(|line| self.render_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_line(&self, line: &str) -> String {
        if let Some(caps) = self.heading.captures(line) {
            return self.inline(&caps[1]).bold().to_string();
        }
        if let Some(caps) = self.bullet.captures(line) {
            return format!("{}  • {}", &caps[1], self.inline(&caps[2]));
        }
        if let Some(caps) = self.numbered.captures(line) {
            return format!("{}  {}. {}", &caps[1], &caps[2], self.inline(&caps[3]));
        }
        self.inline(line)
    }

    fn inline(&self, text: &str) -> String {
        let text = self.bold.replace_all(text, |caps: &regex::Captures| {
            let inner = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            inner.bold().to_string()
        });
        self.code
            .replace_all(&text, |caps: &regex::Captures| caps[1].cyan().to_string())
            .into_owned()
    }

    /// Formats one message for the transcript. Visitor text is shown verbatim.
    pub fn message(&self, message: &Message) -> String {
        match message.role() {
            Role::Visitor => format!("{} {}", "you ›".dark_grey(), message.text()),
            Role::Assistant => {
                format!("{} {}", "assistant ›".magenta().bold(), self.render(message.text()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_markers_are_consumed() {
        let renderer = MarkdownRenderer::new().unwrap();
        let rendered = renderer.render("I built **Echo** and __QueryVerse__.");
        assert!(rendered.contains("Echo"));
        assert!(rendered.contains("QueryVerse"));
        assert!(!rendered.contains("**"));
        assert!(!rendered.contains("__"));
    }

    #[test]
    fn lists_become_bullets() {
        let renderer = MarkdownRenderer::new().unwrap();
        let rendered = renderer.render("Skills:\n- Python\n* Rust\n1. Java\n2) C");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Skills:");
        assert_eq!(lines[1], "  • Python");
        assert_eq!(lines[2], "  • Rust");
        assert_eq!(lines[3], "  1. Java");
        assert_eq!(lines[4], "  2. C");
    }

    #[test]
    fn visitor_text_is_not_interpreted() {
        let renderer = MarkdownRenderer::new().unwrap();
        let rendered = renderer.message(&Message::visitor("- **raw**"));
        assert!(rendered.ends_with("- **raw**"));
    }
}
