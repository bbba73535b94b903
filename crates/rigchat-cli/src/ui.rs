use colored::*;
use rigchat_core::{ChatMessage, ChatRole, Mode};

/// Turns successive transcript snapshots into terminal output.
///
/// Assistant text only ever grows, so each call writes just the new suffix.
/// User messages are not echoed; the user already typed them.
#[derive(Debug, Default)]
pub struct TranscriptPrinter {
    printed_messages: usize,
    printed_bytes: usize,
    last_role: Option<ChatRole>,
}

impl TranscriptPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to write for `messages`, given what was written before.
    pub fn render(&mut self, messages: &[ChatMessage]) -> String {
        let mut out = String::new();

        if messages.len() < self.printed_messages {
            // Rolled back after a failed or cancelled reply.
            if self.last_role == Some(ChatRole::Assistant) {
                out.push_str(&format!("\n{}\n", "[reply discarded]".dimmed()));
            }
            self.printed_messages = messages.len();
            self.printed_bytes = messages.last().map(|m| m.content.len()).unwrap_or(0);
            self.last_role = messages.last().map(|m| m.role);
            return out;
        }

        if self.printed_messages > 0 {
            let current = &messages[self.printed_messages - 1];
            if current.role == ChatRole::Assistant && current.content.len() > self.printed_bytes {
                if let Some(suffix) = current.content.get(self.printed_bytes..) {
                    out.push_str(suffix);
                }
                self.printed_bytes = current.content.len();
            }
        }

        for message in &messages[self.printed_messages..] {
            if message.role == ChatRole::Assistant {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&format!("{} {}", "AI:".yellow().bold(), message.content));
            }
            self.printed_messages += 1;
            self.printed_bytes = message.content.len();
            self.last_role = Some(message.role);
        }

        out
    }

    /// Forget what was printed, e.g. after a mode switch re-seeds the chat.
    pub fn restart(&mut self) {
        *self = Self::default();
    }
}

pub fn print_banner(mode: Mode, endpoint: &str) {
    println!("\n{}", "⛏  Rig Shop Assistant".bold().blue());
    println!("{} {}", "Mode:".dimmed(), mode.display_name().green());
    println!("{} {}", "Endpoint:".dimmed(), endpoint.dimmed());
    println!("{}", "Type /help for commands.".dimmed());
    println!("{}", "=".repeat(40).dimmed());
}

pub fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  {}  switch mode (recommendation, order)", "/mode <name>".cyan());
    println!("  {}        start the conversation over", "/reset".cyan());
    println!("  {}         leave", "/quit".cyan());
    println!("  {}", "Ctrl-C while a reply streams cancels it.".dimmed());
}

pub fn print_thinking() {
    println!("{}", "Thinking...".dimmed().italic());
}

pub fn print_error(message: &str) {
    eprintln!("{}: {}", "Error".red().bold(), message);
}

pub fn print_modes(current: Mode) {
    println!("\n{}", "🤖 Assistant modes".bold().blue());
    println!("{}", "=".repeat(30).dimmed());
    for mode in Mode::all() {
        let marker = if mode == current { "*" } else { " " };
        println!(
            "{} {} - {}",
            marker,
            mode.as_str().green(),
            mode.display_name()
        );
    }
}
