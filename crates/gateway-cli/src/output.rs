//! Output formatting utilities for the CLI.

use colored::Colorize;
use gateway_core::ConversationMessage;
use serde::Serialize;
use tabled::Tabled;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Create an output format from a JSON flag.
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Print a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print a key-value pair.
pub fn key_value(key: &str, value: &str) {
    println!("  {}: {}", key.bold(), value);
}

/// Print a section header.
pub fn section(title: &str) {
    println!("\n{}", title.bold().underline());
}

/// Print a status indicator.
pub fn status(label: &str, ok: bool) {
    let indicator = if ok { "●".green() } else { "●".red() };
    println!("  {indicator} {label}");
}

/// Print JSON output.
pub fn json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let output = serde_json::to_string_pretty(value)?;
    println!("{output}");
    Ok(())
}

/// Create a spinner for long-running operations.
pub fn spinner(message: &str) -> indicatif::ProgressBar {
    let spinner = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.blue} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

/// One conversation row.
#[derive(Debug, Tabled)]
pub struct MessageRow {
    #[tabled(rename = "Role")]
    pub role: String,
    #[tabled(rename = "Time")]
    pub timestamp: String,
    #[tabled(rename = "Content")]
    pub content: String,
}

impl From<&ConversationMessage> for MessageRow {
    fn from(message: &ConversationMessage) -> Self {
        Self {
            role: message.role.clone(),
            timestamp: message.timestamp.clone().unwrap_or_else(|| "-".to_string()),
            content: message.content.clone(),
        }
    }
}

/// Print a conversation as a table.
pub fn conversation(messages: &[ConversationMessage]) {
    use tabled::{settings::Style, Table};

    if messages.is_empty() {
        println!("  (no messages)");
        return;
    }

    let rows: Vec<MessageRow> = messages.iter().map(MessageRow::from).collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
}

/// Print the agent's latest reply.
///
/// Replies that are JSON arrays (the extraction agent returns one object per
/// invoice) are printed one item per line.
pub fn agent_reply(messages: &[ConversationMessage]) {
    let Some(last) = messages.last() else {
        println!("  (no messages)");
        return;
    };

    match serde_json::from_str::<serde_json::Value>(&last.content) {
        Ok(serde_json::Value::Array(items)) => {
            for item in items {
                println!("{item}");
            }
        }
        Ok(value) => println!(
            "{}",
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| last.content.clone())
        ),
        Err(_) => println!("{}", last.content),
    }
}

/// JSON body printed when a command fails before the gateway answered.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    /// Always `false`.
    pub success: bool,
    /// Error description.
    pub error: String,
}

impl ErrorReport {
    /// Create a report for an error.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_row() {
        let message = ConversationMessage {
            role: "assistant".to_string(),
            content: "Total: 10.00".to_string(),
            timestamp: None,
        };
        let row = MessageRow::from(&message);
        assert_eq!(row.timestamp, "-");
        assert_eq!(row.role, "assistant");
    }

    #[test]
    fn test_error_report() {
        let report = ErrorReport::new("connection refused");
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"success":false,"error":"connection refused"}"#
        );
    }
}
