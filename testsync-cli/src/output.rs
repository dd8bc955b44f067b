//! Output formatting utilities

use clap::ValueEnum;
use colored::*;
use serde::Serialize;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
    None,
}

pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn success(&self, message: &str) {
        self.status("success", message, || {
            println!("{} {}", "✓".green().bold(), message)
        });
    }

    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Text => eprintln!("{} {}", "✗".red().bold(), message),
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "status": "error",
                    "message": message
                });
                eprintln!("{}", json);
            }
            OutputFormat::None => {}
        }
    }

    pub fn info(&self, message: &str) {
        self.status("info", message, || {
            println!("{} {}", "ℹ".blue().bold(), message)
        });
    }

    pub fn warning(&self, message: &str) {
        self.status("warning", message, || {
            println!("{} {}", "⚠".yellow().bold(), message)
        });
    }

    /// Structured payload; JSON in both text and JSON modes
    pub fn data<T: Serialize>(&self, data: &T) {
        if self.format == OutputFormat::None {
            return;
        }
        if let Ok(json) = serde_json::to_string_pretty(data) {
            println!("{}", json);
        }
    }

    fn status(&self, status: &str, message: &str, text: impl FnOnce()) {
        match self.format {
            OutputFormat::Text => text(),
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "status": status,
                    "message": message
                });
                println!("{}", json);
            }
            OutputFormat::None => {}
        }
    }
}
