//! Positioned diagnostics reported by plugins.

use std::fmt;
use std::sync::Mutex;

/// A finding at a line and column of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub file: String,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
    pub text: String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}:{} {}", self.file, self.line, self.column, self.text)
    }
}

/// Destination for plugin diagnostics.
pub trait MessageSink: Send + Sync {
    fn emit(&self, message: &Message);
}

/// Writes each message as one line on standard output.
pub struct StdoutSink;

impl MessageSink for StdoutSink {
    fn emit(&self, message: &Message) {
        println!("{message}");
    }
}

/// Keeps messages in memory for later inspection.
#[derive(Default)]
pub struct MemorySink {
    messages: Mutex<Vec<Message>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything emitted so far.
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Drain everything emitted so far.
    pub fn take(&self) -> Vec<Message> {
        self.messages
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }
}

impl MessageSink for MemorySink {
    fn emit(&self, message: &Message) {
        if let Ok(mut guard) = self.messages.lock() {
            guard.push(message.clone());
        }
    }
}
