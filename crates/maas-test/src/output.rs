//! Where workflow output goes.

use std::sync::Mutex;

/// Line-oriented sink for user-facing output.
pub trait Output: Send + Sync {
    /// Emit one line.
    fn line(&self, text: &str);
}

/// Writes lines to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl Output for Stdout {
    fn line(&self, text: &str) {
        println!("{text}");
    }
}

/// Keeps lines in memory, for driving workflows programmatically.
#[derive(Debug, Default)]
pub struct Captured {
    lines: Mutex<Vec<String>>,
}

impl Captured {
    /// Lines emitted so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// All lines joined with newlines.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}

impl Output for Captured {
    fn line(&self, text: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(text.to_string());
        }
    }
}
