//! Diagnostics buffer
//!
//! Collects the text reported to the user when a session ends with a
//! non-zero result: abort reasons and the diagnostics of the last snapshot.

/// Append-only diagnostics text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsBuffer {
    text: String,
}

impl DiagnosticsBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one diagnostic, keeping entries on separate lines
    pub fn append(&mut self, diagnostic: &str) {
        if diagnostic.is_empty() {
            return;
        }
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(diagnostic);
    }

    pub fn extend<'a>(&mut self, diagnostics: impl IntoIterator<Item = &'a String>) {
        for diagnostic in diagnostics {
            self.append(diagnostic);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}
