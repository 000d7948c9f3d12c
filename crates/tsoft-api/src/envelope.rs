// Uniform result wrapper returned by every client operation.

use serde::Serialize;

/// Outcome of an upstream operation.
///
/// `success == false` means the caller should look at `messages`. `data`
/// may be absent or partially populated even on success; the upstream is
/// not strict about either.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub messages: Vec<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            messages: Vec::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            messages: vec![message.into()],
        }
    }

    /// Append a message, keeping success and data untouched.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    pub fn first_message(&self) -> Option<&str> {
        self.messages.first().map(String::as_str)
    }

    /// All messages joined for display.
    pub fn message_text(&self) -> String {
        self.messages.join("; ")
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            success: self.success,
            data: self.data.map(f),
            messages: self.messages,
        }
    }

    /// Convert into a `Result` for callers that want `?`.
    ///
    /// A successful envelope without data is treated as an error because
    /// there is nothing to hand back.
    pub fn into_result(self) -> Result<T, Vec<String>> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) if self.messages.is_empty() => Err(vec!["No data returned".into()]),
            (_, _) => Err(self.messages),
        }
    }
}

impl Envelope<()> {
    /// Result of a call whose only outcome is whether it went through.
    pub fn done(success: bool) -> Self {
        Self {
            success,
            data: success.then_some(()),
            messages: Vec::new(),
        }
    }
}
