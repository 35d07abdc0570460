use std::time::{Duration, Instant};

/// How long a one-off message stays in the status bar
pub const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Transient status bar message
///
/// A message hides after [`STATUS_MESSAGE_TIMEOUT`] or as soon as playback
/// input arrives, letting the step counter show through again.
#[derive(Debug, Default)]
pub struct StatusLine {
    message: Option<(String, Instant)>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, message: impl Into<String>) {
        self.set_at(message, Instant::now());
    }

    fn set_at(&mut self, message: impl Into<String>, now: Instant) {
        self.message = Some((message.into(), now));
    }

    pub fn clear(&mut self) {
        self.message = None;
    }

    /// Message to show at `now`, if it has not expired
    pub fn current(&self, now: Instant) -> Option<&str> {
        self.message
            .as_ref()
            .filter(|(_, since)| now.saturating_duration_since(*since) < STATUS_MESSAGE_TIMEOUT)
            .map(|(message, _)| message.as_str())
    }
}
