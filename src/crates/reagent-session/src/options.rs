//! Recognized options for `Get`/`List`/`AppendEvent`.

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Return only the last `n` events.
    pub event_num: Option<usize>,
    /// Return only events with timestamp >= this instant.
    pub event_time: Option<chrono::DateTime<chrono::Utc>>,
    /// On append, if events exceed this cap, drop oldest to restore it.
    pub session_event_limit: Option<usize>,
}

impl SessionOptions {
    pub fn with_event_num(mut self, n: usize) -> Self {
        self.event_num = Some(n);
        self
    }

    pub fn with_event_time(mut self, t: chrono::DateTime<chrono::Utc>) -> Self {
        self.event_time = Some(t);
        self
    }

    pub fn with_session_event_limit(mut self, cap: usize) -> Self {
        self.session_event_limit = Some(cap);
        self
    }
}
