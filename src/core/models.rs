use chrono::{DateTime, Utc};

/// A channel the bot can read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

impl Channel {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One user message retrieved from a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub speaker: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    #[must_use]
    pub fn new(speaker: impl Into<String>, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            timestamp,
        }
    }

    /// Render as a single `Speaker: Message` line.
    ///
    /// Line breaks inside the text become a literal `\n` so that one message
    /// always occupies exactly one line of the model input.
    #[must_use]
    pub fn render_line(&self) -> String {
        let escaped = self
            .text
            .replace("\r\n", "\\n")
            .replace(['\n', '\r'], "\\n");
        format!("{}: {}", self.speaker, escaped)
    }
}

/// The historical interval a run summarizes. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub(crate) fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start < end);
        Self { start, end }
    }

    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// Consecutive messages submitted to the summarizer together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBatch {
    messages: Vec<ChatMessage>,
    estimated_tokens: usize,
}

impl MessageBatch {
    pub(crate) fn new(messages: Vec<ChatMessage>, estimated_tokens: usize) -> Self {
        debug_assert!(!messages.is_empty());
        Self {
            messages,
            estimated_tokens,
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn estimated_tokens(&self) -> usize {
        self.estimated_tokens
    }

    /// A batch is oversized only when it is a single message whose own cost exceeds the budget.
    #[must_use]
    pub fn is_oversized(&self, token_budget: usize) -> bool {
        self.estimated_tokens > token_budget
    }

    /// The model input for this batch: one rendered line per message.
    #[must_use]
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .map(ChatMessage::render_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The text posted for one channel: a header followed by every fragment in batch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelSummary {
    text: String,
    fragment_count: usize,
}

impl ChannelSummary {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(header: &str, fragments: &[String]) -> Self {
        if fragments.is_empty() {
            return Self::empty();
        }
        let mut text = String::from(header);
        for fragment in fragments {
            text.push_str("\n\n");
            text.push_str(fragment.trim());
        }
        Self {
            text,
            fragment_count: fragments.len(),
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.fragment_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragment_count == 0
    }
}
