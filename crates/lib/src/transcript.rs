//! Conversation transcript: ordered turns (user/assistant/system) as delivered by the backend.
//!
//! The transcript is only ever replaced wholesale from a server response; the one local
//! append is the fallback assistant turn written when a chat request fails. Rendering
//! helpers split content into lines and inline back-tick code spans.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Who authored a turn. Unknown role strings are kept verbatim and rendered like assistant turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    System,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Other(s) => s.as_str(),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Role::User)
    }
}

/// A turn with no role decodes as an empty unknown role rather than failing the transcript.
impl Default for Role {
    fn default() -> Self {
        Role::Other(String::new())
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "system" => Role::System,
            _ => Role::Other(s),
        }
    }
}

impl From<Role> for String {
    fn from(r: Role) -> Self {
        match r {
            Role::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// A single transcript entry. `timestamp` is an ISO-8601 instant when the backend sent one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            timestamp: None,
        }
    }

    /// Assistant turn stamped with the current UTC instant (locally synthesized turns).
    pub fn assistant_now(content: impl Into<String>) -> Self {
        Self {
            timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            ..Self::assistant(content)
        }
    }

    /// Content laid out as lines of prose/code segments.
    pub fn layout(&self) -> Vec<Vec<Segment<'_>>> {
        layout(&self.content)
    }

    /// Local `HH:MM` for display, or None when the timestamp is absent or unparseable.
    pub fn display_time(&self) -> Option<String> {
        self.timestamp.as_deref().and_then(format_clock)
    }
}

/// Ordered list of turns for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every turn with the server-delivered list.
    pub fn replace(&mut self, turns: Vec<Turn>) {
        self.turns = turns;
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

/// A run of prose or an inline fixed-width span (back-ticks stripped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Prose(&'a str),
    Code(&'a str),
}

impl<'a> Segment<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Segment::Prose(s) | Segment::Code(s) => s,
        }
    }
}

fn code_span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`[^`]+`").expect("static regex"))
}

/// Split one line into prose and code segments. Empty prose runs are dropped;
/// an unmatched back-tick stays in prose.
pub fn segments(line: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0;
    for m in code_span_re().find_iter(line) {
        if m.start() > last {
            out.push(Segment::Prose(&line[last..m.start()]));
        }
        out.push(Segment::Code(&line[m.start() + 1..m.end() - 1]));
        last = m.end();
    }
    if last < line.len() {
        out.push(Segment::Prose(&line[last..]));
    }
    out
}

/// Split content on line breaks; each line becomes its own block of segments, in order.
/// Blank lines are kept as empty blocks so paragraph spacing survives.
pub fn layout(content: &str) -> Vec<Vec<Segment<'_>>> {
    content.split('\n').map(segments).collect()
}

fn format_clock(ts: &str) -> Option<String> {
    let ts = ts.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Local).format("%H:%M").to_string());
    }
    // Backend emits naive local time (no offset) for the turns it records.
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|dt| dt.format("%H:%M").to_string())
}
