//! Append-only transcript of processed tokens
//!
//! The user-visible record of the session: one line per inbound token, one
//! per outbound activation, and notices such as the connection closing.
//! Distinct from tracing output, which is diagnostic.

use chrono::{DateTime, Utc};
use jukebox_common::Token;

/// What a transcript line records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Token delivered by the stream
    Inbound(Token),
    /// Token activated locally and transmitted
    Outbound(Token),
    /// Session notice (connection closed, stream unsupported, ...)
    Notice(String),
}

/// One transcript line
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub at: DateTime<Utc>,
    pub kind: EntryKind,
}

impl TranscriptEntry {
    /// Render for the terminal
    pub fn render(&self) -> String {
        let time = self.at.format("%H:%M:%S");
        match &self.kind {
            EntryKind::Inbound(token) => format!("{} < {}", time, token),
            EntryKind::Outbound(token) => format!("{} > {}", time, token),
            EntryKind::Notice(text) => format!("{} *** {} ***", time, text),
        }
    }
}

/// Append-only list of entries, optionally echoed to stdout
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    echo: bool,
}

impl Transcript {
    /// Silent transcript (entries are only recorded)
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript that also prints every entry as it is appended
    pub fn echoing() -> Self {
        Self {
            entries: Vec::new(),
            echo: true,
        }
    }

    pub fn inbound(&mut self, token: &Token) {
        self.push(EntryKind::Inbound(token.clone()));
    }

    pub fn outbound(&mut self, token: &Token) {
        self.push(EntryKind::Outbound(token.clone()));
    }

    pub fn notice(&mut self, text: impl Into<String>) {
        self.push(EntryKind::Notice(text.into()));
    }

    fn push(&mut self, kind: EntryKind) {
        let entry = TranscriptEntry {
            at: Utc::now(),
            kind,
        };
        if self.echo {
            println!("{}", entry.render());
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
