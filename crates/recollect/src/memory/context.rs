//! Bounded conversation context window
//!
//! Keeps an ordered buffer of per-turn summaries, each compressed by one
//! oracle call, under a fixed byte budget. Admission appends at the tail
//! and evicts FIFO from the head until the newcomer fits; an entry larger
//! than the whole budget is truncated to the budget before admission.

use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::memory::prompts::{COMPRESS_PROMPT, SYSTEM_INSTRUCTION};
use crate::oracle::{Oracle, extract_block};

/// Sampling temperature for the compression round.
const COMPRESSION_TEMPERATURE: f32 = 0.2;

/// One compressed, sized summary of a conversation turn.
///
/// Entries are immutable once created; `size` is the byte length of
/// `text` at admission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    /// Who spoke (user name, assistant label)
    pub actor: String,
    /// Compressed summary of the turn
    pub text: String,
    /// Byte size of `text`
    pub size: usize,
}

impl ContextEntry {
    fn new(actor: &str, text: String) -> Self {
        let size = text.len();
        Self {
            actor: actor.to_string(),
            text,
            size,
        }
    }
}

/// Size-bounded FIFO window of compressed turn summaries.
///
/// Invariant: the total byte size of all entries never exceeds the budget
/// after any mutation completes.
pub struct ContextWindow {
    oracle: Arc<dyn Oracle>,
    entries: VecDeque<ContextEntry>,
    total_size: usize,
    budget: usize,
}

impl ContextWindow {
    /// Create an empty window with the given byte budget.
    pub fn new(budget: usize, oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            entries: VecDeque::new(),
            total_size: 0,
            budget,
        }
    }

    /// Compress the latest turn and admit it to the window.
    ///
    /// One oracle call distills the raw turn against the rendered context
    /// so far. An unavailable oracle, a missing block, or an empty
    /// summary all leave the window unchanged.
    pub async fn add_turn(&mut self, actor: &str, raw_text: &str) {
        let prompt = COMPRESS_PROMPT
            .replace("{context}", &self.render())
            .replace("{turn}", raw_text);

        let reply = match self
            .oracle
            .complete(&prompt, SYSTEM_INSTRUCTION, COMPRESSION_TEMPERATURE)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    "Oracle {} unavailable for compression: {}",
                    self.oracle.name(),
                    e
                );
                return;
            }
        };

        let Some(summary) = extract_block(&reply, "context") else {
            debug!("No context block in compression reply, turn discarded");
            return;
        };
        if summary.is_empty() {
            debug!("Turn compressed to nothing, no entry admitted");
            return;
        }

        self.admit(ContextEntry::new(actor, summary));
    }

    /// Admit an entry, evicting from the head until it fits.
    fn admit(&mut self, mut entry: ContextEntry) {
        if entry.size > self.budget {
            entry.text = truncate_to_boundary(&entry.text, self.budget);
            entry.size = entry.text.len();
            debug!(
                "Oversized entry truncated to {} bytes for actor {}",
                entry.size, entry.actor
            );
        }

        while self.total_size + entry.size > self.budget {
            match self.entries.pop_front() {
                Some(evicted) => self.total_size -= evicted.size,
                None => break,
            }
        }

        self.total_size += entry.size;
        self.entries.push_back(entry);
    }

    /// Render the window as `actor:text` lines, oldest first.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}:{}", e.actor, e.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Total byte size of all entries.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// The configured byte budget.
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Number of entries in the window.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the window holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ContextEntry> {
        self.entries.iter()
    }
}

/// Truncate to at most `max` bytes without splitting a UTF-8 character.
fn truncate_to_boundary(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}
