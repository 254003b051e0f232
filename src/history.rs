//! Bounded conversation history.
//!
//! A FIFO of the last exchanged utterances, used for diagnostics and
//! response shaping only — command resolution never consults it.

use chrono::{DateTime, Local};
use std::collections::VecDeque;

/// Default number of turns retained before eviction.
pub const MAX_TURNS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub text: String,
    pub speaker: Speaker,
    pub timestamp: DateTime<Local>,
}

/// Append-only bounded log; oldest turn dropped first. Never persisted.
#[derive(Debug)]
pub struct ConversationLog {
    turns: VecDeque<ConversationTurn>,
    max_turns: usize,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::bounded(MAX_TURNS)
    }

    pub fn bounded(max_turns: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_turns),
            max_turns,
        }
    }

    pub fn append(&mut self, speaker: Speaker, text: impl Into<String>) {
        while self.turns.len() >= self.max_turns {
            if self.turns.pop_front().is_none() {
                break;
            }
        }
        self.turns.push_back(ConversationTurn {
            text: text.into(),
            speaker,
            timestamp: Local::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.back()
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}
