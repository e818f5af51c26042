//! Playback queue
//!
//! Unbounded FIFO of tokens waiting to play. The queue only stores tokens;
//! resolving and starting them is the session's drain step.

use std::collections::VecDeque;

use jukebox_common::Token;

#[derive(Debug, Default)]
pub struct PlaybackQueue {
    pending: VecDeque<Token>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push to the tail. Duplicates are kept.
    pub fn append(&mut self, token: Token) {
        self.pending.push_back(token);
    }

    pub fn peek(&self) -> Option<&Token> {
        self.pending.front()
    }

    pub fn pop(&mut self) -> Option<Token> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop everything still waiting; returns how many were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order_with_duplicates() {
        let mut queue = PlaybackQueue::new();
        for t in ["bell", "chime", "bell"] {
            queue.append(Token::from(t));
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek().map(Token::as_str), Some("bell"));

        let order: Vec<String> = std::iter::from_fn(|| queue.pop())
            .map(Token::into_inner)
            .collect();
        assert_eq!(order, vec!["bell", "chime", "bell"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_reports_count() {
        let mut queue = PlaybackQueue::new();
        queue.append(Token::from("bell"));
        queue.append(Token::from(""));

        assert_eq!(queue.clear(), 2);
        assert_eq!(queue.pop(), None);
    }
}
