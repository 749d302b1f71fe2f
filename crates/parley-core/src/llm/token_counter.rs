//! Token accounting for history trimming.
//!
//! What counts as a "token" is provider-specific, so the trimmer takes a
//! `TokenCounter` rather than hard-coding one. The default
//! `ApproxTokenCounter` uses the usual ~4 characters per token heuristic
//! plus a fixed per-message framing overhead.

use parley_types::llm::Message;

/// Measures how much of a budget a message consumes.
pub trait TokenCounter: Send + Sync {
    fn count_message(&self, message: &Message) -> u32;

    fn count_messages(&self, messages: &[Message]) -> u32 {
        messages
            .iter()
            .map(|m| self.count_message(m))
            .fold(0u32, u32::saturating_add)
    }
}

/// Character-based estimate: `overhead + ceil(chars / 4)`.
#[derive(Debug, Clone, Copy)]
pub struct ApproxTokenCounter {
    pub per_message_overhead: u32,
}

impl ApproxTokenCounter {
    pub const DEFAULT_OVERHEAD: u32 = 3;

    pub fn new(per_message_overhead: u32) -> Self {
        Self {
            per_message_overhead,
        }
    }
}

impl Default for ApproxTokenCounter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_OVERHEAD)
    }
}

impl TokenCounter for ApproxTokenCounter {
    fn count_message(&self, message: &Message) -> u32 {
        let chars = message.content.chars().count() as u32;
        self.per_message_overhead
            .saturating_add(chars.div_ceil(4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message_costs_overhead_only() {
        let counter = ApproxTokenCounter::default();
        assert_eq!(counter.count_message(&Message::user("")), 3);
    }

    #[test]
    fn test_rounds_up_partial_tokens() {
        let counter = ApproxTokenCounter::new(0);
        assert_eq!(counter.count_message(&Message::user("abcd")), 1);
        assert_eq!(counter.count_message(&Message::user("abcde")), 2);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let counter = ApproxTokenCounter::new(0);
        // 4 chars, 8 bytes
        assert_eq!(counter.count_message(&Message::user("ññññ")), 1);
    }

    #[test]
    fn test_count_messages_sums() {
        let counter = ApproxTokenCounter::default();
        let messages = vec![Message::user("Hi, my name is Alice."), Message::assistant("Hi Alice!")];
        let expected = counter.count_message(&messages[0]) + counter.count_message(&messages[1]);
        assert_eq!(counter.count_messages(&messages), expected);
    }
}
