//! History trimming to a token budget.
//!
//! Keep-last strategy: the newest messages win, whole messages only, an
//! optional leading system message is always retained, and the kept window
//! is advanced so that it opens on a message of the configured role
//! (normally `user`) so the model never sees a reply without its prompt.

use parley_types::error::TrimError;
use parley_types::llm::{Message, MessageRole};

use crate::llm::token_counter::TokenCounter;

/// How history is bounded before each model call.
#[derive(Debug, Clone)]
pub struct TrimPolicy {
    pub max_tokens: u32,
    pub include_system: bool,
    pub start_on: MessageRole,
}

impl TrimPolicy {
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            include_system: true,
            start_on: MessageRole::User,
        }
    }
}

/// Bound `messages` to `policy.max_tokens` as measured by `counter`.
///
/// Returns the input unchanged when it already fits. The output is always
/// an order-preserving subsequence of the input, and trimming an already
/// trimmed sequence with the same policy is a no-op.
pub fn trim_messages(
    messages: &[Message],
    policy: &TrimPolicy,
    counter: &dyn TokenCounter,
) -> Result<Vec<Message>, TrimError> {
    let budget = policy.max_tokens;
    if messages.is_empty() || counter.count_messages(messages) <= budget {
        return Ok(messages.to_vec());
    }

    let (system, rest) = match messages.split_first() {
        Some((first, rest)) if policy.include_system && first.role == MessageRole::System => {
            (Some(first), rest)
        }
        _ => (None, messages),
    };

    let system_cost = system.map_or(0, |m| counter.count_message(m));
    if system_cost > budget {
        return Err(TrimError::SystemExceedsBudget {
            required: system_cost,
            budget,
        });
    }
    let available = budget - system_cost;

    // Longest suffix of `rest` that fits.
    let mut start = rest.len();
    let mut used = 0u32;
    for (i, message) in rest.iter().enumerate().rev() {
        let cost = counter.count_message(message);
        if used.saturating_add(cost) > available {
            if i + 1 == rest.len() {
                return Err(TrimError::LatestMessageExceedsBudget {
                    required: cost,
                    available,
                });
            }
            break;
        }
        used += cost;
        start = i;
    }

    let window = &rest[start..];
    let offset = window
        .iter()
        .position(|m| m.role == policy.start_on)
        .ok_or_else(|| TrimError::NoValidStart {
            role: policy.start_on.to_string(),
        })?;

    let mut trimmed = Vec::with_capacity(window.len() - offset + 1);
    trimmed.extend(system.cloned());
    trimmed.extend_from_slice(&window[offset..]);
    Ok(trimmed)
}
