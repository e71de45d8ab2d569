//! Token-budgeted batching of chat messages.

use tracing::{debug, warn};

use crate::ai::tokens::TokenEstimator;
use crate::core::models::{ChatMessage, MessageBatch};

/// Split `messages` into consecutive batches whose estimated cost fits `token_budget`.
///
/// Packing is greedy and keeps the input order. A message whose own rendered
/// line already exceeds the budget is emitted alone, never truncated or split.
/// Empty input yields no batches.
pub fn chunk<E>(messages: Vec<ChatMessage>, token_budget: usize, estimator: &E) -> Vec<MessageBatch>
where
    E: TokenEstimator + ?Sized,
{
    let mut batches = Vec::new();
    let mut current: Vec<ChatMessage> = Vec::new();
    let mut current_tokens = 0usize;

    for message in messages {
        let cost = estimator.estimate(&message.render_line());

        if cost > token_budget {
            if !current.is_empty() {
                batches.push(MessageBatch::new(std::mem::take(&mut current), current_tokens));
                current_tokens = 0;
            }
            warn!(
                "Message from {} costs {} tokens, over the {} token budget; sending it alone",
                message.speaker, cost, token_budget
            );
            batches.push(MessageBatch::new(vec![message], cost));
            continue;
        }

        let over_budget = current_tokens
            .checked_add(cost)
            .is_none_or(|total| total > token_budget);
        if over_budget && !current.is_empty() {
            batches.push(MessageBatch::new(std::mem::take(&mut current), current_tokens));
            current_tokens = 0;
        }

        current.push(message);
        current_tokens += cost;
    }

    if !current.is_empty() {
        batches.push(MessageBatch::new(current, current_tokens));
    }

    debug!("Packed messages into {} batches", batches.len());
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn msg(speaker: &str, text: &str) -> ChatMessage {
        ChatMessage::new(speaker, text, Utc::now())
    }

    #[test]
    fn test_batch_cost_is_sum_of_line_costs() {
        let by_len = |line: &str| line.len();
        let batches = chunk(vec![msg("a", "xx"), msg("b", "yyy")], 100, &by_len);

        assert_eq!(batches.len(), 1);
        // "a: xx" + "b: yyy"
        assert_eq!(batches[0].estimated_tokens(), 5 + 6);
    }

    #[test]
    fn test_huge_costs_near_usize_max_do_not_overflow() {
        let huge = |_: &str| usize::MAX / 2 + 1;
        let batches = chunk(vec![msg("a", "x"), msg("b", "y")], usize::MAX, &huge);

        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 1));
    }

    #[test]
    fn test_message_exactly_at_budget_is_not_oversized() {
        let by_len = |line: &str| line.len();
        let batches = chunk(vec![msg("a", "xx")], 5, &by_len);

        assert_eq!(batches.len(), 1);
        assert!(!batches[0].is_oversized(5));
    }

    #[test]
    fn test_oversized_message_first_in_input() {
        let by_len = |line: &str| line.len();
        let batches = chunk(
            vec![msg("a", &"x".repeat(50)), msg("b", "y"), msg("c", "z")],
            10,
            &by_len,
        );

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 1);
        assert!(batches[0].is_oversized(10));
        assert_eq!(batches[1].len(), 2);
    }
}
