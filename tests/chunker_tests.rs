use chrono::Utc;
use slack_summarizer::ai::{CharRatioEstimator, HeuristicEstimator, TokenEstimator};
use slack_summarizer::core::models::{ChatMessage, MessageBatch};
use slack_summarizer::pipeline::chunk;

fn msg(speaker: &str, text: &str) -> ChatMessage {
    ChatMessage::new(speaker, text, Utc::now())
}

fn conversation() -> Vec<ChatMessage> {
    vec![
        msg("A", "hi"),
        msg("B", "hello"),
        msg("A", "how are you"),
        msg("B", "I'm doing well, thanks."),
    ]
}

fn flatten(batches: &[MessageBatch]) -> Vec<ChatMessage> {
    batches
        .iter()
        .flat_map(|b| b.messages().iter().cloned())
        .collect()
}

#[test]
fn test_budget_fitting_two_lines_yields_two_batches() {
    let one_per_line = |_: &str| 1usize;

    let batches = chunk(conversation(), 2, &one_per_line);

    assert_eq!(batches.len(), 2);
    let lines: Vec<Vec<String>> = batches
        .iter()
        .map(|b| b.messages().iter().map(ChatMessage::render_line).collect())
        .collect();
    assert_eq!(lines[0], vec!["A: hi", "B: hello"]);
    assert_eq!(lines[1], vec!["A: how are you", "B: I'm doing well, thanks."]);
}

#[test]
fn test_oversized_message_is_isolated_between_small_ones() {
    let by_len = |line: &str| line.len();
    let input = vec![msg("A", "short"), msg("B", &"x".repeat(200)), msg("C", "tiny")];

    let batches = chunk(input, 50, &by_len);

    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].messages()[0].speaker, "A");
    assert_eq!(batches[1].len(), 1);
    assert_eq!(batches[1].messages()[0].speaker, "B");
    assert!(batches[1].is_oversized(50));
    assert_eq!(batches[2].messages()[0].speaker, "C");
}

#[test]
fn test_empty_input_yields_no_batches() {
    let batches = chunk(Vec::new(), 100, &HeuristicEstimator);
    assert!(batches.is_empty());
}

#[test]
fn test_batches_reconstruct_input_in_order() {
    let input: Vec<ChatMessage> = (0..200)
        .map(|i| msg(&format!("user{}", i % 7), &"word ".repeat(i % 37 + 1)))
        .collect();

    for budget in [1, 5, 17, 64, 500, 10_000] {
        let batches = chunk(input.clone(), budget, &HeuristicEstimator);
        assert_eq!(flatten(&batches), input, "budget {budget}");
        assert!(batches.iter().all(|b| !b.is_empty()));
    }
}

#[test]
fn test_multi_message_batches_respect_budget() {
    let input: Vec<ChatMessage> = (0..150)
        .map(|i| msg("someone", &"lorem ipsum ".repeat(i % 23 + 1)))
        .collect();

    for budget in [3, 10, 40, 120] {
        let batches = chunk(input.clone(), budget, &HeuristicEstimator);
        for batch in &batches {
            if batch.len() > 1 {
                assert!(batch.estimated_tokens() <= budget, "budget {budget}");
            } else if batch.is_oversized(budget) {
                let own = HeuristicEstimator.estimate(&batch.messages()[0].render_line());
                assert!(own > budget);
            }
        }
    }
}

#[test]
fn test_estimators_agreeing_on_costs_give_same_boundaries() {
    let input = conversation();
    let table = |line: &str| -> usize {
        match line {
            "A: hi" => 2,
            "B: hello" => 3,
            "A: how are you" => 4,
            _ => 5,
        }
    };
    let same_costs_differently = |line: &str| -> usize {
        if line.ends_with("hi") {
            2
        } else if line.ends_with("hello") {
            3
        } else if line.contains("how") {
            4
        } else {
            5
        }
    };

    let a = chunk(input.clone(), 7, &table);
    let b = chunk(input, 7, &same_costs_differently);

    let sizes = |batches: &[MessageBatch]| batches.iter().map(MessageBatch::len).collect::<Vec<_>>();
    assert_eq!(sizes(a.as_slice()), sizes(b.as_slice()));
    assert_eq!(sizes(a.as_slice()), vec![2, 1, 1]);
}

#[test]
fn test_multiline_message_stays_on_one_line() {
    let batches = chunk(
        vec![msg("A", "line one\nline two"), msg("B", "ok")],
        1_000,
        &CharRatioEstimator,
    );

    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].render(), "A: line one\\nline two\nB: ok");
}
