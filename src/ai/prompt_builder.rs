use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};

fn text_message(role: MessageRole, text: String) -> ChatCompletionMessage {
    ChatCompletionMessage {
        role,
        content: Content::Text(text),
        name: None,
        tool_calls: None,
        tool_call_id: None,
    }
}

/// Instructions for the model: summarize by topic, in `language` only.
#[must_use]
pub fn system_prompt(language: &str) -> String {
    [
        "You summarize chat logs by subject.".to_string(),
        "Focus on the topics of the conversation rather than on what each person did.".to_string(),
        "The chat log has one message per line in the format \"Speaker: Message\".".to_string(),
        "A literal `\\n` inside a message stands for a line break.".to_string(),
        format!("The user understands {language} only, so always reply in {language}."),
    ]
    .join("\n")
}

/// The request wrapped around one batch of rendered chat lines.
#[must_use]
pub fn user_prompt(chat_log: &str, language: &str) -> String {
    [
        format!("Summarize the meaning of the following chat log as a flat bullet list in {language}."),
        "Group by topic; do not summarize line by line.".to_string(),
        "Leave out greetings, salutations and polite expressions.".to_string(),
        "Keep it easy to read.".to_string(),
        format!("Write in {language}."),
        "Chat log:".to_string(),
        chat_log.to_string(),
    ]
    .join("\n")
}

/// Build the complete prompt as chat messages ready for the `OpenAI` request.
#[must_use]
pub fn build_prompt(chat_log: &str, language: &str) -> Vec<ChatCompletionMessage> {
    vec![
        text_message(MessageRole::system, system_prompt(language)),
        text_message(MessageRole::user, user_prompt(chat_log, language)),
    ]
}
