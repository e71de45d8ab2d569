use slack_morphism::SlackHistoryMessage;

/// Keep only messages written by people: drops bot posts, join/leave and other
/// subtyped system messages, and messages without any text.
#[must_use]
pub fn filter_user_messages(messages: Vec<SlackHistoryMessage>) -> Vec<SlackHistoryMessage> {
    messages
        .into_iter()
        .filter(|msg| {
            let is_user_message = msg.sender.user.is_some() && msg.sender.bot_id.is_none();
            let is_system_message = msg.subtype.is_some();
            let has_text = msg
                .content
                .text
                .as_deref()
                .is_some_and(|text| !text.trim().is_empty());

            is_user_message && !is_system_message && has_text
        })
        .collect()
}
