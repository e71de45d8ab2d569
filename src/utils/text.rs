//! Cleanup applied to Slack message text before it reaches the model.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static UNICODE_EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\p{Extended_Pictographic}\p{Emoji_Modifier}\u{1F1E6}-\u{1F1FF}\u{FE0F}\u{200D}\u{20E3}]",
    )
    .unwrap_or_else(|e| panic!("invalid emoji regex: {e}"))
});

static CUSTOM_EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":[-_a-zA-Z0-9]*[-_a-zA-Z][-_a-zA-Z0-9]*:").unwrap_or_else(|e| panic!("invalid custom emoji regex: {e}"))
});

static USER_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<@([A-Z0-9]+)(?:\|[^>]*)?>").unwrap_or_else(|e| panic!("invalid mention regex: {e}"))
});

static CHANNEL_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<#[A-Z0-9]+(?:\|[^>]*)?>").unwrap_or_else(|e| panic!("invalid channel regex: {e}"))
});

/// Remove Unicode emoji and Slack `:custom_emoji:` codes.
#[must_use]
pub fn strip_emoji(text: &str) -> String {
    let without_unicode = UNICODE_EMOJI.replace_all(text, "");
    CUSTOM_EMOJI.replace_all(&without_unicode, "").into_owned()
}

/// User ids mentioned as `<@U123>` in `text`, in order of appearance.
#[must_use]
pub fn mentioned_user_ids(text: &str) -> Vec<String> {
    USER_MENTION
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Replace `<@U123>` mentions with `@name`, keeping the raw id when no name is known.
#[must_use]
pub fn replace_user_mentions(text: &str, names: &HashMap<String, String>) -> String {
    USER_MENTION
        .replace_all(text, |caps: &Captures| {
            let id = &caps[1];
            let name = names.get(id).map_or(id, String::as_str);
            format!("@{name}")
        })
        .into_owned()
}

/// Hide references to other channels.
#[must_use]
pub fn replace_channel_refs(text: &str) -> String {
    CHANNEL_REF.replace_all(text, " other channel ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_custom_emoji() {
        assert_eq!(strip_emoji("Hello, world! :smile: :wave:"), "Hello, world!  ");
        assert_eq!(strip_emoji("ship it :+1:"), "ship it :+1:");
    }

    #[test]
    fn test_strip_unicode_emoji() {
        assert_eq!(strip_emoji("done 🎉 thanks 👍🏽"), "done  thanks ");
        assert_eq!(strip_emoji("family 👨‍👩‍👧 flag 🇯🇵"), "family  flag ");
    }

    #[test]
    fn test_strip_keeps_plain_text_and_digits() {
        assert_eq!(strip_emoji("release 1.2.3 at 10:30"), "release 1.2.3 at 10:30");
        assert_eq!(strip_emoji("deploy at 10:30:45 :rocket:"), "deploy at 10:30:45 ");
        assert_eq!(strip_emoji("日本語のテキスト"), "日本語のテキスト");
    }

    #[test]
    fn test_mentions_are_collected_and_replaced() {
        let text = "Hi <@U1234>, ping <@U5678|bob> and <@U9999>";
        assert_eq!(mentioned_user_ids(text), vec!["U1234", "U5678", "U9999"]);

        let mut names = HashMap::new();
        names.insert("U1234".to_string(), "Alice".to_string());
        names.insert("U5678".to_string(), "Bob".to_string());

        assert_eq!(
            replace_user_mentions(text, &names),
            "Hi @Alice, ping @Bob and @U9999"
        );
    }

    #[test]
    fn test_channel_refs_are_hidden() {
        assert_eq!(
            replace_channel_refs("see <#C0123> and <#C999|random>"),
            "see  other channel  and  other channel "
        );
    }
}
