use crate::core::models::Channel;

/// Leading decimal number of a channel name, if any (`"01_general"` → `Some(1)`).
fn numeric_prefix(name: &str) -> Option<u64> {
    let digits: String = name.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Order channels so that numerically prefixed names come first, by number, then everything else by name.
pub fn sort_by_numeric_prefix(channels: &mut [Channel]) {
    channels.sort_by(|a, b| {
        let key_a = (numeric_prefix(&a.name).is_none(), numeric_prefix(&a.name));
        let key_b = (numeric_prefix(&b.name).is_none(), numeric_prefix(&b.name));
        key_a.cmp(&key_b).then_with(|| a.name.cmp(&b.name))
    });
}
