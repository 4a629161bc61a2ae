use crate::models::Conversation;

/// Bounds on the excerpt sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExcerptLimits {
    /// Keep only the last N selected messages.
    pub max_customer_messages: usize,
    /// Keep only the last M characters of the joined text.
    pub max_chars: usize,
}

/// Reduce a conversation to a bounded customer-only excerpt.
///
/// Selects messages whose role is "customer" (case-insensitive), falling back to
/// every message when none match. Keeps the tail: the last `max_customer_messages`
/// messages, then the last `max_chars` characters of the newline-joined text.
pub fn format_customer_only(conversation: &Conversation, limits: &ExcerptLimits) -> String {
    let customer: Vec<_> = conversation
        .messages
        .iter()
        .filter(|m| m.is_customer())
        .collect();

    let selected = if customer.is_empty() {
        conversation.messages.iter().collect()
    } else {
        customer
    };

    let skip = selected.len().saturating_sub(limits.max_customer_messages);
    let joined = selected[skip..]
        .iter()
        .map(|m| m.text.replace('\n', " "))
        .collect::<Vec<_>>()
        .join("\n");

    keep_last_chars(joined, limits.max_chars)
}

fn keep_last_chars(text: String, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    text.chars().skip(count - max_chars).collect()
}
