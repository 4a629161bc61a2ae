use serde::{Deserialize, Serialize};

/// Role label that marks a message as customer-authored.
pub const CUSTOMER_ROLE: &str = "customer";

/// One conversation as loaded from the input table.
///
/// Immutable once loaded; the pipeline only ever borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Free-text speaker label ("customer", "agent", ...).
    pub role: String,
    /// Raw message text; may contain embedded line breaks.
    pub text: String,
}

impl Conversation {
    pub fn new(conversation_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            messages,
        }
    }
}

impl Message {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            text: text.into(),
        }
    }

    /// Case-insensitive match against the customer role label.
    pub fn is_customer(&self) -> bool {
        self.role.to_lowercase() == CUSTOMER_ROLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_role_is_case_insensitive() {
        assert!(Message::new("Customer", "hi").is_customer());
        assert!(Message::new("CUSTOMER", "hi").is_customer());
        assert!(!Message::new("agent", "hi").is_customer());
        assert!(!Message::new("customer ", "hi").is_customer());
    }
}
