/// Placeholder replaced by the customer excerpt.
pub const CONVERSATION_PLACEHOLDER: &str = "{conversation_text}";

/// Default instruction template. The model must answer with a bare JSON object
/// carrying exactly `sentiment`, `score` and `summary`.
pub const SENTIMENT_PROMPT_TEMPLATE: &str = r#"
You are a contact center quality analyst.

You will be given ONLY the customer's messages from a conversation with an agent.

Classify the OVERALL sentiment of the CUSTOMER as one of:
- positive
- neutral
- negative

Return ONLY valid JSON in this exact format, nothing else:

{
  "sentiment": "positive" or "neutral" or "negative",
  "score": 0.0 to 1.0,
  "summary": "one short sentence explaining why"
}

Customer messages:
{conversation_text}
"#;

/// Embed the excerpt into the template.
pub fn render_prompt(template: &str, conversation_text: &str) -> String {
    template.replace(CONVERSATION_PLACEHOLDER, conversation_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_has_placeholder_once() {
        assert_eq!(SENTIMENT_PROMPT_TEMPLATE.matches(CONVERSATION_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn render_embeds_excerpt() {
        let prompt = render_prompt(SENTIMENT_PROMPT_TEMPLATE, "I want a refund\nNow");
        assert!(prompt.contains("Customer messages:\nI want a refund\nNow"));
        assert!(!prompt.contains(CONVERSATION_PLACEHOLDER));
        assert!(prompt.contains("\"sentiment\""));
        assert!(prompt.contains("\"score\""));
        assert!(prompt.contains("\"summary\""));
    }

    #[test]
    fn render_leaves_excerpt_braces_alone() {
        let prompt = render_prompt("Text: {conversation_text}", "order {42}");
        assert_eq!(prompt, "Text: order {42}");
    }
}
