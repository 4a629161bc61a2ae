//! Best-effort recovery of the sentiment JSON object from a free-text reply.
//!
//! Small local models wrap their answer in code fences, add prose around it,
//! or leave a trailing comma before the closing brace. The repairs here cover
//! those cases; anything that still fails strict JSON parsing yields `None`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Fields read from the model's JSON reply. Missing keys stay `None`;
/// label membership and score range are not checked here.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSentiment {
    pub sentiment: Option<String>,
    pub score: Option<f64>,
    pub summary: Option<String>,
}

static LEADING_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[a-zA-Z0-9]*").expect("valid regex"));
static TRAILING_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```$").expect("valid regex"));
static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid regex"));

/// Parse a model reply into a [`ParsedSentiment`].
///
/// Never panics. Returns `None` for empty input, for text that is not a JSON
/// object after repair, and for JSON values that are not objects.
pub fn parse_sentiment_reply(raw: &str) -> Option<ParsedSentiment> {
    let object = extract_json_object(raw)?;
    Some(ParsedSentiment {
        sentiment: object.get("sentiment").and_then(value_as_text),
        score: object.get("score").and_then(value_as_score),
        summary: object.get("summary").and_then(value_as_text),
    })
}

/// Apply the repair steps and strictly parse what is left.
pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
    let mut text = raw.trim().to_string();
    if text.is_empty() {
        return None;
    }

    // 1. Strip ``` / ```json fences
    if text.starts_with("```") {
        text = LEADING_FENCE_RE.replace(&text, "").trim().to_string();
        text = TRAILING_FENCE_RE.replace(&text, "").trim().to_string();
    }

    // 2. Drop prose around the outermost braces
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            text = text[start..=end].to_string();
        }
    }

    // 3. Trailing commas before } or ]
    let text = TRAILING_COMMA_RE.replace_all(&text, "$1");

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn value_as_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
