use serde::{Deserialize, Serialize};

/// Error code recorded when a reply arrived but held no usable JSON object.
pub const JSON_PARSE_FAILED: &str = "json_parse_failed";

/// Error code for a retry loop that exited without producing a result.
/// Indicates a control-flow bug if it ever shows up in output.
pub const UNEXPECTED_FALLTHROUGH: &str = "unexpected_fallthrough";

/// Per-conversation outcome of one inference call (all attempts included).
///
/// Steady-state shapes:
/// - success: `sentiment` present, `error` absent
/// - transport failure: `error` holds the failure description, no raw output
/// - parse failure: `raw_model_output` present, `error` = [`JSON_PARSE_FAILED`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub conversation_id: String,
    pub sentiment: Option<String>,
    pub score: Option<f64>,
    pub summary: Option<String>,
    pub raw_model_output: Option<String>,
    pub attempts: u32,
    pub latency_sec: f64,
    pub error: Option<String>,
}

impl SentimentResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub(crate) fn failure(
        conversation_id: &str,
        error: impl Into<String>,
        raw_model_output: Option<String>,
        attempts: u32,
        latency_sec: f64,
    ) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            sentiment: None,
            score: None,
            summary: None,
            raw_model_output,
            attempts,
            latency_sec,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_has_no_sentiment_fields() {
        let r = SentimentResult::failure("c1", JSON_PARSE_FAILED, Some("nope".into()), 1, 0.5);
        assert!(!r.is_success());
        assert!(r.sentiment.is_none());
        assert!(r.score.is_none());
        assert!(r.summary.is_none());
        assert_eq!(r.raw_model_output.as_deref(), Some("nope"));
        assert_eq!(r.error.as_deref(), Some("json_parse_failed"));
    }

    #[test]
    fn serializes_absent_fields_as_null() {
        let r = SentimentResult::failure("c1", "boom", None, 2, 1.0);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["conversation_id"], "c1");
        assert!(json["sentiment"].is_null());
        assert!(json["raw_model_output"].is_null());
        assert_eq!(json["attempts"], 2);
        assert_eq!(json["error"], "boom");
    }
}
