use std::future::Future;

use serde::Serialize;

use super::SentimentError;

/// Generation options sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationOptions {
    /// Upper bound on generated tokens.
    pub num_predict: i32,
    /// Kept low for reproducible labels.
    pub temperature: f32,
}

/// Request body for Ollama `/api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: GenerationOptions,
}

impl<'a> GenerateRequest<'a> {
    /// Non-streaming request.
    pub fn new(model: &'a str, prompt: &'a str, options: GenerationOptions) -> Self {
        Self {
            model,
            prompt,
            stream: false,
            options,
        }
    }
}

/// Inference endpoint abstraction (allows mocking).
///
/// Returns the endpoint's `response` text, or an empty string when the field
/// is absent. Every `Err` is treated as retryable by the caller.
pub trait GenerateBackend: Send + Sync {
    fn generate(
        &self,
        request: &GenerateRequest<'_>,
    ) -> impl Future<Output = Result<String, SentimentError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_to_ollama_shape() {
        let options = GenerationOptions {
            num_predict: 64,
            temperature: 0.2,
        };
        let request = GenerateRequest::new("llama3.2", "classify this", options);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["prompt"], "classify this");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 64);
        assert!((json["options"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }
}
