use std::time::Duration;

use serde::Deserialize;

use super::types::{GenerateBackend, GenerateRequest};
use super::SentimentError;

/// Ollama HTTP backend for `/api/generate`.
///
/// One instance is shared by every call of a run so requests reuse the
/// same connection pool.
pub struct OllamaBackend {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OllamaBackend {
    /// Create a backend posting to the full generate URL
    /// (e.g. `http://localhost:11434/api/generate`).
    ///
    /// `pool_size` caps idle keep-alive connections; size it to the run's
    /// concurrency limit.
    pub fn new(url: &str, timeout: Duration, pool_size: usize) -> Result<Self, SentimentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(pool_size)
            .build()
            .map_err(|e| SentimentError::HttpClient(e.to_string()))?;

        Ok(Self {
            url: url.trim().to_string(),
            client,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn classify(&self, e: reqwest::Error) -> SentimentError {
        if e.is_connect() {
            SentimentError::OllamaConnection(self.url.clone())
        } else if e.is_timeout() {
            SentimentError::Timeout(self.timeout)
        } else {
            SentimentError::HttpClient(e.to_string())
        }
    }
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

impl GenerateBackend for OllamaBackend {
    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, SentimentError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SentimentError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sentiment::GenerationOptions;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    const OPTIONS: GenerationOptions = GenerationOptions {
        num_predict: 64,
        temperature: 0.2,
    };

    /// Serve `app` on an ephemeral localhost port; returns the generate URL.
    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/generate")
    }

    fn backend(url: &str) -> OllamaBackend {
        OllamaBackend::new(url, Duration::from_secs(5), 4).unwrap()
    }

    #[tokio::test]
    async fn returns_response_field() {
        let app = Router::new().route(
            "/api/generate",
            post(|| async { Json(json!({"model": "llama3.2", "response": "{\"sentiment\":\"neutral\"}", "done": true})) }),
        );
        let url = serve(app).await;

        let text = backend(&url)
            .generate(&GenerateRequest::new("llama3.2", "p", OPTIONS))
            .await
            .unwrap();
        assert_eq!(text, "{\"sentiment\":\"neutral\"}");
    }

    #[tokio::test]
    async fn posts_model_prompt_and_options() {
        let app = Router::new().route(
            "/api/generate",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "response": body.to_string() }))
            }),
        );
        let url = serve(app).await;

        let echoed = backend(&url)
            .generate(&GenerateRequest::new("llama3.2", "classify me", OPTIONS))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&echoed).unwrap();

        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["prompt"], "classify me");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 64);
    }

    #[tokio::test]
    async fn missing_response_field_is_empty_text() {
        let app = Router::new().route("/api/generate", post(|| async { Json(json!({"done": true})) }));
        let url = serve(app).await;

        let text = backend(&url)
            .generate(&GenerateRequest::new("m", "p", OPTIONS))
            .await
            .unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn error_status_is_reported_with_body() {
        let app = Router::new().route(
            "/api/generate",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model runner crashed") }),
        );
        let url = serve(app).await;

        let err = backend(&url)
            .generate(&GenerateRequest::new("m", "p", OPTIONS))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SentimentError::OllamaError {
                status: 500,
                body: "model runner crashed".into()
            }
        );
        assert!(err.to_string().contains("status 500"));
    }

    #[tokio::test]
    async fn non_json_body_is_a_parsing_error() {
        let app = Router::new().route("/api/generate", post(|| async { "definitely not json" }));
        let url = serve(app).await;

        let err = backend(&url)
            .generate(&GenerateRequest::new("m", "p", OPTIONS))
            .await
            .unwrap_err();
        assert!(matches!(err, SentimentError::ResponseParsing(_)));
    }

    #[tokio::test]
    async fn refused_connection_is_reported() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = format!("http://{addr}/api/generate");

        let err = backend(&url)
            .generate(&GenerateRequest::new("m", "p", OPTIONS))
            .await
            .unwrap_err();
        assert_eq!(err, SentimentError::OllamaConnection(url));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let app = Router::new().route(
            "/api/generate",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"response": "late"}))
            }),
        );
        let url = serve(app).await;
        let backend = OllamaBackend::new(&url, Duration::from_millis(200), 1).unwrap();

        let err = backend
            .generate(&GenerateRequest::new("m", "p", OPTIONS))
            .await
            .unwrap_err();
        assert_eq!(err, SentimentError::Timeout(Duration::from_millis(200)));
    }

    #[test]
    fn constructor_keeps_full_url() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();
        let b = OllamaBackend::new(" http://localhost:11434/api/generate ", Duration::from_secs(60), 4)
            .unwrap();
        assert_eq!(b.url(), "http://localhost:11434/api/generate");
    }
}
