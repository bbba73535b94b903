use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::error::{ChatError, Result};
use crate::request::ChatRequest;

/// Response body as it arrives.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

/// Opens a streamed completion for a request.
///
/// Implemented by [`ChatClient`] over HTTP; tests plug in canned streams.
pub trait Transport: Send + Sync {
    fn open<'a>(&'a self, request: &'a ChatRequest) -> BoxFuture<'a, Result<ByteStream>>;
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            api_key: None,
        }
    }

    pub fn with_connect_timeout(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().connect_timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: None,
        })
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the request and hand back the body as a byte stream.
    pub async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Accept", "text/event-stream")
            .json(request);

        // Managed backends want the key both as bearer token and `apikey`.
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key).header("apikey", key);
        }

        tracing::info!(
            endpoint = %self.endpoint,
            mode = request.mode.as_str(),
            "opening completion stream"
        );
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body: error_message(&text),
            });
        }
        // Chunked bodies carry no length; the session catches those once they close empty.
        if status == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            return Err(ChatError::EmptyBody);
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ChatError::from))
            .boxed())
    }
}

impl Transport for ChatClient {
    fn open<'a>(&'a self, request: &'a ChatRequest) -> BoxFuture<'a, Result<ByteStream>> {
        Box::pin(self.open_stream(request))
    }
}

/// Pull a readable message out of an error body.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let error = &value["error"];
        if let Some(message) = error["message"].as_str().or_else(|| error.as_str()) {
            return message.to_string();
        }
    }
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_nested_error() {
        let body = r#"{"error":{"message":"Rate limit exceeded","code":429}}"#;
        assert_eq!(error_message(body), "Rate limit exceeded");
    }

    #[test]
    fn test_error_message_from_string_error() {
        assert_eq!(error_message(r#"{"error":"Payment required"}"#), "Payment required");
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("  upstream timeout \n"), "upstream timeout");
        assert_eq!(error_message(r#"{"detail":"x"}"#), r#"{"detail":"x"}"#);
    }
}
