use std::time::{Duration, Instant};

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::process_sse;
use crate::transport::{ByteStream, ChatTransport, chat_path, edit_path};
use crate::types::{
    ChatEvent, ChatRequest, Conversation, ConversationCreate, DailyCost, JobFitRequest,
    MonthlyCost, UsageSnapshot,
};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the cvbot chat server.
#[derive(Debug, Clone)]
pub struct CvBot {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl CvBot {
    /// Create a new client.
    ///
    /// The base URL defaults to [`DEFAULT_BASE_URL`].  A trailing slash is
    /// added when missing so request paths resolve beneath it.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    ///
    /// The timeout bounds connection setup only.  A stalled stream is not
    /// timed out; it ends when the server closes it or the connection drops.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Returns the base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Create and return default headers for API requests.
    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self
            .client
            .request(method, self.url(path)?)
            .headers(Self::default_headers()))
    }

    /// Send a request and convert transport failures and non-success statuses.
    async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(
                    format!("Request timed out: {}", e),
                    Some(self.timeout.as_secs_f64()),
                )
            } else if e.is_connect() {
                Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
            } else {
                Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
            }
        });
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                CLIENT_REQUEST_ERRORS.click();
                return Err(err);
            }
        };
        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let message = server_error_message(&error_body)
            .unwrap_or_else(|| format!("Request failed with status {status_code}"));

        // Map HTTP status code to appropriate error type
        match status_code {
            400 | 422 => Error::bad_request(message),
            404 => Error::not_found(message),
            408 => Error::timeout(message, None),
            429 => Error::rate_limit(message, retry_after),
            500 => Error::internal_server(message),
            502..=504 => Error::service_unavailable(message, retry_after),
            _ => Error::api(status_code, message),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(self.request(Method::GET, path)?).await?;
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    /// POST a JSON body and hand back the response body as a byte stream.
    async fn post_streaming<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ByteStream> {
        let builder = self
            .request(Method::POST, path)?
            .header(header::ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(body);
        let response = self.execute(builder).await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Err(Error::streaming("Response has no body", None));
        }

        let stream = response.bytes_stream().map(|result| {
            result.map_err(|e| {
                Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e)))
            })
        });
        Ok(Box::pin(stream))
    }

    /// Post a new message to a conversation and stream the raw response body.
    pub async fn stream_chat(
        &self,
        conversation_id: i64,
        request: &ChatRequest,
    ) -> Result<ByteStream> {
        self.post_streaming(&chat_path(conversation_id), request)
            .await
    }

    /// Revise an earlier user message and stream the regenerated response body.
    ///
    /// The server discards every message after `message_id` before streaming.
    pub async fn stream_edit(
        &self,
        conversation_id: i64,
        message_id: i64,
        request: &ChatRequest,
    ) -> Result<ByteStream> {
        self.post_streaming(&edit_path(conversation_id, message_id), request)
            .await
    }

    /// Request a job-fit analysis and stream its decoded events.
    pub async fn stream_job_fit(
        &self,
        request: &JobFitRequest,
    ) -> Result<impl Stream<Item = Result<ChatEvent>>> {
        let stream = self.post_streaming("api/job-fit", request).await?;
        Ok(process_sse(stream))
    }

    /// Fetch today's usage summary.
    pub async fn costs_today(&self) -> Result<UsageSnapshot> {
        self.get_json("api/costs/today").await
    }

    /// Fetch per-day, per-model spend.
    pub async fn daily_costs(&self) -> Result<Vec<DailyCost>> {
        self.get_json("api/costs/daily").await
    }

    /// Fetch per-month, per-model spend.
    pub async fn monthly_costs(&self) -> Result<Vec<MonthlyCost>> {
        self.get_json("api/costs/monthly").await
    }

    /// Start a new conversation about a candidate.
    pub async fn create_conversation(&self, candidate_id: &str) -> Result<Conversation> {
        let body = ConversationCreate {
            candidate_id: candidate_id.to_string(),
        };
        let builder = self.request(Method::POST, "api/conversations")?.json(&body);
        let response = self.execute(builder).await?;
        response.json::<Conversation>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse conversation: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    /// List conversations, most recently active first.
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        self.get_json("api/conversations").await
    }

    /// Delete a conversation and all of its messages.
    pub async fn delete_conversation(&self, conversation_id: i64) -> Result<()> {
        let path = format!("api/conversations/{conversation_id}");
        self.execute(self.request(Method::DELETE, &path)?).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChatTransport for CvBot {
    async fn send_message(
        &self,
        conversation_id: i64,
        request: &ChatRequest,
    ) -> Result<ByteStream> {
        self.stream_chat(conversation_id, request).await
    }

    async fn edit_message(
        &self,
        conversation_id: i64,
        message_id: i64,
        request: &ChatRequest,
    ) -> Result<ByteStream> {
        self.stream_edit(conversation_id, message_id, request).await
    }

    async fn costs_today(&self) -> Result<UsageSnapshot> {
        CvBot::costs_today(self).await
    }
}

/// Extract the server-supplied message from an error body.
///
/// The server reports errors either as `{"error": "..."}` (cost limit) or
/// as `{"detail": "..."}` (missing conversation or message).  Anything else,
/// including an empty body, yields `None`.
pub(crate) fn server_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<serde_json::Value>,
        detail: Option<serde_json::Value>,
    }

    let parsed = serde_json::from_str::<ErrorBody>(body).ok()?;
    parsed
        .error
        .or(parsed.detail)
        .and_then(|value| match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
            serde_json::Value::String(_) | serde_json::Value::Null => None,
            other => Some(other.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_client_default_base_url() {
        let client = CvBot::new(None).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/");
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = CvBot::new(Some("http://example.com/cvbot".to_string())).unwrap();
        assert_eq!(
            client.url(&chat_path(4)).unwrap().as_str(),
            "http://example.com/cvbot/api/chat/4"
        );
    }

    #[test]
    fn invalid_base_url() {
        let err = CvBot::new(Some("not a url".to_string())).unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn server_error_message_shapes() {
        assert_eq!(
            server_error_message(r#"{"error": "Daily chat limit reached ($2.00)."}"#),
            Some("Daily chat limit reached ($2.00).".to_string())
        );
        assert_eq!(
            server_error_message(r#"{"detail": "User message not found"}"#),
            Some("User message not found".to_string())
        );
        assert_eq!(server_error_message(r#"{"detail": ""}"#), None);
        assert_eq!(server_error_message("Internal Server Error"), None);
        assert_eq!(server_error_message(""), None);
    }
}
