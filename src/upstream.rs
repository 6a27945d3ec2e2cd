use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};

use crate::error::UpstreamError;
use crate::models::{Message, UpstreamChatRequest};

/// What came back from a single upstream attempt that did get a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
  Accepted(serde_json::Value),
  Rejected {
    status: u16,
    body: Option<serde_json::Value>,
  },
  /// Success status, but the body was not JSON.
  Unparsable,
}

#[async_trait]
pub trait Upstream: Send + Sync {
  async fn deliver(&self, model: &str, messages: &[Message]) -> Result<Delivery, UpstreamError>;
}

pub struct HttpUpstream {
  client: reqwest::Client,
  url: String,
  timeout: Duration,
}

impl HttpUpstream {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
    Self {
      client: reqwest::Client::new(),
      url: url.into(),
      timeout,
    }
  }
}

#[async_trait]
impl Upstream for HttpUpstream {
  async fn deliver(&self, model: &str, messages: &[Message]) -> Result<Delivery, UpstreamError> {
    let payload = UpstreamChatRequest { messages, model };

    let resp = self
      .client
      .post(&self.url)
      .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
      .timeout(self.timeout)
      .json(&payload)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.json::<serde_json::Value>().await.ok();
      return Ok(Delivery::Rejected {
        status: status.as_u16(),
        body,
      });
    }

    match resp.json::<serde_json::Value>().await {
      Ok(body) => Ok(Delivery::Accepted(body)),
      Err(err) => {
        tracing::debug!(model, error = %err, "upstream body is not JSON");
        Ok(Delivery::Unparsable)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::Role;
  use serde_json::json;
  use wiremock::matchers::{body_json, header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn upstream_for(server: &MockServer) -> HttpUpstream {
    HttpUpstream::new(format!("{}/api/chat", server.uri()), Duration::from_secs(5))
  }

  #[tokio::test]
  async fn posts_messages_and_model_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/chat"))
      .and(header("content-type", "application/json"))
      .and(body_json(json!({
        "messages": [{ "role": "user", "content": "hello" }],
        "model": "groq-2"
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "ok" })))
      .expect(1)
      .mount(&server)
      .await;

    let messages = vec![Message::new(Role::User, "hello")];
    let delivery = upstream_for(&server)
      .deliver("groq-2", &messages)
      .await
      .expect("upstream reachable");
    assert_eq!(delivery, Delivery::Accepted(json!({ "text": "ok" })));
  }

  #[tokio::test]
  async fn error_status_carries_parsed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(429).set_body_json(json!({ "error": "rate limited" })))
      .mount(&server)
      .await;

    let delivery = upstream_for(&server).deliver("groq-1", &[]).await.unwrap();
    assert_eq!(
      delivery,
      Delivery::Rejected {
        status: 429,
        body: Some(json!({ "error": "rate limited" })),
      }
    );
  }

  #[tokio::test]
  async fn error_status_with_text_body_has_no_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
      .mount(&server)
      .await;

    let delivery = upstream_for(&server).deliver("groq-1", &[]).await.unwrap();
    assert_eq!(delivery, Delivery::Rejected { status: 502, body: None });
  }

  #[tokio::test]
  async fn success_with_non_json_body_is_unparsable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
      .mount(&server)
      .await;

    let delivery = upstream_for(&server).deliver("groq-1", &[]).await.unwrap();
    assert_eq!(delivery, Delivery::Unparsable);
  }

  #[tokio::test]
  async fn slow_upstream_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
      .mount(&server)
      .await;

    let upstream = HttpUpstream::new(server.uri(), Duration::from_millis(50));
    let result = upstream.deliver("groq-1", &[]).await;
    assert!(matches!(result, Err(UpstreamError::Transport(_))));
  }
}
