use std::sync::Arc;

use crate::error::RelayError;
use crate::models::{ChatReply, Message, Role};
use crate::normalize::normalize_reply;
use crate::upstream::{Delivery, Upstream};

pub const DEFAULT_STATUS: u16 = 503;

/// Sends a conversation to the first candidate model that answers.
pub struct ChatRelay {
  upstream: Arc<dyn Upstream>,
  candidates: Vec<String>,
  system_prompt: String,
}

impl ChatRelay {
  pub fn new(upstream: Arc<dyn Upstream>, candidates: Vec<String>, system_prompt: impl Into<String>) -> Self {
    Self {
      upstream,
      candidates,
      system_prompt: system_prompt.into(),
    }
  }

  /// Preferred model first, then the configured slots, each at most once.
  /// A blank preference is skipped; any other is sent exactly as given.
  pub fn candidate_order(&self, preferred: Option<&str>) -> Vec<String> {
    let mut order: Vec<String> = Vec::with_capacity(self.candidates.len() + 1);
    let preferred = preferred.filter(|m| !m.trim().is_empty());
    for model in preferred.into_iter().chain(self.candidates.iter().map(String::as_str)) {
      if !order.iter().any(|m| m == model) {
        order.push(model.to_string());
      }
    }
    order
  }

  fn outgoing(&self, messages: &[Message]) -> Vec<Message> {
    let mut all = Vec::with_capacity(messages.len() + 1);
    all.push(Message::new(Role::System, self.system_prompt.clone()));
    all.extend_from_slice(messages);
    all
  }

  pub async fn relay(&self, messages: &[Message], preferred: Option<&str>) -> Result<ChatReply, RelayError> {
    let outgoing = self.outgoing(messages);
    let mut last_status = DEFAULT_STATUS;
    let mut last_body: Option<serde_json::Value> = None;

    for model in self.candidate_order(preferred) {
      tracing::debug!(model = %model, "attempting upstream model");
      match self.upstream.deliver(&model, &outgoing).await {
        Err(err) => {
          tracing::warn!(model = %model, error = %err, "upstream unreachable, trying next model");
        }
        Ok(Delivery::Rejected { status, body }) => {
          tracing::warn!(model = %model, status, "upstream rejected request, trying next model");
          last_status = status;
          if body.is_some() {
            last_body = body;
          }
        }
        Ok(Delivery::Unparsable) => {
          tracing::warn!(model = %model, "upstream answered with an unreadable body, trying next model");
        }
        Ok(Delivery::Accepted(body)) => {
          return Ok(ChatReply {
            reply: normalize_reply(&body),
            used_model: model,
          });
        }
      }
    }

    tracing::error!(status = last_status, "every candidate model failed");
    Err(RelayError::Exhausted {
      status: last_status,
      detail: last_body,
    })
  }
}
