//! Turns whatever body a backend answered with into a single reply string.

use serde_json::Value;

pub const EMPTY_REPLY: &str = "Sorry, I received an empty response. Please try again.";

enum Shape {
  /// OpenAI-style `choices[0].message.content`, then `choices[0].text`.
  Choices,
  /// A top-level string field.
  Field(&'static str),
}

// Priority order matters: a body carrying several shapes resolves to the first hit.
const SHAPES: &[Shape] = &[
  Shape::Choices,
  Shape::Field("content"),
  Shape::Field("message"),
  Shape::Field("response"),
  Shape::Field("text"),
];

impl Shape {
  fn name(&self) -> &'static str {
    match self {
      Shape::Choices => "choices",
      Shape::Field(key) => *key,
    }
  }

  fn matches(&self, body: &Value) -> bool {
    match self {
      Shape::Choices => has_choices(body),
      Shape::Field(key) => body[*key].is_string(),
    }
  }

  fn extract(&self, body: &Value) -> String {
    match self {
      Shape::Choices => first_choice(body),
      Shape::Field(key) => body[*key].as_str().unwrap_or_default().to_string(),
    }
  }
}

fn has_choices(body: &Value) -> bool {
  body["choices"].as_array().is_some_and(|c| !c.is_empty())
}

fn first_choice(body: &Value) -> String {
  let choice = &body["choices"][0];
  choice["message"]["content"]
    .as_str()
    .filter(|s| !s.is_empty())
    .or_else(|| choice["text"].as_str())
    .unwrap_or_default()
    .to_string()
}

/// Extracts the reply text. Never returns an empty string.
pub fn normalize_reply(body: &Value) -> String {
  let reply = match SHAPES.iter().find(|shape| shape.matches(body)) {
    Some(shape) => {
      tracing::trace!(shape = shape.name(), "matched upstream reply shape");
      shape.extract(body)
    }
    None => body.to_string(),
  };

  if reply.is_empty() {
    EMPTY_REPLY.to_string()
  } else {
    reply
  }
}
