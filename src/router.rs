use std::any::Any;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::alerts::AlertStore;
use crate::error::{error_response, RelayError};
use crate::models::{ChatRequest, Message, Reading, ResolveReceipt, StatsQuery};
use crate::relay::ChatRelay;

pub const MESSAGES_REQUIRED: &str = "messages array is required";

pub struct RouterState {
  pub started_at: Instant,
  pub relay: ChatRelay,
  pub store: Mutex<AlertStore>,
}

impl RouterState {
  pub fn new(relay: ChatRelay, store: AlertStore) -> Self {
    Self {
      started_at: Instant::now(),
      relay,
      store: Mutex::new(store),
    }
  }
}

/// Wraps a route with panic recovery and its own CORS policy, so faults still
/// answer with the route's cross-origin headers.
fn guarded(route: MethodRouter<Arc<RouterState>>, methods: &[Method]) -> MethodRouter<Arc<RouterState>> {
  let cors = CorsLayer::new()
    .allow_origin(AnyOrigin)
    .allow_methods(methods.to_vec())
    .allow_headers([CONTENT_TYPE]);

  route
    .layer::<_, Infallible>(CatchPanicLayer::custom(panic_response))
    .layer::<_, Infallible>(cors)
}

pub fn build_router(state: Arc<RouterState>) -> Router {
  Router::new()
    .route("/health", get(health))
    .route(
      "/api/chat",
      guarded(
        post(chat).options(preflight).fallback(method_not_allowed),
        &[Method::POST, Method::OPTIONS],
      ),
    )
    .route(
      "/api/stats",
      guarded(
        get(stats).post(ingest).options(preflight).fallback(stats),
        &[Method::GET, Method::POST, Method::OPTIONS],
      ),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

pub async fn run_router(listener: TcpListener, state: RouterState) -> anyhow::Result<()> {
  let app = build_router(Arc::new(state));
  axum::serve(listener, app).await?;
  Ok(())
}

async fn health(State(state): State<Arc<RouterState>>) -> Json<Value> {
  let uptime = state.started_at.elapsed().as_millis();
  Json(serde_json::json!({
    "status": "ok",
    "version": env!("CARGO_PKG_VERSION"),
    "uptime_ms": uptime
  }))
}

async fn preflight() -> StatusCode {
  StatusCode::OK
}

async fn method_not_allowed() -> Response {
  error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
  let detail = if let Some(s) = err.downcast_ref::<String>() {
    s.clone()
  } else if let Some(s) = err.downcast_ref::<&str>() {
    s.to_string()
  } else {
    "unknown fault".to_string()
  };
  tracing::error!(%detail, "handler panicked");
  RelayError::Internal(detail).into_response()
}

fn parse_chat_request(body: &Value) -> Result<ChatRequest, RelayError> {
  let raw = body["messages"]
    .as_array()
    .ok_or_else(|| RelayError::validation(MESSAGES_REQUIRED))?;

  let messages = raw
    .iter()
    .enumerate()
    .map(|(idx, m)| {
      serde_json::from_value::<Message>(m.clone()).map_err(|_| {
        RelayError::validation(format!(
          "messages[{idx}] needs a role (system, user or assistant) and string content"
        ))
      })
    })
    .collect::<Result<Vec<_>, _>>()?;

  let model = body["model"].as_str().map(str::to_string);
  Ok(ChatRequest { messages, model })
}

async fn chat(
  State(state): State<Arc<RouterState>>,
  body: Result<Json<Value>, JsonRejection>,
) -> Response {
  let Ok(Json(body)) = body else {
    return RelayError::validation(MESSAGES_REQUIRED).into_response();
  };
  let req = match parse_chat_request(&body) {
    Ok(req) => req,
    Err(err) => return err.into_response(),
  };

  match state.relay.relay(&req.messages, req.model.as_deref()).await {
    Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
    Err(err) => err.into_response(),
  }
}

async fn ingest(
  State(state): State<Arc<RouterState>>,
  body: Result<Json<Value>, JsonRejection>,
) -> Response {
  let body = body
    .map(|Json(v)| v)
    .unwrap_or_else(|_| Value::Object(Default::default()));
  let reading = match Reading::from_json(&body) {
    Ok(r) => r,
    Err(err) => return err.into_response(),
  };

  let receipt = state.store.lock().await.ingest(reading);
  (StatusCode::OK, Json(receipt)).into_response()
}

/// Any method other than POST and OPTIONS lands here.
async fn stats(
  State(state): State<Arc<RouterState>>,
  Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
  let query = StatsQuery::from_pairs(&pairs);
  let resolve_id = query
    .id
    .as_deref()
    .filter(|id| !id.is_empty() && query.action.as_deref() == Some("resolve"));

  if let Some(raw_id) = resolve_id {
    let resolved_id = parse_leading_id(raw_id);
    if let Some(id) = resolved_id {
      let found = state.store.lock().await.resolve(id);
      tracing::info!(id, found, "alert resolve requested");
    }
    return (StatusCode::OK, Json(ResolveReceipt { ok: true, resolved_id })).into_response();
  }

  let snapshot = state.store.lock().await.summary();
  (StatusCode::OK, Json(snapshot)).into_response()
}

/// Reads the leading decimal digits, so `"12abc"` is 12.
fn parse_leading_id(raw: &str) -> Option<u64> {
  let trimmed = raw.trim_start();
  let digits = trimmed
    .find(|c: char| !c.is_ascii_digit())
    .map_or(trimmed, |end| &trimmed[..end]);
  digits.parse().ok()
}
