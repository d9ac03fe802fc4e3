use crate::api::response::{extract_content, extract_usage};
use crate::api::streaming::{spawn_relay, RelayContext};
use crate::api::UpstreamClient;
use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::models::ChatRequest;
use crate::observe::{RelayEvent, RelayObserver, TracingObserver};
use crate::reflection::{count_markers, scan_messages};
use axum::body::{Body, Bytes};
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CACHE_CONTROL, CONNECTION, CONTENT_TYPE,
};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";

const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (ACCESS_CONTROL_ALLOW_ORIGIN, CORS_ALLOW_ORIGIN),
    (ACCESS_CONTROL_ALLOW_METHODS, CORS_ALLOW_METHODS),
    (ACCESS_CONTROL_ALLOW_HEADERS, CORS_ALLOW_HEADERS),
];

/// Everything a relay invocation needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    upstream: UpstreamClient,
    observer: Arc<dyn RelayObserver>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let upstream = UpstreamClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            upstream,
            observer: Arc::new(TracingObserver),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn RelayObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Cancelling this token terminates every in-flight stream relay.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

/// Build the relay service. Every path and method reaches [`handle`].
pub fn router(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;
    let mut router = Router::new()
        .fallback(handle)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http());

    for (name, value) in CORS_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            name,
            HeaderValue::from_static(value),
        ));
    }

    router.with_state(state)
}

/// Entry point for one inbound HTTP call.
pub async fn handle(
    State(state): State<AppState>,
    method: Method,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    match method {
        Method::OPTIONS => StatusCode::OK.into_response(),
        Method::POST => {
            let request_id = Uuid::new_v4().to_string();
            let span = tracing::info_span!("relay", request_id = %request_id);
            relay(state, body, request_id)
                .instrument(span)
                .await
                .unwrap_or_else(|err| err.into_response())
        }
        _ => RelayError::MethodNotAllowed.into_response(),
    }
}

async fn relay(
    state: AppState,
    body: std::result::Result<Bytes, BytesRejection>,
    request_id: String,
) -> Result<Response> {
    let api_key = state
        .config
        .api_key
        .as_deref()
        .ok_or_else(|| RelayError::ConfigError("API key not configured".to_string()))?;

    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            RelayError::PayloadTooLarge(rejection.body_text())
        } else {
            RelayError::BadRequest(rejection.body_text())
        }
    })?;

    let payload = ChatRequest::from_slice(&body)?.into_payload(&state.config.defaults)?;

    let scan = scan_messages(&payload.messages);
    state.observer.on_event(&RelayEvent::RequestReceived {
        request_id: request_id.clone(),
        model: payload.model.clone(),
        stream: payload.stream,
        message_count: scan.message_count,
        has_reflection: scan.has_reflection,
        last_message_preview: scan.last_message_preview,
    });

    let response = state.upstream.send(api_key, &payload).await?;

    let status = response.status();
    if !status.is_success() {
        return Err(RelayError::upstream(status.as_u16(), response.text().await));
    }

    if payload.stream {
        stream_response(&state, response, request_id)
    } else {
        buffered_response(&state, response, request_id).await
    }
}

async fn buffered_response(
    state: &AppState,
    response: reqwest::Response,
    request_id: String,
) -> Result<Response> {
    let bytes = response.bytes().await?;
    let json: serde_json::Value = serde_json::from_slice(&bytes)?;

    let usage = extract_usage(&json);
    state.observer.on_event(&RelayEvent::CompletionRelayed {
        request_id,
        reflection_markers: extract_content(&json).map(count_markers).unwrap_or(0),
        total_tokens: usage.total_tokens,
        completion_tokens: usage.completion_tokens,
    });

    // The validated bytes go out as received so field order and number
    // formatting survive the trip.
    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        bytes,
    )
        .into_response())
}

fn stream_response(
    state: &AppState,
    response: reqwest::Response,
    request_id: String,
) -> Result<Response> {
    if response.content_length() == Some(0) {
        return Err(RelayError::NoResponseBody);
    }

    let ctx = RelayContext {
        request_id,
        idle_timeout: state.config.stream_idle_timeout,
        cancel: state.shutdown.child_token(),
        observer: state.observer.clone(),
    };
    let (body, _relay_task) = spawn_relay(response.bytes_stream(), ctx);

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .header(CONNECTION, "keep-alive");
    for (name, value) in CORS_HEADERS {
        builder = builder.header(name, value);
    }

    builder
        .body(Body::from_stream(body))
        .map_err(|e| RelayError::Other(format!("Failed to build stream response: {}", e)))
}
