use std::fmt;

/// How a streaming relay ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Interrupted(String),
    TimedOut,
    ClientDisconnected,
    Cancelled,
}

impl fmt::Display for StreamOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamOutcome::Completed => write!(f, "completed"),
            StreamOutcome::Interrupted(reason) => write!(f, "interrupted: {}", reason),
            StreamOutcome::TimedOut => write!(f, "timed out"),
            StreamOutcome::ClientDisconnected => write!(f, "client disconnected"),
            StreamOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Structured events emitted while relaying one request.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    RequestReceived {
        request_id: String,
        model: String,
        stream: bool,
        message_count: usize,
        has_reflection: bool,
        last_message_preview: Option<String>,
    },
    CompletionRelayed {
        request_id: String,
        reflection_markers: usize,
        total_tokens: Option<u64>,
        completion_tokens: Option<u64>,
    },
    StreamFinished {
        request_id: String,
        chunks: usize,
        bytes: usize,
        reflection_markers: usize,
        outcome: StreamOutcome,
    },
}

/// Observability hook called by the handler.
///
/// Implementations must not block; the return value is ignored.
pub trait RelayObserver: Send + Sync {
    fn on_event(&self, event: &RelayEvent);
}

/// Default observer: turns events into `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RelayObserver for TracingObserver {
    fn on_event(&self, event: &RelayEvent) {
        match event {
            RelayEvent::RequestReceived {
                request_id,
                model,
                stream,
                message_count,
                has_reflection,
                last_message_preview,
            } => {
                tracing::info!(
                    request_id = %request_id,
                    model = %model,
                    stream,
                    message_count,
                    has_reflection,
                    "relaying chat completion"
                );
                if let Some(preview) = last_message_preview {
                    tracing::debug!(request_id = %request_id, preview = %preview, "last message");
                }
            }
            RelayEvent::CompletionRelayed {
                request_id,
                reflection_markers,
                total_tokens,
                completion_tokens,
            } => {
                tracing::info!(
                    request_id = %request_id,
                    reflection_markers,
                    total_tokens = ?total_tokens,
                    completion_tokens = ?completion_tokens,
                    "completion relayed"
                );
            }
            RelayEvent::StreamFinished {
                request_id,
                chunks,
                bytes,
                reflection_markers,
                outcome,
            } => {
                if matches!(outcome, StreamOutcome::Completed) {
                    tracing::info!(
                        request_id = %request_id,
                        chunks,
                        bytes,
                        reflection_markers,
                        "stream finished"
                    );
                } else {
                    tracing::warn!(
                        request_id = %request_id,
                        chunks,
                        bytes,
                        reflection_markers,
                        outcome = %outcome,
                        "stream ended early"
                    );
                }
            }
        }
    }
}
