use crate::api::decode::Utf8Carry;
use crate::observe::{RelayEvent, RelayObserver, StreamOutcome};
use crate::reflection::MarkerCounter;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Written downstream when the upstream stream fails after headers were sent.
pub const STREAM_INTERRUPTED_EVENT: &[u8] = b"data: {\"error\": \"Streaming interrupted\"}\n\n";

/// Downstream body of a streaming relay.
pub type RelayBody = ReceiverStream<Result<Bytes, Infallible>>;

pub struct RelayContext {
    pub request_id: String,
    pub idle_timeout: Duration,
    pub cancel: CancellationToken,
    pub observer: Arc<dyn RelayObserver>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelaySummary {
    pub chunks: usize,
    pub bytes: usize,
    pub reflection_markers: usize,
    pub outcome: StreamOutcome,
}

/// Start relaying `upstream` on its own task.
///
/// Chunks are forwarded unmodified through a one-slot channel, so a slow
/// reader holds back upstream reads. The task stops when upstream ends or
/// fails, when a read idles past `idle_timeout`, when the returned body is
/// dropped, or when `cancel` fires.
pub fn spawn_relay<S, E>(upstream: S, ctx: RelayContext) -> (RelayBody, JoinHandle<RelaySummary>)
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    let handle = tokio::spawn(relay_loop(upstream, tx, ctx).in_current_span());
    (ReceiverStream::new(rx), handle)
}

async fn relay_loop<S, E>(
    upstream: S,
    tx: mpsc::Sender<Result<Bytes, Infallible>>,
    ctx: RelayContext,
) -> RelaySummary
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let mut upstream = std::pin::pin!(upstream);
    let mut decoder = Utf8Carry::new();
    let mut markers = MarkerCounter::new();
    let mut chunks = 0usize;
    let mut bytes = 0usize;

    let outcome = loop {
        let next = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break StreamOutcome::Cancelled,
            _ = tx.closed() => break StreamOutcome::ClientDisconnected,
            next = tokio::time::timeout(ctx.idle_timeout, upstream.next()) => next,
        };

        match next {
            Ok(Some(Ok(chunk))) => {
                chunks += 1;
                bytes += chunk.len();
                markers.feed(&decoder.decode(&chunk));

                tokio::select! {
                    biased;
                    _ = ctx.cancel.cancelled() => break StreamOutcome::Cancelled,
                    sent = tx.send(Ok(chunk)) => {
                        if sent.is_err() {
                            break StreamOutcome::ClientDisconnected;
                        }
                    }
                }
            }
            Ok(None) => break StreamOutcome::Completed,
            Ok(Some(Err(e))) => {
                tracing::warn!(error = %e, "upstream stream failed");
                send_terminal_event(&tx, &ctx.cancel).await;
                break StreamOutcome::Interrupted(e.to_string());
            }
            Err(_) => {
                tracing::warn!(
                    idle_secs = ctx.idle_timeout.as_secs_f64(),
                    "upstream stream idle"
                );
                send_terminal_event(&tx, &ctx.cancel).await;
                break StreamOutcome::TimedOut;
            }
        }
    };
    markers.feed(&decoder.finish());

    let summary = RelaySummary {
        chunks,
        bytes,
        reflection_markers: markers.hits(),
        outcome,
    };
    ctx.observer.on_event(&RelayEvent::StreamFinished {
        request_id: ctx.request_id,
        chunks: summary.chunks,
        bytes: summary.bytes,
        reflection_markers: summary.reflection_markers,
        outcome: summary.outcome.clone(),
    });
    summary
}

async fn send_terminal_event(
    tx: &mpsc::Sender<Result<Bytes, Infallible>>,
    cancel: &CancellationToken,
) {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {}
        _ = tx.send(Ok(Bytes::from_static(STREAM_INTERRUPTED_EVENT))) => {}
    }
}
