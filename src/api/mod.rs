pub mod client;
pub mod decode;
pub mod response;
pub mod streaming;

pub use client::UpstreamClient;
pub use streaming::{spawn_relay, RelayBody, RelayContext, RelaySummary, STREAM_INTERRUPTED_EVENT};
