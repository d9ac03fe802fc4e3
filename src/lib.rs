//! Chat-completion relay with Chain of Draft reflection instrumentation.
//!
//! A single handler validates an inbound chat-completion request, forwards
//! it to one upstream inference API with a server-side credential, and
//! relays the answer back either as one JSON document or as a byte-for-byte
//! server-sent-event stream.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod models;
pub mod observe;
pub mod reflection;

pub use config::Config;
pub use error::{RelayError, Result};
pub use handler::{router, AppState};
