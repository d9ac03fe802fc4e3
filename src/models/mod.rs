mod chat;
mod error_body;
mod payload;

pub use chat::ChatRequest;
pub use error_body::ErrorBody;
pub use payload::{GenerationDefaults, UpstreamPayload};
