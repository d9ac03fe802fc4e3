pub const DEFAULT_API_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

pub fn default_request_timeout_secs() -> u64 {
    300
}

pub fn default_stream_timeout_secs() -> u64 {
    120
}

pub fn default_max_body_bytes() -> usize {
    1024 * 1024 // 1 MiB
}
