use regex::Regex;
use std::sync::LazyLock;

static ENV_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env reference pattern is valid"));

/// Expand `${VAR_NAME}` references using `lookup`. Unknown variables are left as-is.
pub fn expand_env_var_in_string(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = value.to_string();

    for cap in ENV_REF.captures_iter(value) {
        let var_name = &cap[1];
        if let Some(replacement) = lookup(var_name) {
            result = result.replace(&cap[0], &replacement);
        }
    }

    result
}

/// Normalise a base URL or endpoint into a full chat-completions URL.
pub fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.ends_with("/chat/completions") {
        endpoint.to_string()
    } else if endpoint.ends_with("/v1") {
        format!("{}/chat/completions", endpoint)
    } else if endpoint.ends_with("/v1/") {
        format!("{}chat/completions", endpoint)
    } else {
        format!("{}/v1/chat/completions", endpoint.trim_end_matches('/'))
    }
}
