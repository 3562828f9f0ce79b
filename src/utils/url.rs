//! URL utilities for consistent endpoint construction
//!
//! Hosts come from flags, config files and `OLLAMA_HOST`-style values, so
//! they may lack a scheme or carry trailing slashes.

/// Normalize a host by adding a missing scheme and removing trailing slashes
///
/// # Examples
///
/// ```
/// use matollama::utils::url::normalize_host;
///
/// assert_eq!(normalize_host("localhost:11434"), "http://localhost:11434");
/// assert_eq!(normalize_host("http://gpu-box:11434/"), "http://gpu-box:11434");
/// assert_eq!(normalize_host("https://ollama.example.com//"), "https://ollama.example.com");
/// ```
pub fn normalize_host(host: &str) -> String {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

/// Construct a complete API endpoint URL from a host and endpoint path
///
/// # Examples
///
/// ```
/// use matollama::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:11434/", "/api/chat"),
///     "http://localhost:11434/api/chat"
/// );
/// ```
pub fn construct_api_url(host: &str, endpoint: &str) -> String {
    let normalized_host = normalize_host(host);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_host, endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("http://localhost:11434"),
            "http://localhost:11434"
        );

        // Bare host:port gets a scheme
        assert_eq!(normalize_host("127.0.0.1:11434"), "http://127.0.0.1:11434");

        // Trailing slashes are removed
        assert_eq!(
            normalize_host("https://ollama.example.com///"),
            "https://ollama.example.com"
        );

        // Surrounding whitespace from config files
        assert_eq!(
            normalize_host("  http://localhost:11434/ \n"),
            "http://localhost:11434"
        );
    }

    #[test]
    fn test_construct_api_url() {
        assert_eq!(
            construct_api_url("http://localhost:11434", "api/chat"),
            "http://localhost:11434/api/chat"
        );

        assert_eq!(
            construct_api_url("localhost:11434/", "///api/tags"),
            "http://localhost:11434/api/tags"
        );
    }
}
