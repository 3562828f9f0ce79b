//! Client and server version reporting.

use crate::api::models::fetch_server_version;
use crate::core::constants::CLI_VERSION;

/// `git describe` of the build, or `unknown` outside a git checkout.
pub const BUILD_DESCRIBE: &str = env!("VERGEN_GIT_DESCRIBE");

pub fn client_line() -> String {
    if BUILD_DESCRIBE == "unknown" || BUILD_DESCRIBE == CLI_VERSION {
        format!("matollama {CLI_VERSION}")
    } else {
        format!("matollama {CLI_VERSION} ({BUILD_DESCRIBE})")
    }
}

/// Version lines for the client and, when reachable, the server at `host`.
pub async fn version_lines(client: &reqwest::Client, host: &str) -> Vec<String> {
    let server = match fetch_server_version(client, host).await {
        Ok(version) => format!("Ollama {version} at {host}"),
        Err(err) => {
            tracing::warn!(error = %err, host, "version request failed");
            format!("Ollama at {host}: unreachable ({err})")
        }
    };
    vec![client_line(), server]
}

pub async fn print_version(client: &reqwest::Client, host: &str) {
    for line in version_lines(client, host).await {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_line_names_the_package_version() {
        assert!(client_line().starts_with(&format!("matollama {CLI_VERSION}")));
    }

    #[tokio::test]
    async fn unreachable_server_is_reported_not_fatal() {
        let client = reqwest::Client::new();
        let lines = version_lines(&client, "http://127.0.0.1:9").await;
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("unreachable"));
    }
}
