use crate::api::{ModelInfo, TagsResponse, VersionResponse};
use crate::utils::url::construct_api_url;

pub async fn fetch_models(
    client: &reqwest::Client,
    host: &str,
) -> Result<TagsResponse, Box<dyn std::error::Error>> {
    let tags_url = construct_api_url(host, "api/tags");
    let response = client.get(tags_url).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(format!("API request failed with status {status}: {error_text}").into());
    }

    let tags = response.json::<TagsResponse>().await?;
    Ok(tags)
}

pub async fn fetch_server_version(
    client: &reqwest::Client,
    host: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let version_url = construct_api_url(host, "api/version");
    let response = client.get(version_url).send().await?.error_for_status()?;
    let version = response.json::<VersionResponse>().await?;
    Ok(version.version)
}

pub fn sort_models(models: &mut [ModelInfo]) {
    // Newest first; RFC 3339 timestamps from the same server sort lexically.
    models.sort_by(|a, b| match (&a.modified_at, &b.modified_at) {
        (Some(a_modified), Some(b_modified)) => {
            b_modified.cmp(a_modified).then_with(|| a.name.cmp(&b.name))
        }
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });
}

/// Resolves a `run` argument to a model name: a 1-based index into the
/// listing, or an exact name.
pub fn resolve_model_selector(models: &[ModelInfo], selector: &str) -> Option<String> {
    if let Ok(index) = selector.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| models.get(i))
            .map(|model| model.name.clone());
    }

    models
        .iter()
        .find(|model| model.name == selector || model.name == format!("{selector}:latest"))
        .map(|model| model.name.clone())
}

pub fn format_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0 B".to_string();
    }
    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} PB")
}
