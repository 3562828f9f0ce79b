//! Model listing functionality
//!
//! Prints the models installed on the server, newest first, numbered the
//! same way `run <n>` counts them in a chat.

use std::error::Error;

use crate::api::models::{fetch_models, sort_models};
use crate::ui::renderer::TerminalRenderer;

pub async fn list_models(
    client: &reqwest::Client,
    host: &str,
    default_model: Option<&str>,
    use_color: bool,
) -> Result<(), Box<dyn Error>> {
    let tags = fetch_models(client, host)
        .await
        .map_err(|err| format!("Could not list models from {host}: {err}"))?;

    let mut models = tags.models;
    sort_models(&mut models);

    println!("Available models on {host}");
    println!();
    let mut renderer = TerminalRenderer::stdout(use_color);
    renderer.model_table(&models, default_model)?;

    if let Some(default_model) = default_model {
        if !models.iter().any(|model| model.name == default_model) {
            println!();
            println!("⚠️  Default model '{default_model}' is not installed on this server");
        }
    }
    Ok(())
}
