//! MatOllama is a terminal chat client for local Ollama servers.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns conversation state, the per-turn session engine, stream
//!   decoding, cancellation, configuration and session persistence.
//! - [`ui`] renders streamed turns and runs the interactive prompt loop.
//! - [`commands`] implements prompt-command parsing and execution used by
//!   the prompt loop.
//! - [`api`] defines the Ollama request/response payloads and model listing.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which resolves settings and dispatches into
//! [`ui::repl`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
