//! Terminal presentation for interactive sessions.
//!
//! - [`renderer`]: streamed turn output, notices, model tables.
//! - [`repl`]: the prompt loop that feeds input to [`crate::commands`] and
//!   drives turns on the [`crate::core::engine::SessionEngine`].
//!
//! Ownership boundary: this layer presents and captures interaction state,
//! while [`crate::core`] owns conversation state and backend coordination.

pub mod renderer;
pub mod repl;
