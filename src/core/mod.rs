pub mod app;
pub mod cancel;
pub mod chat_stream;
pub mod config;
pub mod constants;
pub mod context;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod message;
pub mod persistence;
pub mod think;
