//! Local model providers.

pub mod ollama;

pub use ollama::OllamaClient;
