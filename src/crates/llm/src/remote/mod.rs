//! Remote model providers.

pub mod claude;

pub use claude::ClaudeClient;
