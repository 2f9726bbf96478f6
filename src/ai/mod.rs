mod claude;
mod prompts;
mod provider;

pub use claude::{ClaudeProvider, DEFAULT_API_BASE_URL, DEFAULT_MODEL};
pub use provider::TrendProvider;

#[cfg(test)]
pub use provider::fake::FakeProvider;
