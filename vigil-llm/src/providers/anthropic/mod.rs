//! Anthropic (Claude) research provider with web search.

mod client;
mod research;
mod types;

pub use research::AnthropicResearchProvider;
