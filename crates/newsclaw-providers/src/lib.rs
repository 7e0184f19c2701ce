//! # NewsClaw Providers
//!
//! Stock implementations of the search and content-generation collaborators:
//! a DuckDuckGo HTML search client and a deterministic template renderer.
//! Hosts with their own search API or an LLM synthesis step implement the
//! `newsclaw-core` traits instead.

pub mod render;
pub mod search;

pub use render::TemplateRenderer;
pub use search::DuckDuckGoSearch;
