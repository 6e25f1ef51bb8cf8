//! Web tools: WebFetch and WebSearch
//!
//! | Tool | Backend trait | Default backend |
//! |------|---------------|-----------------|
//! | `WebFetch` | [`PageFetcher`] | [`HttpPageFetcher`] (`reqwest`, text via `scraper`) |
//! | `WebSearch` | [`SearchBackend`] | [`DuckDuckGoBackend`] (Instant Answer API) |
//!
//! Network access sits behind the backend traits so the tools can be tested
//! with canned pages and results.

mod fetch;
mod search;

pub use fetch::{
    FetchedPage, HttpPageFetcher, PageFetcher, WEB_FETCH, WebFetchTool, html_to_text, validate_url,
};
pub use search::{DuckDuckGoBackend, SearchBackend, SearchHit, WEB_SEARCH, WebSearchTool};
