//! Web search provider.
//!
//! Optional capability: the executor only gets a search tool when the
//! provider is configured (both `GOOGLE_SEARCH_API_KEY` and
//! `GOOGLE_SEARCH_ENGINE_ID` present).

pub mod google;

pub use google::GoogleSearch;

use async_trait::async_trait;

use crate::tools::ToolResult;

/// A web search backend.
///
/// Failures are folded into the returned [`ToolResult`] rather than raised:
/// a fruitless search is an answer the model should see, not a crash.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// `date_range` is one of `all`, `past_hour`, `past_day`, `past_week`,
    /// `past_month`, `past_year`; absent means unrestricted.
    async fn search(&self, query: &str, date_range: Option<&str>) -> ToolResult;
}
