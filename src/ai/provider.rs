use async_trait::async_trait;

use crate::error::Result;
use crate::models::{PostDraft, TrendAnalysis, TrendKeyword};

/// Structured-output capability of the generative service.
///
/// Implementations make one request per call and never retry; callers decide
/// what a failure means.
#[async_trait]
pub trait TrendProvider: Send + Sync {
    /// Asks for today's market trend keywords for the storefront's niche.
    async fn analyze_trends(&self) -> Result<TrendAnalysis>;

    /// Asks for one article about `topic`. Failures name the topic.
    async fn generate_post(&self, topic: &str, trends: &[TrendKeyword]) -> Result<PostDraft>;

    fn model_version(&self) -> &str;
}
