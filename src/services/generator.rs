use std::sync::Arc;

use chrono::Utc;

use crate::ai::TrendProvider;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{BlogPost, NewBlogPost, TrendKeyword, TrendRecord};

/// Turns one topic into one stored, published post. No retries.
#[derive(Clone)]
pub struct ContentGenerator {
    provider: Arc<dyn TrendProvider>,
    repository: Arc<Repository>,
}

impl ContentGenerator {
    pub fn new(provider: Arc<dyn TrendProvider>, repository: Arc<Repository>) -> Self {
        Self {
            provider,
            repository,
        }
    }

    /// `keywords` is the caller's pick from the record's trends; anything not
    /// in the record is dropped.
    pub async fn generate_one(
        &self,
        topic: &str,
        record: &TrendRecord,
        keywords: Vec<String>,
    ) -> Result<BlogPost> {
        let keywords: Vec<String> = keywords
            .into_iter()
            .filter(|k| record.has_keyword(k))
            .collect();

        let focus: Vec<TrendKeyword> = record
            .trends
            .iter()
            .filter(|t| keywords.contains(&t.keyword))
            .cloned()
            .collect();
        let prompt_trends = if focus.is_empty() {
            &record.trends
        } else {
            &focus
        };

        let draft = self.provider.generate_post(topic, prompt_trends).await?;
        let post = NewBlogPost::auto_published(draft, keywords, Utc::now());
        let saved = self.repository.create_blog_post(post).await?;

        tracing::info!(
            "Generated post {} \"{}\" for topic \"{}\" ({})",
            saved.id,
            saved.title,
            topic,
            self.provider.model_version()
        );
        Ok(saved)
    }
}
