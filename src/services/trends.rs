use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::ai::TrendProvider;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{distinct_trends, GenerationOutcome, TrendAnalysis, TrendRecord};

/// Owns the one-record-per-day trend snapshot and its counters.
#[derive(Clone)]
pub struct DailyTrendManager {
    provider: Arc<dyn TrendProvider>,
    repository: Arc<Repository>,
}

impl DailyTrendManager {
    pub fn new(provider: Arc<dyn TrendProvider>, repository: Arc<Repository>) -> Self {
        Self {
            provider,
            repository,
        }
    }

    pub fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    pub async fn ensure_today(&self) -> Result<TrendRecord> {
        self.ensure_for(Self::today()).await
    }

    /// Returns the record for `date`, running trend analysis first if none exists.
    pub async fn ensure_for(&self, date: NaiveDate) -> Result<TrendRecord> {
        if let Some(record) = self.repository.get_trend_record(date).await? {
            return Ok(record);
        }

        tracing::info!("No trend record for {}, running trend analysis", date);
        let analysis = self.provider.analyze_trends().await?;
        let (record, created) = self
            .repository
            .create_trend_record_if_absent(&TrendAnalysis {
                date,
                trends: distinct_trends(analysis.trends),
            })
            .await?;

        if created {
            tracing::info!(
                "Stored {} trend keywords for {}",
                record.trends.len(),
                date
            );
        } else {
            tracing::info!("Trend record for {} was created concurrently, reusing it", date);
        }
        Ok(record)
    }

    /// Re-runs trend analysis for today and replaces the stored keywords.
    /// Counters and errors already recorded today are kept.
    pub async fn refresh_today(&self) -> Result<TrendRecord> {
        let date = Self::today();
        let analysis = self.provider.analyze_trends().await?;
        let record = self
            .repository
            .upsert_trends(&TrendAnalysis {
                date,
                trends: distinct_trends(analysis.trends),
            })
            .await?;
        tracing::info!("Refreshed trends for {}: {} keywords", date, record.trends.len());
        Ok(record)
    }

    pub async fn today_record(&self) -> Result<Option<TrendRecord>> {
        self.repository.get_trend_record(Self::today()).await
    }

    /// Adds a run's tally to the day's counters. The increment happens inside
    /// storage, so concurrent runs cannot lose each other's updates.
    pub async fn record_outcome(
        &self,
        date: NaiveDate,
        outcome: &GenerationOutcome,
    ) -> Result<TrendRecord> {
        let record = self
            .repository
            .increment_trend_counters(date, outcome)
            .await?;
        tracing::debug!(
            "Trend record {} now at {} generated ({} ok, {} failed)",
            date,
            record.generated_posts,
            record.successful_posts,
            record.failed_posts
        );
        Ok(record)
    }
}
