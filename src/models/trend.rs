use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_TREND_SCORE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendKeyword {
    pub keyword: String,
    pub score: f64,
}

impl TrendKeyword {
    pub fn new(keyword: impl Into<String>, score: f64) -> Self {
        Self {
            keyword: keyword.into(),
            score: score.clamp(0.0, MAX_TREND_SCORE),
        }
    }
}

/// Collapses keywords that differ only by surrounding whitespace or ASCII case,
/// keeping the first spelling and the highest score. Blank keywords are dropped.
pub fn distinct_trends(trends: impl IntoIterator<Item = TrendKeyword>) -> Vec<TrendKeyword> {
    let mut distinct: Vec<TrendKeyword> = Vec::new();
    for trend in trends {
        let keyword = trend.keyword.trim();
        if keyword.is_empty() {
            continue;
        }
        match distinct
            .iter_mut()
            .find(|t| t.keyword.eq_ignore_ascii_case(keyword))
        {
            Some(existing) => existing.score = existing.score.max(trend.score),
            None => distinct.push(TrendKeyword::new(keyword, trend.score)),
        }
    }
    distinct
}

/// Result of one trend-analysis call, before it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub date: NaiveDate,
    pub trends: Vec<TrendKeyword>,
}

/// Per-day snapshot of trend keywords plus the generation counters for that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendRecord {
    pub date: NaiveDate,
    pub trends: Vec<TrendKeyword>,
    pub generated_posts: u32,
    pub successful_posts: u32,
    pub failed_posts: u32,
    pub errors: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl TrendRecord {
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.trends.iter().map(|t| t.keyword.as_str())
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords().any(|k| k == keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_are_clamped_into_range() {
        assert_eq!(TrendKeyword::new("linen", 140.0).score, 100.0);
        assert_eq!(TrendKeyword::new("linen", -3.0).score, 0.0);
        assert_eq!(TrendKeyword::new("linen", 42.5).score, 42.5);
    }

    #[test]
    fn distinct_trends_merges_repeats_and_keeps_the_best_score() {
        let trends = distinct_trends(vec![
            TrendKeyword::new("linen", 40.0),
            TrendKeyword::new(" Linen ", 75.0),
            TrendKeyword::new("rattan", 60.0),
            TrendKeyword::new("  ", 90.0),
            TrendKeyword::new("LINEN", 10.0),
        ]);

        assert_eq!(
            trends,
            vec![TrendKeyword::new("linen", 75.0), TrendKeyword::new("rattan", 60.0)]
        );
    }

    #[test]
    fn record_serializes_with_camel_case_counters() {
        let record = TrendRecord {
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            trends: vec![TrendKeyword::new("ceramic mugs", 88.0)],
            generated_posts: 3,
            successful_posts: 2,
            failed_posts: 1,
            errors: vec!["boom".to_string()],
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["date"], "2026-03-14");
        assert_eq!(value["generatedPosts"], 3);
        assert_eq!(value["successfulPosts"], 2);
        assert_eq!(value["failedPosts"], 1);
        assert_eq!(value["trends"][0]["keyword"], "ceramic mugs");
        assert!(record.has_keyword("ceramic mugs"));
        assert!(!record.has_keyword("ceramic"));
    }
}
