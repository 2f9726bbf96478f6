use rand::seq::IndexedRandom;
use rand::Rng;

use crate::models::TrendKeyword;

pub const DEFAULT_TOPICS: [&str; 12] = [
    "Seasonal home decor ideas",
    "Gift guide for every budget",
    "How to choose sustainable products",
    "Small space organization tips",
    "Caring for natural fabrics",
    "Styling your living room on a budget",
    "Kitchen essentials for new homeowners",
    "Self-care routines at home",
    "Outdoor living and patio trends",
    "Handmade versus mass-produced goods",
    "Best practices for online shopping",
    "Color trends of the season",
];

pub fn default_topics() -> Vec<String> {
    DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect()
}

/// Uniform sampling with replacement, so a topic may repeat within one run.
pub fn sample_topics<R: Rng + ?Sized>(rng: &mut R, topics: &[String], count: usize) -> Vec<String> {
    (0..count)
        .filter_map(|_| topics.choose(rng).cloned())
        .collect()
}

/// Random subset of up to `max` distinct keywords, not biased towards high scores.
pub fn sample_keywords<R: Rng + ?Sized>(
    rng: &mut R,
    trends: &[TrendKeyword],
    max: usize,
) -> Vec<String> {
    let mut keywords: Vec<&str> = Vec::with_capacity(trends.len());
    for trend in trends {
        let keyword = trend.keyword.as_str();
        if !keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
            keywords.push(keyword);
        }
    }
    keywords
        .choose_multiple(rng, max)
        .map(|k| k.to_string())
        .collect()
}

/// Daily post target, uniform over `min..=max`.
pub fn sample_target<R: Rng + ?Sized>(rng: &mut R, min: u32, max: u32) -> u32 {
    rng.random_range(min..=max)
}
