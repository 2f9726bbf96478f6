use serde_json::{json, Value};

use crate::models::TrendKeyword;

pub const TREND_TOOL: &str = "report_trends";
pub const POST_TOOL: &str = "write_blog_post";

pub fn trend_system_prompt(niche: &str) -> String {
    format!(
        r#"You are a market analyst for an online store that sells {niche}.
You track what shoppers are searching for and talking about right now."#
    )
}

pub fn trend_prompt(niche: &str) -> String {
    format!(
        r#"Identify 10 to 15 keywords that are trending today for {niche}.
Cover product categories, styles, seasonal needs and buying intent.
Give each keyword a popularity score from 0 to 100.
Keep every keyword short (one to four words) and suitable for a blog post or product search."#
    )
}

pub fn trends_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "trends": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "keyword": { "type": "string" },
                        "score": { "type": "number", "minimum": 0, "maximum": 100 }
                    },
                    "required": ["keyword", "score"]
                }
            }
        },
        "required": ["trends"]
    })
}

pub fn post_system_prompt(niche: &str) -> String {
    format!(
        r#"You are the content writer for an online store that sells {niche}.
You write helpful, accurate blog posts that rank well in search and never invent prices or discounts."#
    )
}

pub fn post_prompt(topic: &str, trends: &[TrendKeyword]) -> String {
    let keywords = trends
        .iter()
        .map(|t| t.keyword.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let keywords = if keywords.is_empty() {
        "none".to_string()
    } else {
        keywords
    };

    format!(
        r#"Write a blog post about: {topic}

Trending keywords today: {keywords}

Requirements:
- Title under 70 characters.
- Excerpt of one or two sentences.
- Content of 800 to 1200 words in Markdown with H2 subheadings and a short conclusion.
- Work in the trending keywords where they fit naturally.
- metaTitle under 60 characters, metaDescription under 160 characters.
- Three to six lowercase tags.
- readTime as the estimated reading time in minutes."#
    )
}

pub fn post_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "excerpt": { "type": "string" },
            "content": { "type": "string" },
            "metaTitle": { "type": "string" },
            "metaDescription": { "type": "string" },
            "tags": { "type": "array", "items": { "type": "string" } },
            "readTime": { "type": "number" }
        },
        "required": ["title", "excerpt", "content", "metaTitle", "metaDescription", "tags", "readTime"]
    })
}
