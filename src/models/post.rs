use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Characters per minute of reading used for auto-generated posts.
pub const READ_CHARS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatedBy {
    Admin,
    Auto,
}

impl CreatedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreatedBy::Admin => "admin",
            CreatedBy::Auto => "auto",
        }
    }
}

impl fmt::Display for CreatedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CreatedBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(CreatedBy::Admin),
            "auto" => Ok(CreatedBy::Auto),
            other => Err(format!("unknown post provenance '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Error,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Error => "error",
        }
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "error" => Ok(PostStatus::Error),
            other => Err(format!("unknown post status '{}'", other)),
        }
    }
}

/// Article returned by the provider for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub meta_title: String,
    pub meta_description: String,
    pub tags: Vec<String>,
    pub read_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub tags: Vec<String>,
    pub trending_keywords: Vec<String>,
    pub created_by: CreatedBy,
    pub status: PostStatus,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub read_time: u32,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBlogPost {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub tags: Vec<String>,
    pub trending_keywords: Vec<String>,
    pub created_by: CreatedBy,
    pub status: PostStatus,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub read_time: u32,
    pub published_at: Option<DateTime<Utc>>,
}

impl NewBlogPost {
    /// Auto-generated posts go live immediately; the draft's own read time is ignored.
    pub fn auto_published(
        draft: PostDraft,
        trending_keywords: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let read_time = estimate_read_time(&draft.content);
        Self {
            title: draft.title.trim().to_string(),
            excerpt: draft.excerpt.trim().to_string(),
            content: draft.content,
            tags: normalize_tags(draft.tags),
            trending_keywords,
            created_by: CreatedBy::Auto,
            status: PostStatus::Published,
            meta_title: non_blank(draft.meta_title),
            meta_description: non_blank(draft.meta_description),
            read_time,
            published_at: Some(now),
        }
    }
}

pub fn estimate_read_time(content: &str) -> u32 {
    (content.chars().count() / READ_CHARS_PER_MINUTE) as u32
}

fn non_blank(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !seen.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            seen.push(tag);
        }
    }
    seen
}
