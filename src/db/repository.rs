use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{
    BlogPost, CreatedBy, GenerationOutcome, NewBlogPost, TrendAnalysis, TrendKeyword, TrendRecord,
};

use super::schema::SCHEMA;

const POST_COLUMNS: &str = "id, title, excerpt, content, tags, trending_keywords, created_by, status, \
     meta_title, meta_description, read_time, published_at, created_at";

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Trend record operations

    pub async fn get_trend_record(&self, date: NaiveDate) -> Result<Option<TrendRecord>> {
        let key = date.to_string();
        let row = self
            .conn
            .call(move |conn| Ok(load_trend_row(conn, &key)?))
            .await?;
        row.map(TrendRow::into_record).transpose()
    }

    /// Inserts a zero-counter record unless one already exists for the date.
    /// Returns the stored record and whether this call created it.
    pub async fn create_trend_record_if_absent(
        &self,
        analysis: &TrendAnalysis,
    ) -> Result<(TrendRecord, bool)> {
        let key = analysis.date.to_string();
        let trends_json = serde_json::to_string(&analysis.trends)?;
        let created_at = Utc::now().to_rfc3339();

        let (row, created) = self
            .conn
            .call(move |conn| {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO trend_records (date, trends, created_at) VALUES (?1, ?2, ?3)",
                    params![key, trends_json, created_at],
                )?;
                let row = load_trend_row(conn, &key)?;
                Ok((row, inserted > 0))
            })
            .await?;

        let row = row.ok_or_else(|| {
            AppError::Storage(format!("trend record for {} vanished after insert", analysis.date))
        })?;
        Ok((row.into_record()?, created))
    }

    /// Replaces the trend list for a date, creating the record if needed.
    /// Counters and errors are left untouched.
    pub async fn upsert_trends(&self, analysis: &TrendAnalysis) -> Result<TrendRecord> {
        let key = analysis.date.to_string();
        let trends_json = serde_json::to_string(&analysis.trends)?;
        let created_at = Utc::now().to_rfc3339();

        let row = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO trend_records (date, trends, created_at) VALUES (?1, ?2, ?3)
                       ON CONFLICT(date) DO UPDATE SET trends = excluded.trends"#,
                    params![key, trends_json, created_at],
                )?;
                Ok(load_trend_row(conn, &key)?)
            })
            .await?;

        row.ok_or_else(|| {
            AppError::Storage(format!("trend record for {} vanished after upsert", analysis.date))
        })?
        .into_record()
    }

    /// Adds an outcome to the counters of a date and appends its errors, in one transaction.
    pub async fn increment_trend_counters(
        &self,
        date: NaiveDate,
        outcome: &GenerationOutcome,
    ) -> Result<TrendRecord> {
        let key = date.to_string();
        let attempted = i64::from(outcome.attempted());
        let succeeded = i64::from(outcome.success);
        let failed = i64::from(outcome.failed);
        let errors = outcome.errors.clone();

        let row = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let updated = tx.execute(
                    r#"UPDATE trend_records SET
                           generated_posts = generated_posts + ?2,
                           successful_posts = successful_posts + ?3,
                           failed_posts = failed_posts + ?4
                       WHERE date = ?1"#,
                    params![key, attempted, succeeded, failed],
                )?;
                if updated == 0 {
                    return Ok(None);
                }
                {
                    let mut stmt =
                        tx.prepare("INSERT INTO trend_errors (date, message) VALUES (?1, ?2)")?;
                    for message in &errors {
                        stmt.execute(params![key, message])?;
                    }
                }
                let row = load_trend_row(&tx, &key)?;
                tx.commit()?;
                Ok(row)
            })
            .await?;

        row.ok_or_else(|| AppError::NotFound(format!("no trend record for {}", date)))?
            .into_record()
    }

    // Blog post operations

    pub async fn create_blog_post(&self, post: NewBlogPost) -> Result<BlogPost> {
        let tags_json = serde_json::to_string(&post.tags)?;
        let keywords_json = serde_json::to_string(&post.trending_keywords)?;

        let row = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO blog_posts (title, excerpt, content, tags, trending_keywords, created_by,
                                              status, meta_title, meta_description, read_time, published_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
                    params![
                        post.title,
                        post.excerpt,
                        post.content,
                        tags_json,
                        keywords_json,
                        post.created_by.as_str(),
                        post.status.as_str(),
                        post.meta_title,
                        post.meta_description,
                        post.read_time,
                        post.published_at.map(|dt| dt.to_rfc3339()),
                    ],
                )?;
                let id = conn.last_insert_rowid();
                Ok(load_post_row(conn, id)?)
            })
            .await?;

        row.ok_or_else(|| AppError::Storage("blog post vanished after insert".to_string()))?
            .into_post()
    }

    pub async fn get_blog_post(&self, id: i64) -> Result<Option<BlogPost>> {
        let row = self
            .conn
            .call(move |conn| Ok(load_post_row(conn, id)?))
            .await?;
        row.map(PostRow::into_post).transpose()
    }

    pub async fn list_blog_posts(
        &self,
        created_by: Option<CreatedBy>,
        limit: u32,
    ) -> Result<Vec<BlogPost>> {
        let filter = created_by.map(|c| c.as_str());
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM blog_posts WHERE (?1 IS NULL OR created_by = ?1) ORDER BY id DESC LIMIT ?2",
                    POST_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![filter, limit], post_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        rows.into_iter().map(PostRow::into_post).collect()
    }

    pub async fn count_blog_posts(&self, created_by: Option<CreatedBy>) -> Result<u64> {
        let filter = created_by.map(|c| c.as_str());
        let count = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM blog_posts WHERE (?1 IS NULL OR created_by = ?1)",
                    params![filter],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await?;
        Ok(count.max(0) as u64)
    }

    /// Marks a post published. `published_at` is only set the first time.
    pub async fn publish_blog_post(&self, id: i64) -> Result<Option<BlogPost>> {
        let now = Utc::now().to_rfc3339();
        let row = self
            .conn
            .call(move |conn| {
                let updated = conn.execute(
                    r#"UPDATE blog_posts
                       SET status = 'published', published_at = COALESCE(published_at, ?2)
                       WHERE id = ?1"#,
                    params![id, now],
                )?;
                if updated == 0 {
                    return Ok(None);
                }
                Ok(load_post_row(conn, id)?)
            })
            .await?;
        row.map(PostRow::into_post).transpose()
    }
}

struct TrendRow {
    date: String,
    trends: String,
    generated_posts: i64,
    successful_posts: i64,
    failed_posts: i64,
    created_at: String,
    errors: Vec<String>,
}

impl TrendRow {
    fn into_record(self) -> Result<TrendRecord> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|e| AppError::Storage(format!("bad trend date '{}': {}", self.date, e)))?;
        let trends: Vec<TrendKeyword> = serde_json::from_str(&self.trends)
            .map_err(|e| AppError::Storage(format!("bad trend list for {}: {}", self.date, e)))?;

        Ok(TrendRecord {
            date,
            trends,
            generated_posts: counter(self.generated_posts),
            successful_posts: counter(self.successful_posts),
            failed_posts: counter(self.failed_posts),
            errors: self.errors,
            created_at: parse_datetime(&self.created_at).unwrap_or_else(Utc::now),
        })
    }
}

fn load_trend_row(conn: &rusqlite::Connection, date: &str) -> rusqlite::Result<Option<TrendRow>> {
    let row = conn
        .query_row(
            r#"SELECT date, trends, generated_posts, successful_posts, failed_posts, created_at
               FROM trend_records WHERE date = ?1"#,
            params![date],
            |row| {
                Ok(TrendRow {
                    date: row.get(0)?,
                    trends: row.get(1)?,
                    generated_posts: row.get(2)?,
                    successful_posts: row.get(3)?,
                    failed_posts: row.get(4)?,
                    created_at: row.get(5)?,
                    errors: Vec::new(),
                })
            },
        )
        .optional()?;

    let Some(mut row) = row else {
        return Ok(None);
    };

    let mut stmt = conn.prepare("SELECT message FROM trend_errors WHERE date = ?1 ORDER BY id")?;
    row.errors = stmt
        .query_map(params![date], |r| r.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(Some(row))
}

struct PostRow {
    id: i64,
    title: String,
    excerpt: String,
    content: String,
    tags: String,
    trending_keywords: String,
    created_by: String,
    status: String,
    meta_title: Option<String>,
    meta_description: Option<String>,
    read_time: i64,
    published_at: Option<String>,
    created_at: String,
}

impl PostRow {
    fn into_post(self) -> Result<BlogPost> {
        let id = self.id;
        let corrupt = |field: &str, detail: String| {
            AppError::Storage(format!("blog post {} has bad {}: {}", id, field, detail))
        };

        Ok(BlogPost {
            id,
            tags: serde_json::from_str(&self.tags).map_err(|e| corrupt("tags", e.to_string()))?,
            trending_keywords: serde_json::from_str(&self.trending_keywords)
                .map_err(|e| corrupt("trending_keywords", e.to_string()))?,
            created_by: self.created_by.parse().map_err(|e| corrupt("created_by", e))?,
            status: self.status.parse().map_err(|e| corrupt("status", e))?,
            read_time: counter(self.read_time),
            published_at: self.published_at.as_deref().and_then(parse_datetime),
            created_at: parse_datetime(&self.created_at).unwrap_or_else(Utc::now),
            title: self.title,
            excerpt: self.excerpt,
            content: self.content,
            meta_title: self.meta_title,
            meta_description: self.meta_description,
        })
    }
}

fn post_row(row: &Row) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        title: row.get(1)?,
        excerpt: row.get(2)?,
        content: row.get(3)?,
        tags: row.get(4)?,
        trending_keywords: row.get(5)?,
        created_by: row.get(6)?,
        status: row.get(7)?,
        meta_title: row.get(8)?,
        meta_description: row.get(9)?,
        read_time: row.get(10)?,
        published_at: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn load_post_row(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<PostRow>> {
    conn.query_row(
        &format!("SELECT {} FROM blog_posts WHERE id = ?1", POST_COLUMNS),
        params![id],
        post_row,
    )
    .optional()
}

fn counter(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostStatus, TrendKeyword};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn analysis(date: NaiveDate, keywords: &[&str]) -> TrendAnalysis {
        TrendAnalysis {
            date,
            trends: keywords
                .iter()
                .enumerate()
                .map(|(i, k)| TrendKeyword::new(*k, 90.0 - i as f64))
                .collect(),
        }
    }

    fn new_post(title: &str, created_by: CreatedBy) -> NewBlogPost {
        NewBlogPost {
            title: title.to_string(),
            excerpt: "excerpt".to_string(),
            content: "body".to_string(),
            tags: vec!["home".to_string()],
            trending_keywords: vec!["linen".to_string()],
            created_by,
            status: PostStatus::Draft,
            meta_title: None,
            meta_description: Some("desc".to_string()),
            read_time: 0,
            published_at: None,
        }
    }

    #[tokio::test]
    async fn create_if_absent_keeps_a_single_record_per_day() {
        let repo = Repository::in_memory().await.unwrap();

        let (first, created) = repo
            .create_trend_record_if_absent(&analysis(day(1), &["linen", "rattan"]))
            .await
            .unwrap();
        assert!(created);
        assert_eq!(first.generated_posts, 0);
        assert!(first.errors.is_empty());

        let (second, created) = repo
            .create_trend_record_if_absent(&analysis(day(1), &["velvet"]))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.trends, first.trends);

        assert!(repo.get_trend_record(day(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn increment_adds_deltas_and_appends_errors() {
        let repo = Repository::in_memory().await.unwrap();
        repo.create_trend_record_if_absent(&analysis(day(3), &["linen"]))
            .await
            .unwrap();

        let first = GenerationOutcome {
            success: 2,
            failed: 1,
            errors: vec!["first".to_string()],
        };
        repo.increment_trend_counters(day(3), &first).await.unwrap();

        let second = GenerationOutcome {
            success: 3,
            failed: 2,
            errors: vec!["second".to_string(), "third".to_string()],
        };
        let record = repo.increment_trend_counters(day(3), &second).await.unwrap();

        assert_eq!(record.generated_posts, 8);
        assert_eq!(record.successful_posts, 5);
        assert_eq!(record.failed_posts, 3);
        assert_eq!(record.errors, vec!["first", "second", "third"]);
        assert_eq!(repo.get_trend_record(day(3)).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn increment_on_missing_day_is_not_found() {
        let repo = Repository::in_memory().await.unwrap();
        let err = repo
            .increment_trend_counters(day(4), &GenerationOutcome::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn upsert_trends_replaces_keywords_but_keeps_counters() {
        let repo = Repository::in_memory().await.unwrap();
        repo.create_trend_record_if_absent(&analysis(day(5), &["linen"]))
            .await
            .unwrap();
        let outcome = GenerationOutcome {
            success: 1,
            failed: 1,
            errors: vec!["oops".to_string()],
        };
        repo.increment_trend_counters(day(5), &outcome).await.unwrap();

        let record = repo
            .upsert_trends(&analysis(day(5), &["velvet", "boucle"]))
            .await
            .unwrap();
        assert_eq!(record.keywords().collect::<Vec<_>>(), vec!["velvet", "boucle"]);
        assert_eq!(record.generated_posts, 2);
        assert_eq!(record.errors, vec!["oops"]);

        let fresh = repo.upsert_trends(&analysis(day(6), &["jute"])).await.unwrap();
        assert_eq!(fresh.generated_posts, 0);
    }

    #[tokio::test]
    async fn blog_posts_round_trip_and_filter_by_provenance() {
        let repo = Repository::in_memory().await.unwrap();
        let manual = repo.create_blog_post(new_post("Manual", CreatedBy::Admin)).await.unwrap();
        let auto = repo.create_blog_post(new_post("Auto", CreatedBy::Auto)).await.unwrap();

        assert_eq!(manual.tags, vec!["home"]);
        assert_eq!(manual.meta_description.as_deref(), Some("desc"));
        assert_eq!(repo.get_blog_post(auto.id).await.unwrap(), Some(auto.clone()));

        let all = repo.list_blog_posts(None, 10).await.unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![auto.id, manual.id]);

        let autos = repo.list_blog_posts(Some(CreatedBy::Auto), 10).await.unwrap();
        assert_eq!(autos.len(), 1);
        assert_eq!(autos[0].title, "Auto");

        assert_eq!(repo.count_blog_posts(None).await.unwrap(), 2);
        assert_eq!(repo.count_blog_posts(Some(CreatedBy::Admin)).await.unwrap(), 1);
        assert_eq!(repo.list_blog_posts(None, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn publish_sets_status_and_first_publish_time_only() {
        let repo = Repository::in_memory().await.unwrap();
        let post = repo.create_blog_post(new_post("Draft", CreatedBy::Admin)).await.unwrap();
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.published_at.is_none());

        let published = repo.publish_blog_post(post.id).await.unwrap().unwrap();
        assert_eq!(published.status, PostStatus::Published);
        let first_time = published.published_at.expect("published_at set");

        let again = repo.publish_blog_post(post.id).await.unwrap().unwrap();
        assert_eq!(again.published_at, Some(first_time));

        assert!(repo.publish_blog_post(9999).await.unwrap().is_none());
    }
}
