pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- one trend snapshot per calendar day
CREATE TABLE IF NOT EXISTS trend_records (
    date TEXT PRIMARY KEY,
    trends TEXT NOT NULL,
    generated_posts INTEGER NOT NULL DEFAULT 0 CHECK (generated_posts >= 0),
    successful_posts INTEGER NOT NULL DEFAULT 0 CHECK (successful_posts >= 0),
    failed_posts INTEGER NOT NULL DEFAULT 0 CHECK (failed_posts >= 0),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK (successful_posts + failed_posts <= generated_posts)
);

-- append-only error log per trend record
CREATE TABLE IF NOT EXISTS trend_errors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL REFERENCES trend_records(date) ON DELETE CASCADE,
    message TEXT NOT NULL,
    recorded_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_trend_errors_date ON trend_errors(date);

-- blog_posts table
CREATE TABLE IF NOT EXISTS blog_posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    excerpt TEXT NOT NULL,
    content TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    trending_keywords TEXT NOT NULL DEFAULT '[]',
    created_by TEXT NOT NULL CHECK (created_by IN ('admin', 'auto')),
    status TEXT NOT NULL DEFAULT 'draft' CHECK (status IN ('draft', 'published', 'error')),
    meta_title TEXT,
    meta_description TEXT,
    read_time INTEGER NOT NULL DEFAULT 0,
    published_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_blog_posts_created_at ON blog_posts(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_blog_posts_created_by ON blog_posts(created_by);
"#;
