//! Research cache keyed by query.
//!
//! Every pipeline step appends a row; lookups return the newest row for a query. Papers and
//! synopses are stored as JSON text, artifact paths as plain text.

use crate::{SynopsisError, SynopsisResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::PathBuf;
use synopsis_types::{PaperRecord, ResearchQuery, Synopsis};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS researches (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    query         TEXT NOT NULL,
    papers        TEXT NOT NULL,
    synopsis      TEXT,
    csv_path      TEXT,
    markdown_path TEXT,
    docx_path     TEXT,
    created_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_researches_query ON researches (query);
"#;

/// One cached research result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchRecord {
    pub query: ResearchQuery,
    pub papers: Vec<PaperRecord>,
    pub synopsis: Option<Synopsis>,
    pub csv_path: Option<PathBuf>,
    pub markdown_path: Option<PathBuf>,
    pub docx_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
}

impl ResearchRecord {
    /// A record holding only the fetched papers, timestamped now.
    pub fn new(query: ResearchQuery, papers: Vec<PaperRecord>) -> Self {
        Self {
            query,
            papers,
            synopsis: None,
            csv_path: None,
            markdown_path: None,
            docx_path: None,
            created_at: Utc::now(),
        }
    }
}

/// A cached query and when it was last stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchSummary {
    pub query: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ResearchStore: Send + Sync {
    /// Latest record for `query`, if any.
    async fn find(&self, query: &ResearchQuery) -> SynopsisResult<Option<ResearchRecord>>;

    /// Append a record.
    async fn save(&self, record: &ResearchRecord) -> SynopsisResult<()>;

    /// Distinct cached queries, most recent first.
    async fn list(&self) -> SynopsisResult<Vec<ResearchSummary>>;
}

/// SQLite implementation of [`ResearchStore`].
#[derive(Clone, Debug)]
pub struct SqliteResearchStore {
    pool: SqlitePool,
}

impl SqliteResearchStore {
    /// Connect and create the `researches` table if it does not exist.
    ///
    /// In-memory databases are private to one connection, so `sqlite::memory:` should be used
    /// with `max_connections = 1`.
    pub async fn connect(database_url: &str, max_connections: u32) -> SynopsisResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::raw_sql(CREATE_TABLE).execute(&pool).await?;
        tracing::info!("research store ready at {}", database_url);

        Ok(Self { pool })
    }
}

fn path_text(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.to_string_lossy().into_owned())
}

fn parse_timestamp(text: &str) -> SynopsisResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc))
}

fn record_from_row(row: &SqliteRow) -> SynopsisResult<ResearchRecord> {
    let query: String = row.try_get("query")?;
    let query =
        ResearchQuery::new(&query).map_err(|e| SynopsisError::InvalidInput(e.to_string()))?;

    let papers: String = row.try_get("papers")?;
    let papers = serde_json::from_str(&papers).map_err(SynopsisError::Deserialization)?;

    let synopsis: Option<String> = row.try_get("synopsis")?;
    let synopsis = synopsis
        .map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(SynopsisError::Deserialization)?;

    let path = |column: &str| -> SynopsisResult<Option<PathBuf>> {
        let value: Option<String> = row.try_get(column)?;
        Ok(value.map(PathBuf::from))
    };

    let created_at: String = row.try_get("created_at")?;

    Ok(ResearchRecord {
        query,
        papers,
        synopsis,
        csv_path: path("csv_path")?,
        markdown_path: path("markdown_path")?,
        docx_path: path("docx_path")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait]
impl ResearchStore for SqliteResearchStore {
    async fn find(&self, query: &ResearchQuery) -> SynopsisResult<Option<ResearchRecord>> {
        let row = sqlx::query(
            r#"
            SELECT query, papers, synopsis, csv_path, markdown_path, docx_path, created_at
            FROM researches
            WHERE query = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(query.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn save(&self, record: &ResearchRecord) -> SynopsisResult<()> {
        let papers = serde_json::to_string(&record.papers).map_err(SynopsisError::Serialization)?;
        let synopsis = record
            .synopsis
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(SynopsisError::Serialization)?;

        sqlx::query(
            r#"
            INSERT INTO researches
                (query, papers, synopsis, csv_path, markdown_path, docx_path, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.query.as_str())
        .bind(papers)
        .bind(synopsis)
        .bind(path_text(&record.csv_path))
        .bind(path_text(&record.markdown_path))
        .bind(path_text(&record.docx_path))
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!("stored research for '{}'", record.query);
        Ok(())
    }

    async fn list(&self) -> SynopsisResult<Vec<ResearchSummary>> {
        // SQLite fills bare columns from the row holding MAX(id).
        let rows = sqlx::query(
            r#"
            SELECT query, created_at, MAX(id) AS latest
            FROM researches
            GROUP BY query
            ORDER BY latest DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> SynopsisResult<ResearchSummary> {
                let created_at: String = row.try_get("created_at")?;
                Ok(ResearchSummary {
                    query: row.try_get("query")?,
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .collect()
    }
}
