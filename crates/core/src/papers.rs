//! Paper search and the paper list export.
//!
//! [`PaperSource`] is the seam between the pipeline and whatever index supplies bibliographic
//! records. [`SemanticScholarSource`] is the production implementation; tests substitute their
//! own.

use crate::docx::write_atomic;
use crate::{SynopsisError, SynopsisResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use synopsis_types::{MISSING_FIELD, PaperRecord, ResearchQuery};

/// Column headers of the exported paper list.
pub const CSV_HEADERS: [&str; 6] = ["Title", "Abstract", "Authors", "Year", "Venue", "URL"];

const SEARCH_FIELDS: &str = "title,abstract,authors,year,venue,url";

/// Upper bound the search API accepts for a single page.
const SEARCH_PAGE_LIMIT: usize = 100;

/// Source of bibliographic records for a query.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Search for up to `limit` papers. May return fewer, or none.
    async fn search(&self, query: &ResearchQuery, limit: usize) -> SynopsisResult<Vec<PaperRecord>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(default)]
    authors: Vec<SearchAuthor>,
    year: Option<i32>,
    venue: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchAuthor {
    name: Option<String>,
}

fn or_missing(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| MISSING_FIELD.to_string())
}

impl SearchHit {
    /// Converts a hit into a record; hits without an abstract are dropped.
    fn into_record(self) -> Option<PaperRecord> {
        let abstract_text = self
            .abstract_text
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())?;

        let authors = self
            .authors
            .into_iter()
            .filter_map(|a| a.name)
            .filter(|n| !n.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        Some(PaperRecord {
            title: or_missing(self.title),
            abstract_text,
            authors: or_missing(Some(authors)),
            year: or_missing(self.year.map(|y| y.to_string())),
            venue: or_missing(self.venue),
            url: or_missing(self.url),
        })
    }
}

/// Paper source backed by the Semantic Scholar Graph search API.
#[derive(Clone, Debug)]
pub struct SemanticScholarSource {
    http: reqwest::Client,
    search_url: String,
}

impl SemanticScholarSource {
    pub fn new(search_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            search_url: search_url.into(),
        }
    }
}

#[async_trait]
impl PaperSource for SemanticScholarSource {
    async fn search(&self, query: &ResearchQuery, limit: usize) -> SynopsisResult<Vec<PaperRecord>> {
        // Hits without an abstract are discarded, so ask for more than we keep.
        let page = (limit * 2).clamp(1, SEARCH_PAGE_LIMIT).to_string();

        let response = self
            .http
            .get(&self.search_url)
            .query(&[
                ("query", query.as_str()),
                ("limit", page.as_str()),
                ("fields", SEARCH_FIELDS),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::error!("paper search failed for '{}': {}", query, e);
                SynopsisError::Upstream(format!("paper search failed: {e}"))
            })?;

        let body: SearchResponse = response.json().await.map_err(|e| {
            tracing::error!("paper search returned an unreadable body: {}", e);
            SynopsisError::Upstream(format!("invalid paper search response: {e}"))
        })?;

        let papers: Vec<PaperRecord> = body
            .data
            .into_iter()
            .filter_map(SearchHit::into_record)
            .take(limit)
            .collect();

        tracing::info!("found {} papers with abstracts for '{}'", papers.len(), query);
        Ok(papers)
    }
}

/// Picks the papers cited as references.
///
/// Each paper is scored by how many words of the first paper's lower-cased title occur in its
/// own lower-cased title. Papers are stable-sorted by ascending score and the last `count` are
/// kept, so the best matches come last.
pub fn select_relevant(papers: &[PaperRecord], count: usize) -> Vec<PaperRecord> {
    let Some(first) = papers.first() else {
        return Vec::new();
    };
    let topic = first.title.to_lowercase();
    let words: Vec<&str> = topic.split_whitespace().collect();

    let mut scored: Vec<(usize, &PaperRecord)> = papers
        .iter()
        .map(|paper| {
            let title = paper.title.to_lowercase();
            let score = words.iter().filter(|w| title.contains(*w)).count();
            (score, paper)
        })
        .collect();
    scored.sort_by_key(|(score, _)| *score);

    let skip = scored.len().saturating_sub(count);
    scored
        .into_iter()
        .skip(skip)
        .map(|(_, paper)| paper.clone())
        .collect()
}

/// Writes the paper list as CSV, replacing any previous export.
///
/// The header row is always written, even for an empty list.
///
/// # Errors
///
/// Returns `SynopsisError::Csv` if a record cannot be encoded, or the errors of
/// [`write_atomic`] if the file cannot be written.
pub fn write_papers_csv(papers: &[PaperRecord], path: &Path) -> SynopsisResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;
    for paper in papers {
        writer.serialize(paper)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| SynopsisError::FileWrite(e.into_error()))?;

    write_atomic(path, &bytes)?;
    tracing::info!("saved {} papers to {}", papers.len(), path.display());
    Ok(())
}
