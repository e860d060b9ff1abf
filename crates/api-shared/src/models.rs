//! JSON bodies of the HTTP API.
//!
//! Paper fields keep the capitalised names (`Title`, `Abstract`, ...) used by the CSV export
//! so that the web frontend can read both.

use serde::{Deserialize, Serialize};
use synopsis_types::{PaperRecord, Synopsis};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of every query-driven endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResearchReq {
    /// Search query; surrounding whitespace is ignored.
    pub query: String,
    /// Papers to request. Defaults to the server's configured value (10).
    #[serde(default)]
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Paper {
    pub title: String,
    #[serde(rename = "Abstract")]
    pub abstract_text: String,
    pub authors: String,
    pub year: String,
    pub venue: String,
    #[serde(rename = "URL")]
    pub url: String,
}

impl From<PaperRecord> for Paper {
    fn from(p: PaperRecord) -> Self {
        Self {
            title: p.title,
            abstract_text: p.abstract_text,
            authors: p.authors,
            year: p.year,
            venue: p.venue,
            url: p.url,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SynopsisSections {
    pub title: String,
    pub introduction: String,
    pub rationale: String,
    pub objectives: String,
    pub literature_review: String,
    pub methodology: String,
    pub feasibility: String,
    pub facilities: String,
    pub outcomes: String,
}

impl From<Synopsis> for SynopsisSections {
    fn from(s: Synopsis) -> Self {
        Self {
            title: s.title,
            introduction: s.introduction,
            rationale: s.rationale,
            objectives: s.objectives,
            literature_review: s.literature_review,
            methodology: s.methodology,
            feasibility: s.feasibility,
            facilities: s.facilities,
            outcomes: s.outcomes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PapersRes {
    pub papers: Vec<Paper>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SynopsisRes {
    pub synopsis: SynopsisSections,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SavePapersRes {
    pub message: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerateRes {
    pub papers: Vec<Paper>,
    pub synopsis: SynopsisSections,
    pub csv_path: String,
    pub markdown_path: String,
    pub docx_path: String,
    /// True when the artifacts were produced by an earlier request.
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResearchEntry {
    pub query: String,
    /// RFC 3339 timestamp of the latest stored result.
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResearchesRes {
    pub researches: Vec<ResearchEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RenderReq {
    /// Source text in the synopsis markdown dialect.
    pub markdown: String,
}

/// Error body returned with every non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_research_req_max_results_is_optional() {
        let req: ResearchReq = serde_json::from_str(r#"{"query":"soil"}"#).unwrap();
        assert_eq!(req.max_results, None);

        let req: ResearchReq =
            serde_json::from_str(r#"{"query":"soil","max_results":5}"#).unwrap();
        assert_eq!(req.max_results, Some(5));
    }

    #[test]
    fn test_paper_serializes_capitalised_keys() {
        let paper = Paper::from(PaperRecord {
            title: "T".into(),
            url: "N/A".into(),
            ..PaperRecord::default()
        });
        let value = serde_json::to_value(&paper).unwrap();
        assert_eq!(value["Title"], "T");
        assert_eq!(value["URL"], "N/A");
        assert!(value.get("Abstract").is_some());
    }
}
