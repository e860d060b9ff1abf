//! On-disk layout of generated artifacts.
//!
//! Each query owns one directory under the data directory, named by a short hash of the query
//! text:
//!
//! ```text
//! <data_dir>/
//!   3f1a9c0e7b2d4a51/
//!     research_papers.csv
//!     research_synopsis.md
//!     research_synopsis.docx
//! ```

use crate::constants::{PAPERS_CSV_FILENAME, SYNOPSIS_DOCX_FILENAME, SYNOPSIS_MARKDOWN_FILENAME};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use synopsis_types::ResearchQuery;

const QUERY_KEY_LEN: usize = 16;

/// Directory name for a query: the first 16 hex characters of its SHA-256.
pub fn query_key(query: &ResearchQuery) -> String {
    let digest = Sha256::digest(query.as_str().as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(QUERY_KEY_LEN);
    key
}

/// Paths of the artifacts generated for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub csv: PathBuf,
    pub markdown: PathBuf,
    pub docx: PathBuf,
}

impl ArtifactPaths {
    pub fn for_query(data_dir: &Path, query: &ResearchQuery) -> Self {
        let dir = data_dir.join(query_key(query));
        Self {
            csv: dir.join(PAPERS_CSV_FILENAME),
            markdown: dir.join(SYNOPSIS_MARKDOWN_FILENAME),
            docx: dir.join(SYNOPSIS_DOCX_FILENAME),
            dir,
        }
    }
}
