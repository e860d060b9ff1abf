//! Constants used throughout the synopsis core crate.
//!
//! Filenames, defaults and the fixed section titles of the generated synopsis live here so the
//! markdown builder and the renderer agree on them.

/// Default directory for generated artifacts when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default SQLite database URL for the research cache.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://research.db?mode=rwc";

/// Default number of papers requested from the paper source.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Upper bound accepted for `max_results`.
pub const MAX_RESULTS_LIMIT: usize = 100;

/// Default number of papers kept as references after relevance selection.
pub const DEFAULT_RELEVANT_PAPERS: usize = 3;

/// Default chat-completions endpoint base (OpenAI compatible).
pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default completion model.
pub const DEFAULT_COMPLETION_MODEL: &str = "mixtral-8x7b-32768";

/// Default paper search endpoint.
pub const DEFAULT_PAPER_SOURCE_URL: &str = "https://api.semanticscholar.org/graph/v1/paper/search";

/// Text returned by the completion service when a request fails.
pub const COMPLETION_ERROR_PLACEHOLDER: &str = "Error generating synopsis. Please try again.";

/// Filename for the exported paper list.
pub const PAPERS_CSV_FILENAME: &str = "research_papers.csv";

/// Filename for the synopsis markdown.
pub const SYNOPSIS_MARKDOWN_FILENAME: &str = "research_synopsis.md";

/// Filename for the rendered synopsis document.
pub const SYNOPSIS_DOCX_FILENAME: &str = "research_synopsis.docx";

/// Section titles, in the order they appear after the introduction.
pub const LITERATURE_REVIEW_TITLE: &str = "Literature Review";
pub const FEASIBILITY_TITLE: &str = "Feasibility Study";
pub const METHODOLOGY_TITLE: &str = "Methodology/Planning of Project";
pub const FACILITIES_TITLE: &str = "Facilities Required for Proposed Work";
pub const OUTCOMES_TITLE: &str = "Expected Outcomes";
pub const REFERENCES_TITLE: &str = "References";
