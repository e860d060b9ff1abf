//! The research pipeline.
//!
//! [`ResearchService`] owns handles to the paper source, the synopsis drafter and the research
//! store, and runs the steps exposed by the HTTP API and the CLI. Every step consults the store
//! first; a cache hit short-circuits the network calls.

use crate::artifacts::ArtifactPaths;
use crate::config::{validate_max_results, CoreConfig};
use crate::docx::{docx_bytes, serialize, write_atomic};
use crate::document::render;
use crate::markdown::MarkdownService;
use crate::papers::{select_relevant, write_papers_csv, PaperSource};
use crate::store::{ResearchRecord, ResearchStore, ResearchSummary};
use crate::synopsis::SynopsisService;
use crate::{SynopsisError, SynopsisResult};
use std::path::PathBuf;
use std::sync::Arc;
use synopsis_types::{PaperRecord, ResearchQuery, Synopsis};

/// Result of a full pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub papers: Vec<PaperRecord>,
    pub synopsis: Synopsis,
    pub csv_path: PathBuf,
    pub markdown_path: PathBuf,
    pub docx_path: PathBuf,
    /// True when the artifacts came from an earlier run.
    pub cached: bool,
}

impl GenerationOutcome {
    fn from_cache(record: ResearchRecord) -> Option<Self> {
        let docx_path = record.docx_path.filter(|p| p.is_file())?;
        Some(Self {
            papers: record.papers,
            synopsis: record.synopsis?,
            csv_path: record.csv_path?,
            markdown_path: record.markdown_path?,
            docx_path,
            cached: true,
        })
    }
}

/// Writes the CSV, markdown and rendered `.docx` for one run. Blocking.
fn write_artifacts(
    papers: &[PaperRecord],
    markdown: &str,
    paths: &ArtifactPaths,
) -> SynopsisResult<()> {
    write_papers_csv(papers, &paths.csv)?;
    write_atomic(&paths.markdown, markdown.as_bytes())?;
    serialize(&render(markdown)?, &paths.docx)
}

/// Runs the research pipeline against injected collaborators.
///
/// Drafting is optional: without a [`SynopsisService`] the paper, render and history steps
/// still work, and the drafting steps fail with `SynopsisError::InvalidInput` unless a cached
/// synopsis exists.
#[derive(Clone)]
pub struct ResearchService {
    cfg: Arc<CoreConfig>,
    source: Arc<dyn PaperSource>,
    store: Arc<dyn ResearchStore>,
    synopsis: Option<SynopsisService>,
    markdown: MarkdownService,
}

impl ResearchService {
    pub fn new(
        cfg: Arc<CoreConfig>,
        source: Arc<dyn PaperSource>,
        store: Arc<dyn ResearchStore>,
    ) -> Self {
        Self {
            cfg,
            source,
            store,
            synopsis: None,
            markdown: MarkdownService::new(),
        }
    }

    /// Enable synopsis drafting.
    pub fn with_synopsis(mut self, synopsis: SynopsisService) -> Self {
        self.synopsis = Some(synopsis);
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    fn drafter(&self) -> SynopsisResult<&SynopsisService> {
        self.synopsis.as_ref().ok_or_else(|| {
            SynopsisError::InvalidInput(
                "synopsis drafting is disabled; set GROQ_API_KEY to enable it".into(),
            )
        })
    }

    /// Papers for `query`, from the cache or from the paper source.
    ///
    /// Fresh results are stored before returning.
    ///
    /// # Errors
    ///
    /// - `SynopsisError::InvalidInput` if `max_results` is out of range,
    /// - `SynopsisError::NoPapers` if the source returns nothing,
    /// - `SynopsisError::Upstream` or `SynopsisError::Database` from the collaborators.
    pub async fn fetch_papers(
        &self,
        query: &ResearchQuery,
        max_results: usize,
    ) -> SynopsisResult<Vec<PaperRecord>> {
        let max_results = validate_max_results(max_results)?;

        if let Some(record) = self.store.find(query).await? {
            if !record.papers.is_empty() {
                tracing::info!("using cached papers for '{}'", query);
                return Ok(record.papers);
            }
        }

        let papers = self.source.search(query, max_results).await?;
        if papers.is_empty() {
            return Err(SynopsisError::NoPapers(query.to_string()));
        }

        self.store
            .save(&ResearchRecord::new(query.clone(), papers.clone()))
            .await?;
        Ok(papers)
    }

    /// Synopsis for `query`, drafting one if none is cached.
    ///
    /// # Errors
    ///
    /// As [`ResearchService::fetch_papers`], and `SynopsisError::InvalidInput` if drafting is
    /// disabled and nothing is cached.
    pub async fn analyze(
        &self,
        query: &ResearchQuery,
        max_results: usize,
    ) -> SynopsisResult<Synopsis> {
        if let Some(synopsis) = self.cached_synopsis(query).await? {
            tracing::info!("using cached synopsis for '{}'", query);
            return Ok(synopsis);
        }

        let drafter = self.drafter()?;
        let papers = self.fetch_papers(query, max_results).await?;
        let synopsis = drafter.create_synopsis(&papers).await?;

        let mut record = ResearchRecord::new(query.clone(), papers);
        record.synopsis = Some(synopsis.clone());
        self.store.save(&record).await?;
        Ok(synopsis)
    }

    /// Fetches papers and exports them as CSV, returning the file path.
    ///
    /// # Errors
    ///
    /// As [`ResearchService::fetch_papers`], plus the file errors of
    /// [`write_papers_csv`].
    pub async fn save_papers(
        &self,
        query: &ResearchQuery,
        max_results: usize,
    ) -> SynopsisResult<PathBuf> {
        let papers = self.fetch_papers(query, max_results).await?;
        let csv = ArtifactPaths::for_query(self.cfg.data_dir(), query).csv;
        let target = csv.clone();
        tokio::task::spawn_blocking(move || write_papers_csv(&papers, &target)).await??;
        Ok(csv)
    }

    /// Runs the whole pipeline: papers, synopsis, markdown and the rendered document.
    ///
    /// A previous run whose document still exists on disk is returned as is, with
    /// `cached = true`. A cached synopsis is reused even when the files have gone.
    ///
    /// # Errors
    ///
    /// Any error of the individual steps; nothing is retried.
    pub async fn generate(
        &self,
        query: &ResearchQuery,
        max_results: usize,
    ) -> SynopsisResult<GenerationOutcome> {
        if let Some(outcome) = self
            .store
            .find(query)
            .await?
            .and_then(GenerationOutcome::from_cache)
        {
            tracing::info!("using cached artifacts for '{}'", query);
            return Ok(outcome);
        }

        let papers = self.fetch_papers(query, max_results).await?;
        let synopsis = match self.cached_synopsis(query).await? {
            Some(synopsis) => synopsis,
            None => self.drafter()?.create_synopsis(&papers).await?,
        };

        let references = select_relevant(&papers, self.cfg.relevant_papers());
        let markdown = self.markdown.synopsis_render(&synopsis, &references);

        let paths = ArtifactPaths::for_query(self.cfg.data_dir(), query);
        let (rows, targets) = (papers.clone(), paths.clone());
        tokio::task::spawn_blocking(move || write_artifacts(&rows, &markdown, &targets)).await??;
        tracing::info!("generated synopsis for '{}' in {}", query, paths.dir.display());

        let record = ResearchRecord {
            synopsis: Some(synopsis.clone()),
            csv_path: Some(paths.csv.clone()),
            markdown_path: Some(paths.markdown.clone()),
            docx_path: Some(paths.docx.clone()),
            ..ResearchRecord::new(query.clone(), papers.clone())
        };
        self.store.save(&record).await?;

        Ok(GenerationOutcome {
            papers,
            synopsis,
            csv_path: paths.csv,
            markdown_path: paths.markdown,
            docx_path: paths.docx,
            cached: false,
        })
    }

    /// Renders markdown straight to `.docx` bytes without touching the disk.
    ///
    /// # Errors
    ///
    /// `SynopsisError::Parse` for empty input, `SynopsisError::DocxPack` if packing fails.
    pub fn render_markdown(&self, markdown: &str) -> SynopsisResult<Vec<u8>> {
        docx_bytes(&render(markdown)?)
    }

    /// Cached queries, most recent first.
    pub async fn history(&self) -> SynopsisResult<Vec<ResearchSummary>> {
        self.store.list().await
    }

    async fn cached_synopsis(&self, query: &ResearchQuery) -> SynopsisResult<Option<Synopsis>> {
        Ok(self.store.find(query).await?.and_then(|r| r.synopsis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionService;
    use crate::store::SqliteResearchStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FixedSource {
        papers: Vec<PaperRecord>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PaperSource for FixedSource {
        async fn search(
            &self,
            _query: &ResearchQuery,
            limit: usize,
        ) -> SynopsisResult<Vec<PaperRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.papers.iter().take(limit).cloned().collect())
        }
    }

    struct CannedCompletion {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionService for CannedCompletion {
        async fn complete(&self, _prompt: &str) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            "1. First point\n\n2. Second point".to_string()
        }
    }

    struct Fixture {
        service: ResearchService,
        source: Arc<FixedSource>,
        completion: Arc<CannedCompletion>,
        _dir: TempDir,
    }

    fn paper(title: &str) -> PaperRecord {
        PaperRecord {
            title: title.into(),
            abstract_text: "Abstract.".into(),
            authors: "Doe, J.".into(),
            year: "2022".into(),
            venue: "Journal".into(),
            url: "https://example.org".into(),
        }
    }

    async fn fixture(papers: Vec<PaperRecord>) -> Fixture {
        let dir = TempDir::new().unwrap();
        let cfg = Arc::new(CoreConfig::with_data_dir(dir.path().to_path_buf()));
        let source = Arc::new(FixedSource {
            papers,
            calls: AtomicUsize::new(0),
        });
        let completion = Arc::new(CannedCompletion {
            calls: AtomicUsize::new(0),
        });
        let store = SqliteResearchStore::connect("sqlite::memory:", 1)
            .await
            .unwrap();

        let service = ResearchService::new(cfg, source.clone(), Arc::new(store))
            .with_synopsis(SynopsisService::new(completion.clone()));
        Fixture {
            service,
            source,
            completion,
            _dir: dir,
        }
    }

    fn query(text: &str) -> ResearchQuery {
        ResearchQuery::new(text).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_papers_caches_results() {
        let fx = fixture(vec![paper("Soil Sensing"), paper("Soil Moisture")]).await;

        let first = fx.service.fetch_papers(&query("soil"), 10).await.unwrap();
        let second = fx.service.fetch_papers(&query("soil"), 10).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fx.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_papers_empty_result_is_no_papers() {
        let fx = fixture(Vec::new()).await;
        let result = fx.service.fetch_papers(&query("nothing"), 10).await;
        assert!(matches!(result, Err(SynopsisError::NoPapers(_))));
    }

    #[tokio::test]
    async fn test_fetch_papers_rejects_zero_max_results() {
        let fx = fixture(vec![paper("A")]).await;
        let result = fx.service.fetch_papers(&query("a"), 0).await;
        assert!(matches!(result, Err(SynopsisError::InvalidInput(_))));
        assert_eq!(fx.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_analyze_reuses_cached_synopsis() {
        let fx = fixture(vec![paper("Soil Sensing")]).await;

        let first = fx.service.analyze(&query("soil"), 5).await.unwrap();
        let second = fx.service.analyze(&query("soil"), 5).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fx.completion.calls.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn test_analyze_without_drafter_is_invalid_input() {
        let fx = fixture(vec![paper("Soil Sensing")]).await;
        let service = ResearchService::new(
            Arc::new(fx.service.config().clone()),
            fx.source.clone(),
            fx.service.store.clone(),
        );

        let result = service.analyze(&query("soil"), 5).await;
        assert!(matches!(result, Err(SynopsisError::InvalidInput(_))));
        assert_eq!(fx.source.calls.load(Ordering::SeqCst), 0);

        // Papers still work without a drafter.
        assert_eq!(service.fetch_papers(&query("soil"), 5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_papers_writes_csv() {
        let fx = fixture(vec![paper("Soil Sensing")]).await;
        let path = fx.service.save_papers(&query("soil"), 5).await.unwrap();
        assert!(path.is_file());
        assert!(path.ends_with("research_papers.csv"));
    }

    #[tokio::test]
    async fn test_generate_writes_artifacts_then_hits_cache() {
        let fx = fixture(vec![paper("Soil Sensing"), paper("Crop Models")]).await;

        let outcome = fx.service.generate(&query("soil"), 10).await.unwrap();
        assert!(!outcome.cached);
        assert!(outcome.csv_path.is_file());
        assert!(outcome.docx_path.is_file());

        let markdown = std::fs::read_to_string(&outcome.markdown_path).unwrap();
        assert!(markdown.contains("# References"));
        assert!(markdown.contains("Doe, J. (2022). Soil Sensing. Retrieved from https://example.org"));

        let again = fx.service.generate(&query("soil"), 10).await.unwrap();
        assert!(again.cached);
        assert_eq!(again.docx_path, outcome.docx_path);
        assert_eq!(fx.completion.calls.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn test_generate_regenerates_when_document_is_missing() {
        let fx = fixture(vec![paper("Soil Sensing")]).await;

        let outcome = fx.service.generate(&query("soil"), 10).await.unwrap();
        std::fs::remove_file(&outcome.docx_path).unwrap();

        let again = fx.service.generate(&query("soil"), 10).await.unwrap();
        assert!(!again.cached);
        assert!(again.docx_path.is_file());
        // The cached synopsis is reused, so no new prompts are sent.
        assert_eq!(fx.completion.calls.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn test_generate_reports_artifact_write_failure() {
        let fx = fixture(vec![paper("Soil Sensing")]).await;
        let blocker = fx._dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let service = ResearchService::new(
            Arc::new(CoreConfig::with_data_dir(blocker)),
            fx.source.clone(),
            fx.service.store.clone(),
        )
        .with_synopsis(SynopsisService::new(fx.completion.clone()));

        let result = service.generate(&query("soil"), 10).await;
        assert!(matches!(result, Err(SynopsisError::DirCreation(_))));
        assert!(matches!(
            service.save_papers(&query("soil"), 10).await,
            Err(SynopsisError::DirCreation(_))
        ));

        // Nothing with a document path was recorded.
        let record = fx.service.store.find(&query("soil")).await.unwrap().unwrap();
        assert!(record.docx_path.is_none());
    }

    #[tokio::test]
    async fn test_render_markdown_and_history() {
        let fx = fixture(vec![paper("Soil Sensing")]).await;

        let bytes = fx.service.render_markdown("# Title\n\nBody").unwrap();
        assert!(bytes.starts_with(b"PK"));
        assert!(matches!(
            fx.service.render_markdown("   "),
            Err(SynopsisError::Parse(_))
        ));

        fx.service.fetch_papers(&query("soil"), 3).await.unwrap();
        let history = fx.service.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].query, "soil");
    }
}
