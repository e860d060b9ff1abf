use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use synopsis_core::{
    config::config_from_env, docx, document, CoreConfig, GroqClient, ResearchQuery,
    ResearchService, SemanticScholarSource, SqliteResearchStore, SynopsisService,
};

#[derive(Parser)]
#[command(name = "synopsis")]
#[command(about = "Research synopsis generator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown synopsis to .docx
    Render {
        /// Markdown input file
        input: PathBuf,
        /// Output .docx path (parent directories are created)
        output: PathBuf,
    },
    /// Run the full pipeline for a query
    Generate {
        /// Search query
        query: String,
        /// Number of papers to request
        #[arg(long)]
        max_results: Option<usize>,
    },
    /// Fetch papers for a query and export them as CSV
    Papers {
        /// Search query
        query: String,
        /// Number of papers to request
        #[arg(long)]
        max_results: Option<usize>,
    },
    /// List cached queries
    History,
}

/// Build the pipeline; drafting needs `GROQ_API_KEY`, the other commands do not.
async fn research_service(
    cfg: CoreConfig,
    drafting: bool,
) -> Result<ResearchService, Box<dyn std::error::Error>> {
    let cfg = Arc::new(cfg);
    let store = SqliteResearchStore::connect(cfg.database_url(), 1).await?;
    let source = SemanticScholarSource::new(cfg.paper_source_url());
    let mut service = ResearchService::new(cfg.clone(), Arc::new(source), Arc::new(store));
    if drafting {
        let client = GroqClient::new(cfg.completion())?;
        service = service.with_synopsis(SynopsisService::new(Arc::new(client)));
    }
    Ok(service)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Render { input, output }) => {
            match document::render_file(&input).and_then(|doc| docx::serialize(&doc, &output)) {
                Ok(()) => println!("Rendered {} to {}", input.display(), output.display()),
                Err(e) => eprintln!("Error rendering {}: {}", input.display(), e),
            }
        }
        Some(Commands::Generate { query, max_results }) => {
            let query = ResearchQuery::new(&query)?;
            let cfg = config_from_env()?;
            let max_results = max_results.unwrap_or(cfg.default_max_results());
            let service = research_service(cfg, true).await?;
            match service.generate(&query, max_results).await {
                Ok(outcome) => {
                    if outcome.cached {
                        println!("Using cached results for '{}'", query);
                    }
                    println!("Papers:   {}", outcome.csv_path.display());
                    println!("Markdown: {}", outcome.markdown_path.display());
                    println!("Document: {}", outcome.docx_path.display());
                }
                Err(e) => eprintln!("Error generating synopsis: {}", e),
            }
        }
        Some(Commands::Papers { query, max_results }) => {
            let query = ResearchQuery::new(&query)?;
            let cfg = config_from_env()?;
            let max_results = max_results.unwrap_or(cfg.default_max_results());
            let service = research_service(cfg, false).await?;
            match service.fetch_papers(&query, max_results).await {
                Ok(papers) => {
                    for paper in &papers {
                        println!("{} ({}) - {}", paper.title, paper.year, paper.authors);
                    }
                    match service.save_papers(&query, max_results).await {
                        Ok(path) => println!("Saved {} papers to {}", papers.len(), path.display()),
                        Err(e) => eprintln!("Error saving papers: {}", e),
                    }
                }
                Err(e) => eprintln!("Error fetching papers: {}", e),
            }
        }
        Some(Commands::History) => {
            let service = research_service(config_from_env()?, false).await?;
            let researches = service.history().await?;
            if researches.is_empty() {
                println!("No cached research found.");
            } else {
                for research in researches {
                    println!("{}  {}", research.created_at.to_rfc3339(), research.query);
                }
            }
        }
        None => {
            println!("Use 'synopsis --help' for commands");
        }
    }

    Ok(())
}
