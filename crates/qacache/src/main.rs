use anyhow::Result;
use clap::{Parser, Subcommand};
use qacache_common::{logger, AppConfig, QaCacheError};
use qacache_llm::OllamaClient;
use qacache_vector::RedisVectorStore;
use qacache_workflow::{resolve_pairs, AnswerSource, QaWorkflow, RunReport, DEFAULT_QUERY};
use std::path::PathBuf;
use std::sync::Arc;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env from the project root, else the current directory
fn load_dotenv() {
    match find_project_root().map(|root| root.join(".env")) {
        Some(env_path) if env_path.exists() => {
            dotenv::from_path(&env_path).ok();
        }
        _ => {
            dotenv::dotenv().ok();
        }
    }
}

#[derive(Parser)]
#[command(name = "qacache")]
#[command(about = "QaCache - Redis vector search Q&A cache with Ollama fallback", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index, load the Q&A pairs and answer one question
    Run {
        /// Question to answer
        #[arg(long, default_value = DEFAULT_QUERY)]
        query: String,

        /// JSON dataset replacing the built-in capital-city pairs
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the embedding dimension of the configured model
    Probe,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_dotenv();

    let config = AppConfig::from_env()?;
    logger::setup_logging(&config)?;

    let command = cli.command.unwrap_or(Commands::Run {
        query: DEFAULT_QUERY.to_string(),
        dataset: None,
        json: false,
    });

    if let Err(e) = execute(command, config).await {
        if e.is_external() {
            tracing::error!("External service call failed: {}", e);
        } else {
            tracing::error!("QaCache failed: {}", e);
        }
        return Err(e.into());
    }

    Ok(())
}

async fn execute(command: Commands, mut config: AppConfig) -> Result<(), QaCacheError> {
    let llm = Arc::new(OllamaClient::new(&config.ollama_base_url)?);

    match command {
        Commands::Probe => {
            let embedding = llm.embed(&config.embedding_model, qacache_workflow::PROBE_TEXT).await?;
            println!("{}", embedding.len());
        }
        Commands::Run { query, dataset, json } => {
            if dataset.is_some() {
                config.dataset_path = dataset;
            }
            let pairs = resolve_pairs(config.dataset_path.as_deref())?;

            tracing::info!("QaCache starting...");
            tracing::info!("  Redis: {}", config.redis_url);
            tracing::info!("  Ollama: {}", config.ollama_base_url);
            tracing::info!("  Index: {} ({})", config.index_name, config.distance_metric);

            let store = Arc::new(RedisVectorStore::connect(&config.redis_url).await?);
            let workflow = QaWorkflow::new(llm, store, config);
            let report = workflow.run(&pairs, &query).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!("✅ 임베딩 차원: {}", report.dimension);
    println!("✅ Redis에 데이터 적재 완료 ({}건)", report.loaded);

    match &report.answer.source {
        AnswerSource::Cache { .. } => println!("🔍 Redis 검색 결과: {}", report.answer.text),
        AnswerSource::Generated => println!("⚠️ Redis에서 검색 결과 없음"),
    }

    println!("🤖 최종 답변: {}", report.answer.text);
}
