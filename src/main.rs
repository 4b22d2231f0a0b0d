mod repl;

use anyhow::Result;
use clap::Parser;
use datachat::llm::DEFAULT_MODEL;
use datachat::session::Session;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "datachat")]
#[command(about = "Chat with a tabular file through an OpenAI-style completion endpoint")]
struct Args {
    /// CSV or Excel file to load at startup
    file: Option<PathBuf>,

    /// OpenAI API key (or set OPENAI_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Model to use
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Override the completion endpoint base URL
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut session = Session::new();

    if let Some(key) = args.api_key.or_else(|| std::env::var("OPENAI_API_KEY").ok()) {
        session.set_credential(key);
    }
    session.set_model(&args.model)?;
    if let Some(base_url) = args.base_url {
        session.set_base_url(base_url);
    }
    if let Some(file) = &args.file {
        let dataset = session.load_dataset(file)?;
        println!(
            "Loaded '{}' ({} rows, {} columns)",
            dataset.name,
            dataset.row_count(),
            dataset.frame.width()
        );
    }

    info!("Session started with model {}", session.model());

    repl::run(&mut session).await
}
