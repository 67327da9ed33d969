use chrono::Utc;
use clap::{Parser, Subcommand};
use pdf_qa_core::{
    extract_text, ChatCompletionClient, PageSelection, PdfAnswerer, PdfDescriptor, PdfProcessor,
    PineconeEmbedder, PineconeStore, ProcessingOptions, TracingProgressSink,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-qa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Pinecone control-plane URL
    #[arg(long, default_value = "https://api.pinecone.io")]
    pinecone_url: String,

    /// Pinecone API key
    #[arg(long, env = "PINECONE_API_KEY", default_value = "")]
    pinecone_api_key: String,

    /// Vector index name
    #[arg(long, default_value = "pdf-qa")]
    index_name: String,

    /// Embedding dimensionality of the index
    #[arg(long, default_value = "1024")]
    dimension: usize,

    /// Embedding model requested from the inference endpoint
    #[arg(long, default_value = "llama-text-embed-v2")]
    embed_model: String,

    /// OpenAI-compatible completion endpoint
    #[arg(long, default_value = "https://api.groq.com/openai/v1/")]
    completion_url: String,

    /// Completion API key
    #[arg(long, env = "GROQ_API_KEY", default_value = "")]
    completion_api_key: String,

    /// Completion model
    #[arg(long, default_value = "openai/gpt-oss-120b")]
    completion_model: String,
}

#[derive(Subcommand)]
enum Command {
    /// Extract raw text from PDF pages.
    Extract {
        #[arg(long)]
        pdf: PathBuf,
        /// "all" or a comma-separated 1-based page list, e.g. "1,3,5".
        #[arg(long, default_value = "all")]
        pages: String,
    },
    /// Process a PDF and print the descriptor later questions will use.
    Process {
        #[arg(long)]
        pdf: PathBuf,
    },
    /// Chunk, embed, and upsert a PDF into the vector index regardless of
    /// its page count.
    Ingest {
        #[arg(long)]
        pdf: PathBuf,
    },
    /// Answer a question about a processed PDF.
    Ask {
        /// Path to a descriptor JSON file, or the descriptor JSON itself.
        #[arg(long)]
        descriptor: String,
        #[arg(long)]
        question: String,
    },
    /// Answer a question about a saved text file (scraped page, transcript).
    AskText {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        question: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        "pdf-qa boot"
    );

    // Tool-surface contract: operations report failures as an error payload,
    // never as a crash.
    let payload = match run(cli).await {
        Ok(payload) => payload,
        Err(error) => json!({ "error": error.to_string() }),
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<Value> {
    let options = ProcessingOptions {
        embed_model: cli.embed_model.clone(),
        ..ProcessingOptions::default()
    };

    match &cli.command {
        Command::Extract { pdf, pages } => {
            let selection = PageSelection::parse(pages)?;
            let text = extract_text(pdf, &selection)?;
            Ok(json!({ "status": "success", "text": text }))
        }
        Command::Process { pdf } => {
            let store = PineconeStore::new(
                &cli.pinecone_url,
                &cli.pinecone_api_key,
                &cli.index_name,
                cli.dimension,
            )?;
            let embedder = PineconeEmbedder::new(
                &cli.pinecone_url,
                &cli.pinecone_api_key,
                &cli.embed_model,
                cli.dimension,
            )?;
            let processor = PdfProcessor::new(store, embedder, TracingProgressSink, options);

            let descriptor = processor.process(pdf).await?;
            let mut payload = serde_json::to_value(&descriptor)?;
            payload["status"] = "success".into();
            Ok(payload)
        }
        Command::Ingest { pdf } => {
            let store = PineconeStore::new(
                &cli.pinecone_url,
                &cli.pinecone_api_key,
                &cli.index_name,
                cli.dimension,
            )?;
            let embedder = PineconeEmbedder::new(
                &cli.pinecone_url,
                &cli.pinecone_api_key,
                &cli.embed_model,
                cli.dimension,
            )?;
            let processor = PdfProcessor::new(store, embedder, TracingProgressSink, options);

            let ingestion = processor.ingest_vector(pdf).await?;
            Ok(json!({
                "status": "success",
                "namespace": ingestion.namespace,
                "chunk_count": ingestion.chunk_count,
            }))
        }
        Command::Ask {
            descriptor,
            question,
        } => {
            let raw = if Path::new(descriptor).exists() {
                std::fs::read_to_string(descriptor)?
            } else {
                descriptor.clone()
            };
            let descriptor: PdfDescriptor = serde_json::from_str(&raw)
                .map_err(|error| anyhow::anyhow!("invalid descriptor: {error}"))?;

            let answerer = build_answerer(&cli, options)?;
            let answer = answerer.answer(question, &descriptor).await?;
            Ok(json!({ "status": "success", "answer": answer }))
        }
        Command::AskText { file, question } => {
            if !file.exists() {
                anyhow::bail!("file not found at {}", file.display());
            }
            let content = std::fs::read_to_string(file)?;
            if content.trim().is_empty() {
                anyhow::bail!("the text file is empty");
            }

            let answerer = build_answerer(&cli, options)?;
            let answer = answerer.answer_raw_text(question, &content).await?;
            Ok(json!({ "status": "success", "answer": answer }))
        }
    }
}

fn build_answerer(
    cli: &Cli,
    options: ProcessingOptions,
) -> anyhow::Result<PdfAnswerer<PineconeStore, PineconeEmbedder, ChatCompletionClient>> {
    let store = PineconeStore::new(
        &cli.pinecone_url,
        &cli.pinecone_api_key,
        &cli.index_name,
        cli.dimension,
    )?;
    let embedder = PineconeEmbedder::new(
        &cli.pinecone_url,
        &cli.pinecone_api_key,
        &cli.embed_model,
        cli.dimension,
    )?;
    let completion = ChatCompletionClient::new(
        &cli.completion_url,
        &cli.completion_api_key,
        &cli.completion_model,
    )?;

    Ok(PdfAnswerer::new(store, embedder, completion, options))
}
