use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cairn_core::{Answer, CairnConfig, Chunk, VectorWriter};
use cairn_engine::registry::PluginKind;
use cairn_engine::{PluginRegistry, Runtime};

#[derive(Parser)]
#[command(name = "cairn")]
#[command(about = "Retrieval-augmented answers over your own documents", long_about = None)]
struct Cli {
    /// One-shot question; omit for interactive mode
    #[arg(short, long)]
    query: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Engine paradigm to dispatch the query to
    #[arg(short, long, default_value = "classic")]
    engine: String,

    /// Text files to index into the in-memory store before answering
    #[arg(short, long)]
    ingest: Vec<PathBuf>,

    /// List registered plugins and engines, then exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cairn=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CairnConfig::from_yaml_file(path)?,
        None => CairnConfig::default(),
    };

    let plugins = PluginRegistry::with_builtins();
    for warning in plugins.diagnostics() {
        eprintln!("{} {}", "warning:".yellow(), warning);
    }

    if !cli.ingest.is_empty() {
        // the builtin memory writer and retriever share storage
        let writer = plugins.resolve_vector_writer("memory", &serde_json::Value::Null)?;
        for path in &cli.ingest {
            let inserted = ingest_file(writer.as_ref(), path).await?;
            println!("{} {} ({} chunks)", "indexed".green(), path.display(), inserted);
        }
    }

    let runtime = Runtime::with_plugins(config, plugins);

    if cli.list {
        print_catalogue(&runtime);
        return Ok(());
    }

    if let Some(query) = &cli.query {
        let answer = runtime.run(query, &cli.engine, None).await?;
        print_answer(&answer);
        return Ok(());
    }

    interactive(&runtime, &cli.engine).await
}

/// Index one text file as paragraph chunks
async fn ingest_file(store: &dyn VectorWriter, path: &Path) -> Result<usize> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let document_id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();

    let mut chunks = Vec::new();
    let mut offset = 0;
    for (i, paragraph) in text.split("\n\n").enumerate() {
        if !paragraph.trim().is_empty() {
            chunks.push(Chunk::new(
                format!("{document_id}-{i}"),
                &document_id,
                paragraph,
                offset,
            ));
        }
        offset += paragraph.len() + 2;
    }

    let stats = store.upsert(chunks).await?;
    Ok(stats.inserted)
}

async fn interactive(runtime: &Runtime, engine: &str) -> Result<()> {
    println!("{}", "cairn: ask a question, or 'exit' to quit".blue());

    let mut input = String::new();
    loop {
        print!("{} ", "?".green());
        io::stdout().flush()?;

        input.clear();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        match runtime.run(line, engine, None).await {
            Ok(answer) => print_answer(&answer),
            Err(e) => println!("{} {}", "error:".red(), e),
        }
    }
    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("\n{}", answer.text.bold());
    if !answer.provenance.is_empty() {
        println!("\n{}", "Sources:".cyan());
        for p in &answer.provenance {
            let excerpt: String = p.excerpt.chars().take(100).collect();
            println!("  {} {}", format!("[{}]", p.source_id).green(), excerpt);
        }
    }
    println!();
}

fn print_catalogue(runtime: &Runtime) {
    println!("{}", "Engines".bold());
    for (name, description) in runtime.engines().list() {
        println!("  {} {}", name.green(), description);
    }
    for kind in [
        PluginKind::Retrieval,
        PluginKind::Rerank,
        PluginKind::Chat,
        PluginKind::VectorWriter,
    ] {
        println!("{}", format!("{kind} plugins").bold());
        for (name, description) in runtime.plugins().list(kind) {
            println!("  {} {}", name.green(), description);
        }
    }
}
