//! FilingQA - Main CLI entry point
//!
//! Wires the Ollama model and the retrieval sidecar into the answering
//! pipeline, renders the progress stream while the run executes, then
//! prints the answer and any learned jargon.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use filingqa::config::Config;
use filingqa::llm::OllamaModel;
use filingqa::pipeline::state::StagePatch;
use filingqa::pipeline::Orchestrator;
use filingqa::retrieval::HttpRetriever;

/// FilingQA - ask questions about ingested SEC filings
#[derive(Parser, Debug)]
#[command(name = "filingqa")]
#[command(version)]
#[command(about = "Grounded Q&A over indexed SEC filings", long_about = None)]
struct Args {
    /// The question to answer
    #[arg(value_name = "QUESTION", required = true)]
    question: Vec<String>,

    /// Ollama model to use (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama base URL (overrides config)
    #[arg(long)]
    ollama_url: Option<String>,

    /// Retrieval sidecar base URL (overrides config)
    #[arg(long)]
    retriever_url: Option<String>,

    /// Suppress progress output, print only the answer
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let question = args.question.join(" ");

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(model) = args.model {
        config.model.name = model;
    }
    if let Some(url) = args.ollama_url {
        config.model.base_url = url;
    }
    if let Some(url) = args.retriever_url {
        config.retriever.base_url = url;
    }

    let model = OllamaModel::with_config(&config.model.base_url, &config.model.name)?;
    if !model.health_check().await {
        return Err(anyhow!(
            "Ollama is not reachable at {}. Start it with: ollama serve",
            config.model.base_url
        ));
    }

    let retriever = HttpRetriever::new(&config.retriever.base_url)?;

    let (orchestrator, mut events) = Orchestrator::new(Arc::new(retriever), Arc::new(model));

    let quiet = args.quiet;
    let progress = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if quiet {
                continue;
            }
            render_stage(&event.patch);
        }
    });

    let outcome = match orchestrator.run(&question).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{} [{}] {}", "error:".red().bold(), e.stage(), e);
            std::process::exit(1);
        }
    };

    // The bus sender lives in the orchestrator; dropping it ends the stream
    drop(orchestrator);
    let _ = progress.await;

    println!("\n{}", "Answer".green().bold());
    println!("{}", outcome.generation);

    if !outcome.jargon.is_empty() {
        println!("\n{}", "Learned jargon".green().bold());
        for (term, definition) in &outcome.jargon {
            println!("  {} {}", format!("{}:", term).cyan().bold(), definition);
        }
    }

    if outcome.exhausted {
        println!(
            "\n{}",
            format!(
                "(no relevant passages found after {} query rewrites)",
                outcome.loop_count
            )
            .yellow()
        );
    } else if !args.quiet {
        println!(
            "\n{}",
            format!(
                "(grounded on {} passages, {} rewrites)",
                outcome.documents_used, outcome.loop_count
            )
            .dimmed()
        );
    }

    Ok(())
}

/// One status line per completed stage, mirrored on the patch it produced
fn render_stage(patch: &StagePatch) {
    match patch {
        StagePatch::Retrieved { documents } => {
            eprintln!(
                "{} found {} passage(s)",
                "retrieve:".blue().bold(),
                documents.len()
            );
        }
        StagePatch::Graded { documents } => {
            eprintln!(
                "{} {} passage(s) passed the relevance filter",
                "grade:".blue().bold(),
                documents.len()
            );
        }
        StagePatch::Rewritten { question } => {
            eprintln!(
                "{} nothing relevant; retrying with: {}",
                "rewrite:".yellow().bold(),
                question.italic()
            );
        }
        StagePatch::JargonExplained { jargon } => {
            if !jargon.is_empty() {
                eprintln!(
                    "{} translating {} technical term(s) into plain English",
                    "jargon:".blue().bold(),
                    jargon.len()
                );
            }
        }
        StagePatch::Generated { .. } => {
            eprintln!("{} synthesizing plain-English answer", "generate:".blue().bold());
        }
    }
}
