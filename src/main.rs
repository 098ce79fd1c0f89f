//! Sentinel command-line entrypoint: runs one pipeline and prints the audit artifact.
//!
//! ```text
//! sentinel [--section M2.3] [--format yaml|markdown] [--file PATH]... [--no-auto-fix] <request...>
//! sentinel --health-check
//! ```

use std::sync::Arc;

use clap::Parser;
use mimalloc::MiMalloc;

use sentinel::config::Config;
use sentinel::embedding::{CachedEmbedder, Embedder, HttpEmbedder, StubEmbedder};
use sentinel::engine::Engine;
use sentinel::generation::{GenaiGenerator, OutputFormat};
use sentinel::pipeline::PipelineRequest;
use sentinel::vectordb::QdrantIndex;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const ENV_EMBED_API_KEY: &str = "SENTINEL_EMBED_API_KEY";

/// Runs one compliance pipeline and prints the JSON audit artifact.
#[derive(Debug, Parser)]
#[command(name = "sentinel", version)]
struct Args {
    /// Free-text request, e.g. `draft and validate the M2.3 QOS`.
    #[arg(required_unless_present = "health_check")]
    desc: Vec<String>,

    /// Input document for the parse step. Repeatable.
    #[arg(long = "file", value_name = "PATH")]
    files: Vec<String>,

    /// Section override (`2.3`, `M2.6`, ...).
    #[arg(long)]
    section: Option<String>,

    /// Draft format override: `yaml` or `markdown`.
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Keep violating content as-is instead of normalizing terms.
    #[arg(long)]
    no_auto_fix: bool,

    /// Only check that the vector index is reachable.
    #[arg(long)]
    health_check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::from_env()?;
    config.validate()?;

    let index = QdrantIndex::new(&config.qdrant_url)?.with_payload_prefix("metadata.");

    if args.health_check {
        index.health_check().await?;
        tracing::info!(url = %config.qdrant_url, "Vector index reachable");
        return Ok(());
    }

    let inner: Arc<dyn Embedder> = match &config.embed_url {
        Some(url) => {
            let mut embedder = HttpEmbedder::new(url, &config.embed_model, config.embed_dim)?;
            if let Ok(key) = std::env::var(ENV_EMBED_API_KEY) {
                embedder = embedder.with_api_key(key);
            }
            Arc::new(embedder)
        }
        None => {
            tracing::warn!("No SENTINEL_EMBED_URL configured, running embedder in stub mode");
            Arc::new(StubEmbedder::new(config.embed_dim))
        }
    };
    let embedder = Arc::new(CachedEmbedder::with_capacity(
        inner,
        config.embed_cache_capacity,
    ));

    tracing::info!(
        qdrant_url = %config.qdrant_url,
        embed_model = %config.embed_model,
        generation_model = %config.generation_model,
        "Sentinel starting"
    );

    let engine = Engine::builder(config.clone())
        .embedder(embedder)
        .index(Arc::new(index))
        .generator(Arc::new(GenaiGenerator::new(config.generation_model.clone())))
        .build()?;

    let mut request = PipelineRequest::new(args.desc.join(" "))
        .with_files(args.files)
        .with_auto_fix(!args.no_auto_fix);
    if let Some(section) = args.section {
        request = request.with_section(section);
    }
    if let Some(format) = args.format {
        request = request.with_output_format(format);
    }

    let output = engine.run_pipeline(&request).await;
    println!("{}", serde_json::to_string_pretty(&output)?);

    if !output.ok {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_collect_repeated_files_and_overrides() {
        let args = Args::try_parse_from([
            "sentinel",
            "--file",
            "qos.pdf",
            "--file",
            "m26_1_tox.csv",
            "--section",
            "2.6",
            "--format",
            "md",
            "--no-auto-fix",
            "draft",
            "the",
            "summary",
        ])
        .expect("should parse");

        assert_eq!(args.files, vec!["qos.pdf", "m26_1_tox.csv"]);
        assert_eq!(args.section.as_deref(), Some("2.6"));
        assert_eq!(args.format, Some(OutputFormat::Markdown));
        assert!(args.no_auto_fix);
        assert_eq!(args.desc.join(" "), "draft the summary");
    }

    #[test]
    fn test_args_require_description_unless_health_check() {
        assert!(Args::try_parse_from(["sentinel"]).is_err());

        let args = Args::try_parse_from(["sentinel", "--health-check"]).expect("should parse");
        assert!(args.health_check);
        assert!(args.desc.is_empty());
    }

    #[test]
    fn test_args_reject_unknown_format_and_flags() {
        assert!(Args::try_parse_from(["sentinel", "--format", "pdf", "check"]).is_err());
        assert!(Args::try_parse_from(["sentinel", "--verbose", "check"]).is_err());
    }
}
