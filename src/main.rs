use anyhow::Context;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tmd_core::{CoreConfig, ReasoningService, SampleLoader};

mod batch;

/// Batch runner over a directory of annotated benchmark samples
///
/// Every sample is reasoned over with the knowledge graphs in `TMD_KG_DIR` as the corpus, and
/// its predicted observations and diagnoses are compared with the sample's annotations.
///
/// # Environment Variables
/// - `TMD_SAMPLES_DIR`: directory of `.json`/`.txt` samples (required)
/// - `TMD_KG_DIR`: directory of `*_kg.json` knowledge graphs (optional)
/// - `TMD_OUTPUT_DIR`: where `direct_evaluation_results.json` is written (default: "output")
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("tmd=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let samples_dir: PathBuf = std::env::var("TMD_SAMPLES_DIR")
        .context("TMD_SAMPLES_DIR must be set")?
        .into();
    let kg_dir: Option<PathBuf> = std::env::var("TMD_KG_DIR").ok().map(PathBuf::from);
    let output_dir: PathBuf = std::env::var("TMD_OUTPUT_DIR")
        .unwrap_or_else(|_| "output".into())
        .into();

    let mut cfg = CoreConfig::new(samples_dir.clone(), output_dir)?
        .with_samples(samples_dir, kg_dir.clone())?;
    if let Some(kg_dir) = kg_dir {
        cfg = cfg.with_guidelines(kg_dir)?;
    }

    let service = ReasoningService::load(&cfg)?;
    for skipped in service.skipped() {
        tracing::warn!("skipped {}: {}", skipped.path.display(), skipped.reason);
    }

    let loader = SampleLoader::from_config(&cfg)?;
    let results = batch::run_batch(&loader, &service)?;
    let path = results.write(cfg.output_dir())?;

    tracing::info!(
        "evaluation complete: {} samples, {} processed successfully",
        results.total(),
        results.successful()
    );
    tracing::info!("results saved to {}", path.display());

    Ok(())
}
