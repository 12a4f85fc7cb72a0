use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tmd_core::validation::{validate_case_has_content, validate_observation_pairs};
use tmd_core::{Case, CaseStore, CoreConfig, ReasoningService};
use tmd_evaluation::EvaluationConfig;

mod pipeline;
mod report;

use report::CaseReport;

#[derive(Parser)]
#[command(name = "tmd")]
#[command(about = "Transparent clinical reasoning CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reason over a case, evaluate the trail and write the results
    Reason {
        /// Case file, or a case identifier in the case directory
        case: String,
        /// Directory the results file is written to
        #[arg(long)]
        output: PathBuf,
        /// Guideline file or directory
        #[arg(long)]
        guidelines: Option<PathBuf>,
        /// Directory of stored cases
        #[arg(long, default_value = "data/cases")]
        cases: PathBuf,
        /// Evaluation configuration file (JSON or YAML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Rank guidelines against a clinical vignette
    Rank {
        /// Case file, or a case identifier in the case directory
        case: String,
        /// Guideline file or directory
        #[arg(long)]
        guidelines: PathBuf,
        /// Directory of stored cases
        #[arg(long, default_value = "data/cases")]
        cases: PathBuf,
    },
    /// Print the resolved evaluation configuration
    Config {
        /// Evaluation configuration file (JSON or YAML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("tmd=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Reason {
            case,
            output,
            guidelines,
            cases,
            config,
        }) => {
            let mut cfg = CoreConfig::new(cases, output)?;
            if let Some(guidelines) = guidelines {
                cfg = cfg.with_guidelines(guidelines)?;
            }

            let case = load_case(&case, cfg.case_dir())?;
            validate_case_has_content(&case)?;
            if let Case::Observations(observations) = &case {
                if let Err(e) = validate_observation_pairs(observations) {
                    tracing::warn!("{e}, pairing up to the shorter list");
                }
            }

            let service = ReasoningService::load(&cfg)?;
            for skipped in service.skipped() {
                tracing::warn!("skipped {}: {}", skipped.path.display(), skipped.reason);
            }

            let eval_cfg = EvaluationConfig::load(config.as_deref())?;
            let metrics = eval_cfg.hashing_metrics()?;

            let steps = service.reason(&case);
            let evaluation = pipeline::evaluate_case(&metrics, service.corpus(), &case, &steps)?;
            let report = CaseReport::new(case.id().clone(), steps, evaluation, &eval_cfg.weights);
            let path = report.write(cfg.output_dir())?;

            tracing::info!(
                "case {} scored {:.3} over {} steps",
                report.case_id,
                report.overall_score,
                report.diagnostic_steps.len()
            );
            println!("{}", path.display());
        }
        Some(Commands::Rank {
            case,
            guidelines,
            cases,
        }) => {
            let cfg = CoreConfig::new(cases, PathBuf::from("."))?.with_guidelines(guidelines)?;
            let Case::Vignette(vignette) = load_case(&case, cfg.case_dir())? else {
                bail!("guideline ranking needs a clinical vignette, not an observation case");
            };
            let service = ReasoningService::load(&cfg)?;

            let ranked = service.rank(&vignette);
            if ranked.is_empty() {
                println!("No guideline matched.");
            }
            for matched in ranked {
                println!(
                    "{:.3}  {}  {}",
                    matched.match_score, matched.guideline.id, matched.guideline.title
                );
            }
        }
        Some(Commands::Config { config }) => {
            let eval_cfg = EvaluationConfig::load(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&eval_cfg)?);
        }
        None => {
            println!("Use 'tmd --help' for commands");
        }
    }

    Ok(())
}

/// Load a case from a file path, or by identifier from the case directory.
fn load_case(case: &str, cases: &Path) -> anyhow::Result<Case> {
    let path = Path::new(case);
    let loaded = if path.is_file() {
        CaseStore::load_path(path)
    } else {
        CaseStore::new(cases).load(case)
    };
    loaded.with_context(|| format!("loading case {case}"))
}
