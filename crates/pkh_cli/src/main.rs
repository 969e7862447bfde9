//! PKH eligibility CLI
//!
//! Single-applicant and batch predictions against a fitted artifact bundle.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pkh_eligibility_core::artifacts::{self, ArtifactFingerprint};
use pkh_eligibility_core::report::label_text;
use pkh_eligibility_core::{
    accuracy, annotate, label_distribution, predict_one, table_io, ApplicantRecord,
    EligibilityConfig, InferenceContext, PredictionResult,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "pkh-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "PKH social-welfare eligibility predictions", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Artifact directory (overrides config and PKH_ARTIFACT_DIR)
    #[arg(long, global = true)]
    artifacts: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the input fields, their fitted options and the selected features
    Schema,
    /// Predict a single applicant
    Predict {
        /// Field assignment NAME=VALUE (repeatable)
        #[arg(short, long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,

        /// JSON object with the applicant's fields
        #[arg(short, long)]
        record: Option<PathBuf>,

        /// Fill unspecified fields with the form defaults
        #[arg(long)]
        defaults: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Predict every row of a CSV table and write the annotated table
    Batch {
        /// Input CSV with a header row
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Ground-truth column used for the accuracy check
        #[arg(long)]
        ground_truth: Option<String>,
    },
    /// Hash the artifact bundle and check it loads
    Verify,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = EligibilityConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = &cli.artifacts {
        config.artifacts.dir = dir.clone();
    }

    init_logging(&config, cli.verbose)?;
    info!("PKH eligibility CLI v{}", pkh_eligibility_core::VERSION);

    match cli.command {
        Commands::Schema => show_schema(&config),
        Commands::Predict {
            fields,
            record,
            defaults,
            json,
        } => predict_single(&config, &fields, record.as_deref(), defaults, json),
        Commands::Batch {
            input,
            output,
            ground_truth,
        } => {
            if let Some(column) = ground_truth {
                config.report.ground_truth_column = column;
            }
            predict_batch(&config, &input, &output)
        }
        Commands::Verify => verify(&config),
    }
}

fn init_logging(config: &EligibilityConfig, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

fn load_context(config: &EligibilityConfig) -> Result<InferenceContext> {
    artifacts::load_context(&config.artifacts).with_context(|| {
        format!(
            "Failed to load artifacts from {}",
            config.artifacts.dir.display()
        )
    })
}

fn show_schema(config: &EligibilityConfig) -> Result<()> {
    let ctx = load_context(config)?;
    let schema = ctx.schema();

    println!("Numeric fields:");
    for name in schema.numeric_features() {
        println!("  {name}");
    }
    println!("Categorical fields:");
    for name in schema.categorical_features() {
        let options = ctx.encoder().categories(name).unwrap_or_default();
        println!("  {name}: {}", options.join(" | "));
    }
    println!("Selected features ({}):", schema.selected_features().len());
    for name in schema.selected_features() {
        println!("  {name}");
    }
    Ok(())
}

fn build_record(
    ctx: &InferenceContext,
    fields: &[String],
    record_path: Option<&Path>,
    defaults: bool,
) -> Result<ApplicantRecord> {
    let mut record = if defaults {
        ctx.default_record()
    } else {
        ApplicantRecord::new()
    };

    if let Some(path) = record_path {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read record file {}", path.display()))?;
        let from_file: ApplicantRecord =
            serde_json::from_str(&content).context("Record file must be a JSON object of fields")?;
        record.extend(from_file);
    }

    for raw in fields {
        let Some((name, value)) = ApplicantRecord::parse_assignment(raw) else {
            bail!("Invalid field assignment '{raw}', expected NAME=VALUE");
        };
        record.insert(name, value);
    }
    Ok(record)
}

fn predict_single(
    config: &EligibilityConfig,
    fields: &[String],
    record_path: Option<&Path>,
    defaults: bool,
    as_json: bool,
) -> Result<()> {
    let ctx = load_context(config)?;
    let record = build_record(&ctx, fields, record_path, defaults)?;
    let result = predict_one(&ctx, &record)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&single_json(config, &result))?);
    } else {
        println!("Prediction: {}", label_text(&config.labels, result.label));
        println!(
            "Probability {}: {:.2}%",
            config.labels.eligible,
            result.eligible_percent()
        );
        println!(
            "Probability {}: {:.2}%",
            config.labels.ineligible,
            result.ineligible_percent()
        );
    }
    Ok(())
}

fn single_json(config: &EligibilityConfig, result: &PredictionResult) -> serde_json::Value {
    json!({
        "label": result.label,
        "label_text": label_text(&config.labels, result.label),
        "probability_eligible": result.probability_eligible,
        "probability_ineligible": result.probability_ineligible,
        "eligible_percent": result.eligible_percent(),
        "ineligible_percent": result.ineligible_percent(),
    })
}

fn predict_batch(config: &EligibilityConfig, input: &Path, output: &Path) -> Result<()> {
    let ctx = load_context(config)?;
    let table = table_io::read_csv_file(input)
        .with_context(|| format!("Failed to read batch table {}", input.display()))?;
    if table.is_empty() {
        warn!("Batch table {} has no rows", input.display());
    }

    let records = table.to_records();
    let results = ctx.predict(&records)?;

    let annotated = annotate(table, &results, &config.labels, &config.report)?;
    table_io::write_csv_file(&annotated, output)
        .with_context(|| format!("Failed to write report {}", output.display()))?;

    let distribution = label_distribution(&results);
    info!(
        eligible = distribution.eligible,
        ineligible = distribution.ineligible,
        "Label distribution"
    );
    println!("Predicted {} applicant(s)", distribution.total());
    println!("  {}: {}", config.labels.eligible, distribution.eligible);
    println!("  {}: {}", config.labels.ineligible, distribution.ineligible);

    match accuracy(
        &annotated,
        &config.report.ground_truth_column,
        &config.report.prediction_column,
    ) {
        Some(report) => println!("Accuracy against '{}': {report}", config.report.ground_truth_column),
        None => info!(
            column = %config.report.ground_truth_column,
            "No ground-truth column, accuracy skipped"
        ),
    }
    println!("Report written to {}", output.display());
    Ok(())
}

fn verify(config: &EligibilityConfig) -> Result<()> {
    let fingerprint: ArtifactFingerprint =
        artifacts::fingerprint(&config.artifacts).context("Failed to hash artifacts")?;
    for file in &fingerprint.files {
        println!("{:<22} {}  {}", file.name, file.blake3, file.path.display());
    }
    println!("bundle                 {}", fingerprint.bundle);

    let ctx = load_context(config)?;
    println!(
        "OK: {} numeric, {} categorical, {} selected feature(s)",
        ctx.schema().numeric_features().len(),
        ctx.schema().categorical_features().len(),
        ctx.schema().selected_features().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeated_fields() {
        let cli = Cli::try_parse_from([
            "pkh-cli",
            "predict",
            "--field",
            "Umur=41",
            "--field",
            "Pekerjaan=BURUH",
            "--defaults",
        ])
        .unwrap();
        match cli.command {
            Commands::Predict { fields, defaults, .. } => {
                assert_eq!(fields, vec!["Umur=41", "Pekerjaan=BURUH"]);
                assert!(defaults);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_artifacts_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["pkh-cli", "verify", "--artifacts", "/srv/pkh"]).unwrap();
        assert_eq!(cli.artifacts, Some(PathBuf::from("/srv/pkh")));
    }
}
