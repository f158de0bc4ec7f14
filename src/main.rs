//! Offline tooling: build artifacts, evaluate score sets, authenticate one probe.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use neurokey::auth::AuthContext;
use neurokey::calibration::{CalibrationMethod, Calibrator, evaluate as reliability};
use neurokey::config::Config;
use neurokey::embedding::Matrix;
use neurokey::embedding::device::select_device;
use neurokey::evaluation::evaluate_scores;
use neurokey::prototypes::{
    EnrollmentReport, PrototypeMethod, PrototypeStore, UserId, compute_prototypes,
};
use neurokey::spoof::{AutoencoderConfig, SpoofDetector};

#[derive(Parser)]
#[command(name = "neurokey", about = "EEG biometric authentication tooling", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a prototype store from per-user enrollment embeddings.
    Prototypes {
        /// JSON object mapping user id to a list of embeddings.
        #[arg(long)]
        input: PathBuf,
        /// Defaults to the configured prototypes artifact.
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        k: Option<usize>,
        #[arg(long)]
        method: Option<PrototypeMethod>,
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Fit a calibrator from labelled similarity scores.
    Calibrate {
        /// JSON object with `scores` and boolean `labels` (true = genuine).
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        method: Option<CalibrationMethod>,
        /// Reliability bins to report.
        #[arg(long, default_value_t = 10)]
        bins: usize,
    },

    /// Train the spoof autoencoder on genuine embeddings and derive its threshold.
    TrainSpoof {
        /// JSON list of genuine embeddings.
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        hidden_dim: Option<usize>,
        #[arg(long)]
        latent_dim: Option<usize>,
        #[arg(long)]
        epochs: Option<usize>,
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long)]
        learning_rate: Option<f64>,
        #[arg(long)]
        val_split: Option<f32>,
        #[arg(long)]
        percentile: Option<f64>,
        #[arg(long)]
        seed: Option<u64>,
    },

    /// FAR/FRR/EER and accuracy from genuine and impostor score lists.
    Evaluate {
        /// JSON object with `genuine` and `impostor` score lists.
        #[arg(long)]
        input: PathBuf,
        /// Decision threshold on raw scores for the accuracy summary.
        #[arg(long, default_value_t = 0.5)]
        threshold: f64,
        /// Also report calibration error for this calibrator artifact.
        #[arg(long)]
        calibrator: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        bins: usize,
    },

    /// Authenticate one probe embedding against the configured artifacts.
    Authenticate {
        #[arg(long)]
        user_id: UserId,
        /// JSON list holding one embedding.
        #[arg(long)]
        probe: PathBuf,
    },
}

#[derive(Deserialize)]
struct LabelledScores {
    scores: Vec<f32>,
    labels: Vec<bool>,
}

#[derive(Deserialize)]
struct ScoreSets {
    genuine: Vec<f32>,
    impostor: Vec<f32>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.validate()?;

    match cli.command {
        Commands::Prototypes {
            input,
            output,
            k,
            method,
            seed,
        } => {
            let mut prototype_config = config.prototype_config();
            if let Some(k) = k {
                prototype_config.k = k;
            }
            if let Some(method) = method {
                prototype_config.method = method;
            }
            if let Some(seed) = seed {
                prototype_config.seed = seed;
            }

            let users: BTreeMap<UserId, Vec<Vec<f32>>> = read_json(&input)?;
            let dims = config.dim_config();
            let mut embeddings_by_user = HashMap::with_capacity(users.len());
            for (user_id, rows) in users {
                let embeddings = Matrix::from_rows(rows)
                    .with_context(|| format!("embeddings for user {}", user_id))?;
                dims.check(embeddings.dim())
                    .with_context(|| format!("embeddings for user {}", user_id))?;
                embeddings_by_user.insert(user_id, embeddings);
            }

            let computed = compute_prototypes(&embeddings_by_user, &prototype_config)?;
            let mut store = PrototypeStore::new();
            let mut reports = Vec::with_capacity(computed.prototypes.len());
            let mut entries: Vec<_> = computed.prototypes.into_iter().collect();
            entries.sort_unstable_by_key(|(user_id, _)| *user_id);
            for (user_id, prototypes) in entries {
                let degraded = computed.degraded.iter().any(|d| d.user_id == user_id);
                reports.push(EnrollmentReport::analyze(
                    user_id,
                    &embeddings_by_user[&user_id],
                    &prototypes,
                    degraded,
                ));
                store.insert(user_id, prototypes)?;
            }

            let output = output.unwrap_or_else(|| config.prototypes_artifact());
            store.save(&output)?;
            print_json(&json!({ "output": output, "users": reports }))
        }

        Commands::Calibrate {
            input,
            output,
            method,
            bins,
        } => {
            let data: LabelledScores = read_json(&input)?;
            let method = method.unwrap_or(config.calibration_method);
            let calibrator = Calibrator::fit(method, &data.scores, &data.labels)?;
            let curve = reliability(&calibrator, &data.scores, &data.labels, bins)?;

            let output = output.unwrap_or_else(|| config.calibrator_artifact());
            calibrator.save(&output)?;
            print_json(&json!({
                "output": output,
                "calibrator": calibrator,
                "ece": curve.expected_calibration_error(),
                "reliability": curve,
            }))
        }

        Commands::TrainSpoof {
            input,
            output,
            hidden_dim,
            latent_dim,
            epochs,
            batch_size,
            learning_rate,
            val_split,
            percentile,
            seed,
        } => {
            let rows: Vec<Vec<f32>> = read_json(&input)?;
            let genuine = Matrix::from_rows(rows)?;
            config
                .dim_config()
                .check(genuine.dim())
                .context("genuine embeddings")?;

            let defaults = config.autoencoder_config();
            let architecture = AutoencoderConfig::new(
                defaults.input_dim,
                hidden_dim.unwrap_or(defaults.hidden_dim),
                latent_dim.unwrap_or(defaults.latent_dim),
            );
            let mut training = config.training_config();
            training.epochs = epochs.unwrap_or(training.epochs);
            training.batch_size = batch_size.unwrap_or(training.batch_size);
            training.learning_rate = learning_rate.unwrap_or(training.learning_rate);
            training.val_split = val_split.unwrap_or(training.val_split);
            training.percentile = percentile.unwrap_or(training.percentile);
            training.seed = seed.unwrap_or(training.seed);

            let device = select_device()?;
            let (detector, history) =
                SpoofDetector::fit(&genuine, architecture, &training, &device)?;

            let output = output.unwrap_or_else(|| config.spoof_artifact());
            detector.save(&output)?;
            print_json(&json!({
                "output": output,
                "architecture": detector.architecture(),
                "threshold": detector.threshold(),
                "percentile": detector.percentile(),
                "final_epoch": history.last(),
            }))
        }

        Commands::Evaluate {
            input,
            threshold,
            calibrator,
            bins,
        } => {
            let sets: ScoreSets = read_json(&input)?;
            let report = evaluate_scores(&sets.genuine, &sets.impostor, threshold)?;

            let calibration = match calibrator {
                Some(path) => {
                    let calibrator = Calibrator::load(&path)?;
                    let scores: Vec<f32> =
                        sets.genuine.iter().chain(&sets.impostor).copied().collect();
                    let labels: Vec<bool> = std::iter::repeat_n(true, sets.genuine.len())
                        .chain(std::iter::repeat_n(false, sets.impostor.len()))
                        .collect();
                    let curve = reliability(&calibrator, &scores, &labels, bins)?;
                    Some(json!({
                        "ece": curve.expected_calibration_error(),
                        "reliability": curve,
                    }))
                }
                None => None,
            };

            print_json(&json!({ "report": report, "calibration": calibration }))
        }

        Commands::Authenticate { user_id, probe } => {
            let mut probes: Vec<Vec<f32>> = read_json(&probe)?;
            let embedding = match probes.len() {
                1 => probes.remove(0),
                n => anyhow::bail!("expected exactly one probe embedding, found {}", n),
            };

            let context = AuthContext::from_config(&config, select_device()?)?;
            let event = context.authenticate(user_id, &embedding)?;
            print_json(&event)
        }
    }
}
