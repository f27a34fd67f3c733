use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;

use previsor::api::{
    http_status, BatchPredictRequest, BatchPredictResponse, ErrorResponse, ModelInfoResponse,
    PredictResponse,
};
use previsor::predictor::load_records;
use previsor::{ArtifactStore, PredictionService, Predictor, ServiceError, TrainConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the model artifact (defaults to the previsor cache location)
    #[arg(short, long, global = true)]
    artifact: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a model from a historical project CSV and persist the artifact
    Train {
        /// Path to the training data CSV
        #[arg(short, long, default_value = "data/projetos.csv")]
        data: PathBuf,
    },
    /// Predict success for a single project
    Predict {
        /// Planned duration in months
        #[arg(long)]
        duracao: f64,
        /// Budget
        #[arg(long)]
        orcamento: f64,
        /// Team size
        #[arg(long)]
        tamanho_equipe: u32,
        /// Available resources: Alto, Médio or Baixo
        #[arg(long)]
        recursos: String,
    },
    /// Run batch predictions from a JSON file ({"projects": [...]})
    Batch {
        /// Path to the batch request file
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Print the model schema description
    Info,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let store = match &args.artifact {
        Some(path) => ArtifactStore::new(path)?,
        None => ArtifactStore::new_default()?,
    };

    match args.command {
        Command::Train { data } => train(store, &data),
        Command::Predict {
            duracao,
            orcamento,
            tamanho_equipe,
            recursos,
        } => predict(store, duracao, orcamento, tamanho_equipe, &recursos),
        Command::Batch { file } => batch(store, &file),
        Command::Info => model_info(store),
    }
}

fn train(store: ArtifactStore, data: &PathBuf) -> anyhow::Result<()> {
    info!("Iniciando treinamento do modelo...");
    let records = load_records(data)?;
    let (predictor, report) = Predictor::train(&records, &TrainConfig::default())?;

    println!("{}", report);
    store.save(&predictor.to_artifact())?;
    println!("Modelo salvo em: {}", store.artifact_path().display());
    Ok(())
}

fn predict(
    store: ArtifactStore,
    duracao: f64,
    orcamento: f64,
    tamanho_equipe: u32,
    recursos: &str,
) -> anyhow::Result<()> {
    let service = PredictionService::new(store);
    let input = json!({
        "duracao": duracao,
        "orcamento": orcamento,
        "tamanho_equipe": tamanho_equipe,
        "recursos": recursos,
    });

    match service.predict_one(&input) {
        Ok(outcome) => {
            let response = PredictResponse::new(input, &outcome);
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(err) => fail(err),
    }
}

fn batch(store: ArtifactStore, file: &PathBuf) -> anyhow::Result<()> {
    let body = fs::read_to_string(file)
        .with_context(|| format!("failed to read batch file {}", file.display()))?;
    let request: BatchPredictRequest =
        serde_json::from_str(&body).context("batch file is not a valid request payload")?;
    info!("Processando {} projetos em lote", request.projects.len());

    let service = PredictionService::new(store);
    match service.predict_batch(&request.projects) {
        Ok(outcomes) => {
            let response = BatchPredictResponse::new(&outcomes);
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(err) => fail(err),
    }
}

fn model_info(store: ArtifactStore) -> anyhow::Result<()> {
    let service = PredictionService::new(store);
    let trained = service.ensure_ready().is_ok();
    let response = ModelInfoResponse::new(trained);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn fail(err: ServiceError) -> anyhow::Result<()> {
    log::error!("Request failed with status {}", http_status(&err));
    let body = ErrorResponse::from_service_error(&err);
    eprintln!("{}", serde_json::to_string_pretty(&body)?);
    Err(err.into())
}
