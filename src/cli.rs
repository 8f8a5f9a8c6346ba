use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vet_triage::config::{AppConfig, TriageConfig};
use vet_triage::error::AppError;
use vet_triage::triage::{PredictionResult, TrainingData, TriageArtifacts};

#[derive(Parser, Debug)]
#[command(
    name = "Veterinary Triage",
    about = "Assess veterinary anamnesis notes for euthanasia risk, disposition and length of stay",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Assess a single anamnesis and print the recommendation
    Assess(AssessArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Anamnesis text to assess
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub(crate) text: Option<String>,
    /// Read the anamnesis from a file instead
    #[arg(long)]
    pub(crate) file: Option<PathBuf>,
    /// Print the result record as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Assess(args) => run_assessment(args),
    }
}

/// Loads the training tables and fits the artifact bundle once.
pub(crate) fn load_artifacts(config: &TriageConfig) -> Result<TriageArtifacts, AppError> {
    let data = TrainingData::from_paths(
        &config.cases_csv,
        &config.grave_diseases_csv,
        config.common_diseases_csv.as_ref(),
    )?;
    Ok(TriageArtifacts::train(&data, &config.forest)?)
}

fn run_assessment(args: AssessArgs) -> Result<(), AppError> {
    let AssessArgs { text, file, json } = args;

    let anamnesis = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => String::new(),
    };
    if anamnesis.trim().is_empty() {
        return Err(AppError::EmptyAnamnesis);
    }

    let config = AppConfig::load()?;
    let artifacts = load_artifacts(&config.triage)?;
    let prediction = artifacts.assess(&anamnesis).prediction();

    if json {
        match serde_json::to_string_pretty(&prediction) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("Result payload unavailable: {err}"),
        }
    } else {
        render_prediction(&prediction);
    }

    Ok(())
}

fn render_prediction(prediction: &PredictionResult) {
    println!("Triage result");
    println!("- Discharge: {}", yes_no(prediction.discharge));
    println!("- Admit: {}", yes_no(prediction.admit));
    println!("- Length of stay: {} day(s)", prediction.length_of_stay_days);
    println!(
        "- Euthanasia probability: {:.1}%",
        prediction.euthanasia_probability_pct
    );

    println!("\nDetected diseases");
    for disease in &prediction.detected_diseases {
        println!("- {disease}");
    }

    println!("\nDetected grave diseases");
    for disease in &prediction.detected_grave_diseases {
        println!("- {disease}");
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
