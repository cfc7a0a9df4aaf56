use api_shared::{CheckInteractionRes, DiagnoseRes, ReferenceRes};
use clap::{Args, Parser, Subcommand};
use medintel_core::constants::{DEFAULT_MODEL_SEED, DEFAULT_TREE_COUNT};
use medintel_core::{
    CoreConfig, DecisionService, ForestParams, SymptomObservation, DEFAULT_MODEL_PATH,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medintel")]
#[command(about = "MedIntel diagnosis and medication safety CLI")]
struct Cli {
    #[command(flatten)]
    model: ModelArgs,

    /// Print results as JSON, in the same shape the REST API returns
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ModelArgs {
    /// Path of the stored model artifact
    #[arg(long, global = true, env = "MEDINTEL_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    model_path: PathBuf,
    /// Reference data YAML to use instead of the built-in tables
    #[arg(long, global = true, env = "MEDINTEL_REFERENCE_DATA")]
    reference_data: Option<PathBuf>,
    /// Seed for training
    #[arg(long, global = true, env = "MEDINTEL_MODEL_SEED", default_value_t = DEFAULT_MODEL_SEED)]
    seed: u64,
    /// Number of trees in the forest
    #[arg(long, global = true, env = "MEDINTEL_MODEL_TREES", default_value_t = DEFAULT_TREE_COUNT)]
    trees: usize,
}

impl ModelArgs {
    fn into_config(self) -> Result<CoreConfig, Box<dyn std::error::Error>> {
        let forest = ForestParams {
            n_estimators: self.trees,
            seed: self.seed,
            max_depth: None,
        };
        Ok(CoreConfig::new(self.model_path, self.reference_data, forest)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the most likely condition from the symptoms present
    Diagnose {
        /// Symptom names, e.g. `fever cough`
        symptoms: Vec<String>,
    },
    /// Screen medications for interactions and allergy conflicts
    Check {
        /// Medication to screen (repeatable)
        #[arg(long = "medication", short = 'm', required = true)]
        medications: Vec<String>,
        /// Known patient allergy (repeatable)
        #[arg(long = "allergy", short = 'a')]
        allergies: Vec<String>,
    },
    /// Fit a fresh model and overwrite the stored artifact
    Train,
    /// List the known symptoms, conditions and allergy categories
    Symptoms,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let json = cli.json;

    let Some(command) = cli.command else {
        println!("Use 'medintel --help' for commands");
        return Ok(());
    };

    let cfg = cli.model.into_config()?;
    let service = DecisionService::new(&cfg)?;

    match command {
        Commands::Diagnose { symptoms } => {
            let observation = SymptomObservation::from_names(&symptoms);
            let res = DiagnoseRes::from(&service.diagnose(&observation)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&res)?);
            } else {
                println!("Disease: {}, Confidence: {}%", res.disease, res.confidence);
                if res.symptoms_detected.is_empty() {
                    println!("No known symptoms detected.");
                } else {
                    println!("Symptoms detected: {}", res.symptoms_detected.join(", "));
                }
            }
        }
        Commands::Check {
            medications,
            allergies,
        } => {
            let res = CheckInteractionRes::from(service.screen(&medications, &allergies));
            if json {
                println!("{}", serde_json::to_string_pretty(&res)?);
            } else {
                println!("Medications checked: {}", res.medications_checked.join(", "));
                if res.drug_interactions.is_empty() && res.allergy_warnings.is_empty() {
                    println!("No interactions or allergy conflicts found.");
                }
                for finding in &res.drug_interactions {
                    println!(
                        "[{}] {} + {}: {}",
                        finding.severity, finding.medication1, finding.medication2, finding.warning
                    );
                }
                for finding in &res.allergy_warnings {
                    println!("[{}] {}", finding.severity, finding.warning);
                }
            }
        }
        Commands::Train => {
            let classifier = service.retrain()?;
            println!(
                "Trained {} trees over {} conditions; saved to {}",
                cfg.forest().n_estimators,
                classifier.conditions().len(),
                cfg.model_path().display()
            );
        }
        Commands::Symptoms => {
            let res = ReferenceRes::from(service.reference());
            if json {
                println!("{}", serde_json::to_string_pretty(&res)?);
            } else {
                println!("Symptoms: {}", res.symptoms.join(", "));
                println!("Conditions: {}", res.conditions.join(", "));
                println!("Allergy categories: {}", res.allergies.join(", "));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_requires_a_medication() {
        assert!(Cli::try_parse_from(["medintel", "check"]).is_err());
        let cli = Cli::try_parse_from([
            "medintel", "check", "-m", "aspirin", "-m", "warfarin", "-a", "nsaids",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Check {
                medications,
                allergies,
            }) => {
                assert_eq!(medications, vec!["aspirin", "warfarin"]);
                assert_eq!(allergies, vec!["nsaids"]);
            }
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn test_model_args_build_config() {
        let cli = Cli::try_parse_from([
            "medintel",
            "--trees",
            "5",
            "--seed",
            "9",
            "--model-path",
            "/tmp/medintel-model.json",
            "train",
        ])
        .unwrap();
        let cfg = cli.model.into_config().unwrap();
        assert_eq!(cfg.forest().n_estimators, 5);
        assert_eq!(cfg.forest().seed, 9);
        assert_eq!(cfg.model_path(), std::path::Path::new("/tmp/medintel-model.json"));
    }

    #[test]
    fn test_zero_trees_is_rejected() {
        let cli = Cli::try_parse_from(["medintel", "--trees", "0", "train"]).unwrap();
        assert!(cli.model.into_config().is_err());
    }
}
