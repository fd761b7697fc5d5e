#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use octofhir_bundle_validator::*;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "bundle-validator")]
#[command(about = "Validate FHIR bundles against a schema and the bundle house rules")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Validate a bundle file
    Validate {
        /// Path to the bundle JSON
        file: PathBuf,
        /// Schema description to use instead of the embedded one
        #[arg(short, long)]
        schema: Option<PathBuf>,
        /// Validator configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the raw input here before validating
        #[arg(long)]
        debug_output: Option<PathBuf>,
        /// Leave the document dump out of the diagnostics
        #[arg(long)]
        no_dump: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print the declared type of a dotted path, e.g. Patient.contact.name
    Resolve {
        path: String,
        /// Schema description to use instead of the embedded one
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            file,
            schema,
            config,
            debug_output,
            no_dump,
            format,
        } => {
            let mut validator_config = match config {
                Some(path) => ValidatorConfig::from_file(&path)?,
                None => ValidatorConfig::default(),
            };
            if let Some(path) = debug_output {
                validator_config = validator_config.with_debug_output(path);
            }
            if no_dump {
                validator_config = validator_config.without_document_dump();
            }

            let result = validate_file(&file, schema.as_deref(), validator_config)?;
            print_result(&result, format)?;
            if result.failed {
                std::process::exit(1);
            }
        }
        Commands::Resolve { path, schema } => {
            let registry = load_registry(schema.as_deref())?;
            let resolver = TypeResolver::new(&registry);
            println!("{path}: {}", resolver.resolve_dotted(&path));
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn load_registry(schema: Option<&Path>) -> Result<SchemaRegistry> {
    match schema {
        Some(path) => {
            let registry = SchemaRegistry::from_file(path)?;
            tracing::info!("Loaded {} schemas from {}", registry.len(), path.display());
            Ok(registry)
        }
        None => Ok(embedded_registry().clone()),
    }
}

#[cfg(feature = "cli")]
fn validate_file(
    file: &Path,
    schema: Option<&Path>,
    config: ValidatorConfig,
) -> Result<ValidationResult> {
    let text = std::fs::read_to_string(file)?;
    let validator = BundleValidator::new(load_registry(schema)?, config)?;
    Ok(validator.validate(&text))
}

#[cfg(feature = "cli")]
fn print_result(
    result: &ValidationResult,
    format: OutputFormat,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "failed": result.failed,
                "fatalCount": result.fatal_count,
                "errorCount": result.error_count,
                "warningCount": result.warning_count,
                "diagnostics": result.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            for diagnostic in result
                .diagnostics
                .iter()
                .filter(|d| d.severity > Severity::Debug)
            {
                println!("{diagnostic}");
            }
            println!();
            if result.failed {
                println!(
                    "❌ Bundle validation failed: {} fatal, {} error(s), {} warning(s)",
                    result.fatal_count, result.error_count, result.warning_count
                );
            } else {
                println!(
                    "✅ Bundle validated: {} error(s), {} warning(s)",
                    result.error_count, result.warning_count
                );
            }
        }
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Please compile with --features cli");
    std::process::exit(1);
}
