#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use qr_redirect::config::{AppConfig, Secrets};
use qr_redirect::core::hash_generator::{generate_hash, record_template};
use qr_redirect::core::packager::Packager;
use qr_redirect::core::resolver::Resolver;
use qr_redirect::error::{FailureClass, Result};
use qr_redirect::fetch::source_for;
use qr_redirect::qr::{self, QrOptions};
use qr_redirect::storage::artifact_file;

#[derive(Parser)]
#[command(
    name = "qr-redirect",
    version,
    about = "Package encrypted user URL lists and resolve QR hash redirects"
)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate, encrypt and publish the user table
    Package {
        /// Plaintext user table (JSON)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write the artifact
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve a hash token to a redirect URL
    Resolve {
        hash: String,

        /// Artifact path or http(s) URL
        #[arg(short, long)]
        artifact: Option<String>,
    },

    /// Print a new random hash token and a record template
    GenerateHash,

    /// Write one QR code per user record
    Qr {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        #[arg(short, long)]
        base_url: Option<String>,
    },

    /// Write the default config file
    InitConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e.diagnostic(), "command failed");
            if e.class() == FailureClass::Unreadable {
                debug!(error = %e, "failure detail");
            }
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::InitConfig => {
            let written = AppConfig::default().save(cli.config.as_deref())?;
            println!("{}", written.display());
        }
        Command::Package { input, output } => {
            let config = load_config(cli.config.as_ref())?;
            let secrets = Secrets::from_env()?;
            let packager = Packager::new(&config, &secrets)?;
            let input = input.unwrap_or_else(|| config.input_path.clone());
            let output = output.unwrap_or_else(|| config.output_path.clone());

            let table = packager.load_table(&input)?;
            let report = packager.package(&table, &output)?;
            println!(
                "Packaged {} records ({} scheme) into {} ({} bytes)",
                report.records,
                packager.scheme(),
                report.output_path.display(),
                report.bytes_written
            );
            println!("Hashes: {}", report.hashes.join(", "));
        }
        Command::Resolve { hash, artifact } => {
            let config = load_config(cli.config.as_ref())?;
            let secrets = Secrets::from_env()?;
            let location = artifact.unwrap_or_else(|| config.artifact_location.clone());
            let source = source_for(&location, &config)?;
            let resolver = Resolver::new(&config, &secrets, source)?;
            let redirect = resolver.resolve(&hash)?;
            println!("{}", redirect.url);
        }
        Command::GenerateHash => {
            let hash = generate_hash();
            println!("{hash}");
            println!();
            println!("Add this record to your user table:");
            println!("{}", record_template(&hash)?);
        }
        Command::Qr {
            input,
            out_dir,
            base_url,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let input = input.unwrap_or_else(|| config.input_path.clone());
            let out_dir = out_dir.unwrap_or_else(|| config.qr_dir.clone());
            let options = QrOptions::new(
                base_url.unwrap_or_else(|| config.base_url.clone()),
                config.qr_min_size,
            );
            let table = artifact_file::read_table(&input)?;
            let written = qr::generate_all(&table, &out_dir, &options)?;
            println!("Generated {} QR codes in {}", written.len(), out_dir.display());
        }
    }

    Ok(())
}
