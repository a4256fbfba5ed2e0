//! Attestation CLI Binary

use std::path::PathBuf;

use anyhow::Result;
use attestation_cli::commands;
use attestation_cli::{CliConfig, GenerateOptions, ProfileArgs};
use attestation_core::validation::format_birthday_input;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "attestation")]
#[command(version, about = "Fill the international travel attestation PDF")]
struct Cli {
    /// Template PDF (overrides ATTESTATION_TEMPLATE)
    #[arg(long, global = true)]
    template: Option<PathBuf>,

    /// Output directory (overrides ATTESTATION_OUTPUT_DIR)
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// Profile store file (overrides ATTESTATION_STORE)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Layout JSON replacing the built-in coordinates (overrides ATTESTATION_LAYOUT)
    #[arg(long, global = true)]
    layout: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an attestation and save it to the output directory
    Generate {
        /// Read the whole form from a JSON submission file
        #[arg(long, conflicts_with_all = ["category", "reason"])]
        form: Option<PathBuf>,

        #[command(flatten)]
        profile: ProfileArgs,

        /// Traveler category: tiers, eu or fr
        #[arg(long)]
        category: Option<String>,

        /// Reason code, repeatable
        #[arg(long)]
        reason: Vec<String>,

        /// Also write the QR code as PNG
        #[arg(long)]
        save_qr: Option<PathBuf>,
    },
    /// Manage the stored profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Print the active layout as JSON
    Layout,
    /// Normalize a partially typed birth date (DD/MM/YYYY)
    Birthday { input: String },
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    /// Store profile fields for later runs
    Save {
        #[command(flatten)]
        profile: ProfileArgs,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        reason: Vec<String>,
    },
    /// Print the stored entries
    Show,
    /// Remove every stored entry
    Clear,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // stdout carries command output, logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config =
        CliConfig::from_env().with_overrides(cli.template, cli.out_dir, cli.store, cli.layout);
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Command::Generate {
            form,
            profile,
            category,
            reason,
            save_qr,
        } => {
            let options = GenerateOptions {
                form,
                profile,
                category,
                reasons: reason,
                save_qr,
            };
            let now = chrono::Local::now().naive_local();
            let generated = commands::generate(&config, &options, &now)?;
            for warning in &generated.warnings {
                eprintln!("{}", warning);
            }
            println!("{}", generated.path.display());
        }
        Command::Profile { action } => match action {
            ProfileAction::Save {
                profile,
                category,
                reason,
            } => {
                commands::save_profile(&config, &profile, category.as_deref(), &reason)?;
                tracing::info!(store = %config.store.display(), "profile saved");
            }
            ProfileAction::Show => println!("{}", commands::show_profile(&config)?),
            ProfileAction::Clear => {
                commands::clear_profile(&config)?;
                tracing::info!(store = %config.store.display(), "profile cleared");
            }
        },
        Command::Layout => {
            println!("{}", commands::load_layout(&config)?.to_json()?);
        }
        Command::Birthday { input } => println!("{}", format_birthday_input(&input)),
    }

    Ok(())
}
