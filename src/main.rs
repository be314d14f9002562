//! GetPet CLI Entry Point
//!
//! Subcommands:
//! - `cages` - Occupancy of every occupied cage
//! - `get` / `new` / `update` / `delete` - Single-animal operations
//! - `search` - Filtered animal search
//! - `serve` - JSON-RPC 2.0 server on stdio
//! - `config` - Show or save the resolved configuration
//!
//! All output to stdout is JSON-only. Logs go to stderr.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use getpet::api::{self, Request, Response};
use getpet::config::{save_config, ConfigLayer, ConfigLocation, ShelterConfig};
use getpet::logging::init_logging;
use getpet::model::{AnimalBuilder, Color, Gender, SearchQuery, Size, Species};
use getpet::{
    rpc, ErrorEnvelope, Metadata, Persistence, Result, ShelterError, ShelterService,
    SuccessEnvelope,
};

/// GetPet - Animal shelter records
#[derive(Parser)]
#[command(name = "getpet")]
#[command(about = "Animal shelter records backed by SQLite")]
#[command(version)]
struct Cli {
    /// Database file (`:memory:` for a throwaway in-memory store)
    #[arg(long, global = true, env = "GETPET_DATABASE")]
    database: Option<PathBuf>,

    /// Do not load the sample animals into an empty store
    #[arg(long, global = true)]
    no_sample_data: bool,

    /// Increase log verbosity (-v DEBUG, -vv TRACE)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dog and cat counts for every occupied cage
    Cages,

    /// Show one animal
    Get {
        /// Intake number
        intake: i64,
    },

    /// Search animals
    Search(SearchArgs),

    /// Add an animal from a JSON record
    New {
        /// Animal as JSON (camelCase fields, intakeNumber is ignored)
        animal: String,
    },

    /// Replace an animal with a JSON record
    Update {
        /// Intake number
        intake: i64,

        /// Animal as JSON (camelCase fields)
        animal: String,
    },

    /// Remove an animal
    Delete {
        /// Intake number
        intake: i64,
    },

    /// Serve JSON-RPC 2.0 requests on stdin/stdout
    Serve,

    /// Inspect or persist configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Exact species (dog, cat)
    #[arg(long)]
    species: Option<Species>,

    /// Allowed gender (m, f); repeatable
    #[arg(long = "gender")]
    genders: Vec<Gender>,

    /// Breed substring
    #[arg(long)]
    breed: Option<String>,

    /// Wanted color (black, white, brown, gold, dGray, lGray); repeatable
    #[arg(long = "color")]
    colors: Vec<Color>,

    /// Allowed size (small, medium, large); repeatable
    #[arg(long = "size")]
    sizes: Vec<Size>,

    /// Exact cage number
    #[arg(long)]
    cage: Option<i64>,

    /// Only vaccinated animals
    #[arg(long)]
    vaccinated: bool,

    /// Only spayed or neutered animals
    #[arg(long)]
    spay_neuter: bool,
}

impl From<SearchArgs> for SearchQuery {
    fn from(args: SearchArgs) -> Self {
        Self {
            species: args.species,
            genders: args.genders,
            breed: args.breed,
            colors: args.colors,
            sizes: args.sizes,
            cage_number: args.cage,
            vaccinated: args.vaccinated,
            spay_neuter: args.spay_neuter,
        }
    }
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the resolved configuration
    Show,

    /// Write the resolved configuration to a config file
    Save {
        #[arg(long, value_enum, default_value_t = LocationArg::Local)]
        location: LocationArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LocationArg {
    /// `.getpet/config.json` in the current directory
    Local,
    /// Per-user config directory
    Global,
}

impl From<LocationArg> for ConfigLocation {
    fn from(location: LocationArg) -> Self {
        match location {
            LocationArg::Local => Self::Local,
            LocationArg::Global => Self::Global,
        }
    }
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Cages => "cages",
            Self::Get { .. } => "get",
            Self::Search(_) => "search",
            Self::New { .. } => "new",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::Serve => "serve",
            Self::Config { action: ConfigCommand::Show } => "config show",
            Self::Config { action: ConfigCommand::Save { .. } } => "config save",
        }
    }
}

/// Data payload of a finished command plus its record count, if it lists records
struct Output {
    data: Value,
    records: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("{e}");
    }

    let overrides = ConfigLayer {
        database: cli.database,
        sample_data: cli.no_sample_data.then_some(false),
        busy_timeout_ms: None,
    };
    let command = cli.command;
    let name = command.name();
    let started = Instant::now();

    if matches!(command, Commands::Serve) {
        return match serve(overrides).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "RPC server failed");
                ExitCode::FAILURE
            }
        };
    }

    match run(command, overrides).await {
        Ok(output) => {
            let mut meta = Metadata::since(started);
            if let Some(records) = output.records {
                meta = meta.with_records(records);
            }
            print_json(&SuccessEnvelope::new(name, output.data, meta));
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(code = e.error_code(), "Command failed");
            print_json(&ErrorEnvelope::from_error(name, &e));
            ExitCode::FAILURE
        }
    }
}

fn print_json(envelope: &impl serde::Serialize) {
    match serde_json::to_string(envelope) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Could not serialize output: {e}"),
    }
}

async fn serve(overrides: ConfigLayer) -> anyhow::Result<()> {
    let service = open_service(overrides)?;
    rpc::serve(&service).await?;
    service.shutdown().await?;
    Ok(())
}

async fn run(command: Commands, overrides: ConfigLayer) -> Result<Output> {
    let request = match command {
        Commands::Config { action } => return config(action, overrides),
        Commands::Serve => return Err(ShelterError::invalid_input("serve has no JSON output")),
        Commands::Cages => Request::Cages {},
        Commands::Get { intake } => Request::GetAnimal { intake_number: intake },
        Commands::Search(args) => Request::Search(args.into()),
        Commands::New { animal } => Request::NewAnimal {
            animal: parse_animal(&animal)?.build()?,
        },
        Commands::Update { intake, animal } => Request::UpdateAnimal {
            intake_number: intake,
            animal: parse_animal(&animal)?.build()?,
        },
        Commands::Delete { intake } => Request::DeleteAnimal { intake_number: intake },
    };

    let service = open_service(overrides)?;
    let response = api::handle(&service, request).await?;
    service.shutdown().await?;

    let records = match &response {
        Response::Cages { cages } => Some(cages.len()),
        Response::Results { results } => Some(results.len()),
        _ => None,
    };
    let data = serde_json::to_value(&response)
        .map_err(|e| ShelterError::invalid_input(format!("Could not serialize result: {e}")))?;

    Ok(Output { data, records })
}

fn config(action: ConfigCommand, overrides: ConfigLayer) -> Result<Output> {
    let config = ShelterConfig::resolve(overrides)?;

    let data = match action {
        ConfigCommand::Show => serde_json::json!({ "config": config }),
        ConfigCommand::Save { location } => {
            let path = save_config(&config, location.into())?;
            serde_json::json!({ "config": config, "path": path })
        }
    };

    Ok(Output {
        data,
        records: None,
    })
}

/// Decode an animal argument; field checks happen in `AnimalBuilder::build`
fn parse_animal(json: &str) -> Result<AnimalBuilder> {
    serde_json::from_str(json)
        .map_err(|e| ShelterError::invalid_input(format!("Invalid animal JSON: {e}")))
}

fn open_service(overrides: ConfigLayer) -> Result<ShelterService> {
    let config = ShelterConfig::resolve(overrides)?;
    tracing::debug!(database = %config.database.display(), "Resolved configuration");
    ShelterService::start(Persistence::from_config(&config)?)
}
