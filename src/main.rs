//! ci-deployer - operate on the deployment state store

use clap::{Parser, Subcommand};
use log::{error, info};
use std::io::Write;
use std::path::{Path, PathBuf};

use ci_deployer::app_state::AppState;
use ci_deployer::config::{AppConfig, DEFAULT_CONFIG_PATH};

#[derive(Parser)]
#[command(name = "ci-deployer")]
#[command(about = "Manage versioned state containers and blobs")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Container lifecycle
    Bucket {
        #[command(subcommand)]
        action: BucketCommand,
    },

    /// Single blob operations
    Blob {
        #[command(subcommand)]
        action: BlobCommand,
    },
}

#[derive(Subcommand)]
enum BucketCommand {
    /// Create a versioned container unless it exists
    Ensure { name: String },

    /// Delete every version in a container, then the container
    Destroy { name: String },
}

#[derive(Subcommand)]
enum BlobCommand {
    /// Print the blob, seeding it with the default first if absent
    Ensure {
        container: String,
        key: String,
        /// Content written when the blob does not exist
        #[arg(short, long, default_value = "{}")]
        default: String,
    },

    /// Print the blob's content
    Get { container: String, key: String },

    /// Write the blob from a file or literal content
    Put {
        container: String,
        key: String,
        #[arg(short, long, conflicts_with = "content")]
        file: Option<PathBuf>,
        #[arg(long)]
        content: Option<String>,
    },

    /// Delete the blob
    Rm { container: String, key: String },

    /// Exit 0 when the blob exists, 1 otherwise
    Exists { container: String, key: String },
}

fn init_logging(config_file: &str) {
    if Path::new(config_file).exists() {
        if let Err(e) = log4rs::init_file(config_file, Default::default()) {
            eprintln!("Failed to initialise logging from {}: {}", config_file, e);
        }
    } else {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
    }
}

fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let (config, source) = AppConfig::load_with_source(&cli.config)?;
    init_logging(&config.logging.config_file);
    source.log();
    let state = AppState::from_config(config)?;
    let store = state.store;

    match cli.command {
        Commands::Bucket { action } => match action {
            BucketCommand::Ensure { name } => {
                let status = store.ensure_container(&name)?;
                info!("Container {}: {:?}", name, status);
                println!("{}", if status.was_created() { "created" } else { "exists" });
            }
            BucketCommand::Destroy { name } => {
                store.destroy_container(&name)?;
                println!("destroyed");
            }
        },
        Commands::Blob { action } => match action {
            BlobCommand::Ensure { container, key, default } => {
                let ensured = store.ensure_blob_exists(&container, &key, default.as_bytes())?;
                info!("Blob {}/{} created: {}", container, key, ensured.was_created);
                std::io::stdout().write_all(&ensured.content)?;
            }
            BlobCommand::Get { container, key } => {
                let content = store.load(&container, &key)?;
                std::io::stdout().write_all(&content)?;
            }
            BlobCommand::Put { container, key, file, content } => {
                let bytes = match (file, content) {
                    (Some(path), _) => std::fs::read(path)?,
                    (None, Some(content)) => content.into_bytes(),
                    (None, None) => return Err("either --file or --content is required".into()),
                };
                store.write(&container, &key, &bytes)?;
            }
            BlobCommand::Rm { container, key } => {
                store.delete(&container, &key)?;
            }
            BlobCommand::Exists { container, key } => {
                let exists = store.exists(&container, &key)?;
                println!("{}", exists);
                return Ok(exists);
            }
        },
    }
    Ok(true)
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
