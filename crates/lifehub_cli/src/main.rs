//! `lifehub` command-line entry point.
//!
//! # Responsibility
//! - Load configuration, start logging and open the configured store.
//! - Print the core version and document counts for one owner.

use clap::Parser;
use lifehub_core::service::facade::COLLECTIONS;
use lifehub_core::{
    core_version, init_logging, open_db, open_db_in_memory, CoreConfig, DocumentBackend,
    DocumentStore, SqliteDocumentBackend,
};
use log::{error, info};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "lifehub")]
#[command(about = "Inspect a LifeHub document store")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Owner whose collections are counted
    #[arg(short, long, default_value = "local")]
    owner: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={}", err);
            eprintln!("lifehub: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::load(cli.config.as_deref())?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    println!("lifehub_core version={}", core_version());

    let conn = match &config.db_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let store = DocumentStore::new(SqliteDocumentBackend::try_new(&conn)?);
    info!(
        "event=cli_run module=cli status=start owner={} backend={}",
        cli.owner,
        store.backend().kind()
    );

    print_counts(&store, &cli.owner)
}

fn print_counts<B: DocumentBackend>(store: &DocumentStore<B>, owner: &str) -> Result<(), Box<dyn Error>> {
    println!("owner={owner}");
    for collection in COLLECTIONS {
        let count = store.get_all(owner, collection, None)?.len();
        println!("{collection:<12} {count}");
    }
    Ok(())
}
