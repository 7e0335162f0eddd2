use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod client;
mod config;
mod error;
mod events;
mod models;
mod normalize;
mod query;
mod selection;
mod summary;
mod upload;
mod utils;
mod views;

use client::HttpTransport;
use error::{ValidationError, ViewError};
use views::{DeleteArgs, FindingFilterArgs, PagingArgs};

#[derive(Parser)]
#[command(name = "scanview", about = "Browse, upload and prune vulnerability scan reports")]
struct Cli {
    /// Report server base URL (overrides config and environment)
    #[arg(long, global = true)]
    server: Option<String>,
    /// Path to a TOML config file (default: ./scanview.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored scan reports
    List {
        /// Artifact name substring
        #[arg(long)]
        artifact: Option<String>,
        #[command(flatten)]
        paging: PagingArgs,
    },
    /// Show the findings of one report
    Show {
        id: String,
        #[command(flatten)]
        filters: FindingFilterArgs,
        #[command(flatten)]
        paging: PagingArgs,
    },
    /// Validate and upload a report file (.json, .spdx.json, .cdx.json, .tar)
    Upload {
        path: PathBuf,
        /// Declared content type of the file
        #[arg(long, default_value = "")]
        mime_type: String,
        /// Print the refreshed report list after uploading
        #[arg(long)]
        list: bool,
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete reports by id, or a whole page of the list
    Delete {
        #[command(flatten)]
        args: DeleteArgs,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// What the user can do after `err`, when it is one of ours.
fn next_step(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| {
        if let Some(view_err) = cause.downcast_ref::<ViewError>() {
            Some(view_err.next_step())
        } else {
            cause
                .downcast_ref::<ValidationError>()
                .map(|invalid| ViewError::Validation(invalid.clone()).next_step())
        }
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if let Some(hint) = next_step(&err) {
                eprintln!("{}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = config::load_config(cli.config.as_deref(), cli.server.as_deref())?;
    let transport = HttpTransport::new(&config.server_url, config.timeout())?;

    match cli.command {
        Commands::List { artifact, paging } => {
            views::list_reports(&transport, artifact.as_deref(), &paging, config.page_size)?
        }
        Commands::Show {
            id,
            filters,
            paging,
        } => views::show_report(&transport, &id, &filters, &paging, config.page_size)?,
        Commands::Upload {
            path,
            mime_type,
            list,
            format,
        } => upload::upload_report(&transport, &path, &mime_type, list, config.page_size, &format)?,
        Commands::Delete { args } => views::delete_reports(&transport, &args, config.page_size)?,
    }
    Ok(())
}
