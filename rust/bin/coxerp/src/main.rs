//! `coxerp` — production request tracking from the command line.
//!
//! Opens the request store under the configured data directory, runs one
//! command and exits. Failures are reported as `{"code", "message"}` with a
//! non-zero exit status.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use coxerp_core::{ListParams, ServiceError};
use coxerp_production::{
    NewRequest, RequestError, RequestFilter, RequestSort, RequestStatus, SerialPatch,
    TransitionExtra,
};

use commands::{Output, Session};
use config::AppConfig;

/// Production request tracking.
#[derive(Parser, Debug)]
#[command(name = "coxerp", about = "Production request tracking", version)]
struct Cli {
    /// Config file (default: ./coxerp.toml if present).
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Data directory; overrides `[storage] data_dir`.
    #[arg(long = "data-dir", global = true)]
    data_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long = "output", short = 'o', global = true, value_enum, default_value = "table")]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a new production request.
    Create {
        #[arg(long)]
        client: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        quantity: u32,
        /// Request date, YYYY-MM-DD (default: today).
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        details: Option<String>,
        #[arg(long)]
        lens_supplier: Option<String>,
        #[arg(long)]
        other_requests: Option<String>,
        #[arg(long)]
        special_notes: Option<String>,
    },

    /// Show one request.
    Get { request_no: String },

    /// List requests in creation order.
    List {
        /// Only this status (READY, in-production, 생산중, ...).
        #[arg(long)]
        status: Option<String>,
        /// Only clients containing this text (case-insensitive).
        #[arg(long)]
        client: Option<String>,
        /// insertion, request-date, expected-date or status.
        #[arg(long, default_value = "insertion")]
        sort: String,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Move a request to another status.
    Transition {
        request_no: String,
        /// Target status.
        status: String,
        /// Required when starting production.
        #[arg(long)]
        expected_date: Option<NaiveDate>,
        /// Required when finishing.
        #[arg(long)]
        out_date: Option<NaiveDate>,
        /// Fail if the request changed since this revision.
        #[arg(long)]
        revision: Option<u64>,
    },

    /// Create the blank serial table if it does not exist yet.
    #[command(name = "init-serials")]
    InitSerials { request_no: String },

    /// Edit one row of the serial table.
    Serial {
        request_no: String,
        /// 1-based row number.
        seq: u32,
        #[arg(long)]
        serial_no: Option<String>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        completed: Option<bool>,
        #[arg(long)]
        revision: Option<u64>,
    },

    /// Check every serial number is filled in and mark the request done.
    Finalize {
        request_no: String,
        /// Ship date, YYYY-MM-DD (default: today).
        #[arg(long)]
        out_date: Option<NaiveDate>,
    },

    /// Append a memo.
    Memo {
        request_no: String,
        content: String,
        #[arg(long)]
        author: String,
    },

    /// Attach a file (replaces any previous attachment).
    Attach {
        request_no: String,
        file: PathBuf,
        /// MIME type (default: guessed from the extension).
        #[arg(long)]
        mime: Option<String>,
    },

    /// Save a request's attachment to disk.
    Attachment {
        request_no: String,
        /// Target file or directory.
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?.with_data_dir(cli.data_dir);
    let session = Session::open(config, cli.output)?;

    match cli.command {
        Commands::Create {
            client,
            model,
            quantity,
            date,
            details,
            lens_supplier,
            other_requests,
            special_notes,
        } => {
            let input = NewRequest {
                details,
                lens_supplier,
                other_requests,
                special_notes,
                ..NewRequest::new(client, model, quantity, date.unwrap_or_else(today))
            };
            commands::request::create(&session, input)?;
        }

        Commands::Get { request_no } => {
            commands::request::get(&session, &request_no)?;
        }

        Commands::List {
            status,
            client,
            sort,
            limit,
            offset,
        } => {
            let filter = RequestFilter {
                status: status.as_deref().map(str::parse::<RequestStatus>).transpose()?,
                client,
            };
            let sort: RequestSort = sort.parse()?;
            commands::request::list(&session, filter, sort, ListParams { limit, offset })?;
        }

        Commands::Transition {
            request_no,
            status,
            expected_date,
            out_date,
            revision,
        } => {
            let extra = TransitionExtra {
                expected_date,
                out_date,
                expected_revision: revision,
            };
            commands::request::transition(&session, &request_no, &status, extra)?;
        }

        Commands::InitSerials { request_no } => {
            commands::request::init_serials(&session, &request_no)?;
        }

        Commands::Serial {
            request_no,
            seq,
            serial_no,
            note,
            completed,
            revision,
        } => {
            let patch = SerialPatch {
                serial_no,
                note,
                completed,
                expected_revision: revision,
            };
            commands::request::serial(&session, &request_no, seq, patch)?;
        }

        Commands::Finalize {
            request_no,
            out_date,
        } => {
            commands::request::finalize(&session, &request_no, out_date.unwrap_or_else(today))?;
        }

        Commands::Memo {
            request_no,
            content,
            author,
        } => {
            commands::request::memo(&session, &request_no, &author, &content)?;
        }

        Commands::Attach {
            request_no,
            file,
            mime,
        } => {
            commands::request::attach(&session, &request_no, &file, mime.as_deref())?;
        }

        Commands::Attachment { request_no, out } => {
            commands::request::fetch_attachment(&session, &request_no, &out)?;
        }
    }

    Ok(())
}

/// Map any failure onto the shared error shape.
fn to_service_error(err: &anyhow::Error) -> ServiceError {
    match err.downcast_ref::<RequestError>() {
        Some(e) => ServiceError::from(e.clone()),
        None => ServiceError::Internal(format!("{:#}", err)),
    }
}

fn main() -> ExitCode {
    // Logs go to stderr so `--output json` stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = cli.output;

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let svc = to_service_error(&err);
            match output {
                Output::Json => println!("{}", svc.to_json()),
                Output::Table => {
                    eprintln!("error [{}]: {}", svc.error_code(), svc);
                    if svc.is_retryable() {
                        eprintln!("hint: re-fetch the request and try again");
                    }
                }
            }
            ExitCode::FAILURE
        }
    }
}
