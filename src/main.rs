//! `desk`: the complaint desk's attachment cache from the command line.
//!
//! Exports are printed to stdout and imports are read from stdin, so the
//! system clipboard stays one pipe away (`desk export-all | pbcopy`).

mod commands;
mod terminal;

use clap::{Parser, Subcommand};
use desk_cache::{AttachmentStore, Filter, LookupCache};
use desk_config::{Backend, CONFIG_ENV, Settings};
use desk_library::{Context, Desk, Limits, StaticAuth};
use desk_models::{AttachmentId, ComplaintId, DocumentType};
use desk_storage::{
    DirectoryRemote, FileStore, LocalHandle, MemoryRemote, ReadOnlyRemote, ReadOnlyStore, RemoteHandle,
};
use desk_transfer::StdioClipboard;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

/// Attachment cache and sync for the complaint desk.
#[derive(Parser, Debug)]
#[command(name = "desk", version, about)]
struct Cli {
    /// Config file (TOML, YAML or JSON).
    #[arg(long, env = CONFIG_ENV, global = true)]
    config: Option<PathBuf>,

    /// Read everything, write nothing.
    #[arg(long, global = true)]
    dry_run: bool,

    /// More logging (repeat for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List attachments, for one complaint or all of them.
    List {
        /// Only attachments linked to this complaint.
        #[arg(long)]
        complaint: Option<ComplaintId>,
        /// all, before, after, document, linked, unlinked, or a category.
        #[arg(long, default_value = "all")]
        filter: Filter,
        /// Case-insensitive match on file name or complaint reference.
        #[arg(long)]
        search: Option<String>,
    },
    /// Number of attachments linked to a complaint.
    Count { complaint: ComplaintId },
    /// The complaint directory with attachment counts.
    Complaints,
    /// Attach image files.
    Intake {
        /// Link to this complaint; without one the files are general documents.
        #[arg(long)]
        complaint: Option<ComplaintId>,
        /// before, after or document.
        #[arg(long = "type", default_value = "document")]
        document_type: DocumentType,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete an attachment.
    Remove { id: AttachmentId },
    /// Write an attachment's content to a file or directory.
    Download { id: AttachmentId, destination: PathBuf },
    /// Print one attachment as JSON.
    Export { id: AttachmentId },
    /// Print every attachment as a package.
    ExportAll,
    /// Read one attachment as JSON from stdin.
    Import,
    /// Read a package from stdin.
    ImportMany,
    /// Follow the remote mirror until interrupted.
    Watch {
        /// Complaint to show.
        #[arg(long)]
        complaint: Option<ComplaintId>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Anything from the desk crates, as a diagnostic.
pub(crate) fn report(error: impl std::fmt::Debug) -> miette::Report {
    miette::miette!("{error:?}")
}

fn backends(settings: &Settings, dry_run: bool) -> miette::Result<(LocalHandle, RemoteHandle)> {
    let data_dir = settings.data_dir().map_err(report)?;
    let slots = FileStore::new("local", &data_dir).map_err(report)?;
    tracing::info!(root = %slots.root().display(), "Local cache opened");
    let mut local: LocalHandle = Arc::new(slots);
    let mut remote: RemoteHandle = match settings.remote.backend {
        Backend::Memory => Arc::new(MemoryRemote::default()),
        Backend::Directory => {
            let root = settings.remote_root().map_err(report)?;
            Arc::new(DirectoryRemote::new("shared", root).map_err(report)?.with_poll_interval(settings.remote.poll_interval()))
        },
    };
    if dry_run {
        local = Arc::new(ReadOnlyStore::new(local));
        remote = Arc::new(ReadOnlyRemote::new(remote));
    }
    Ok((local, remote))
}

async fn open(settings: &Settings, dry_run: bool) -> miette::Result<Desk> {
    let (local, remote) = backends(settings, dry_run)?;
    let store = AttachmentStore::new(local.clone(), remote)
        .with_slot(&settings.slots.attachments)
        .with_remote_path(&settings.remote.attachments);
    let lookup = LookupCache::new(local).with_slots(&settings.slots.complaints, &settings.slots.supervisors);
    lookup.load().await;
    let ctx = Context::new(Arc::new(store), Arc::new(lookup))
        .with_limits(Limits { max_file_bytes: settings.intake.max_file_bytes });
    Ok(Desk::new(ctx, Arc::new(StaticAuth::new(settings.operator.clone())), Arc::new(StdioClipboard)))
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = desk_config::load(cli.config.as_deref()).map_err(report)?;
    let desk = open(&settings, cli.dry_run).await?;

    match cli.command {
        Command::List { complaint, filter, search } => {
            commands::list(&desk, complaint.as_ref(), filter, search.as_deref()).await
        },
        Command::Count { complaint } => commands::count(&desk, &complaint).await,
        Command::Complaints => commands::complaints(&desk).await,
        Command::Intake { complaint, document_type, files } => {
            commands::intake(&desk, complaint, document_type, files).await
        },
        Command::Remove { id } => commands::remove(&desk, &id).await,
        Command::Download { id, destination } => commands::download(&desk, &id, &destination).await,
        Command::Export { id } => commands::export(&desk, &id).await,
        Command::ExportAll => commands::export_all(&desk).await,
        Command::Import => commands::import(&desk).await,
        Command::ImportMany => commands::import_many(&desk).await,
        Command::Watch { complaint } => commands::watch(&desk, &settings, complaint).await,
    }
}
