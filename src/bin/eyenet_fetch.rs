use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use eegeyenet_fetcher::domain::{Run, SubjectId, Task};
use eegeyenet_fetcher::error::EyenetError;
use eegeyenet_fetcher::fetch::{App, FetchOptions, FetchResult};
use eegeyenet_fetcher::http::HttpDatasetFetcher;
use eegeyenet_fetcher::output::JsonOutput;
use eegeyenet_fetcher::store::Store;

#[derive(Parser)]
#[command(name = "eyenet-fetch")]
#[command(about = "Download and verify EEGEYENET subject/run archives")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch the archive for one subject and run")]
    Fetch(FetchArgs),
    #[command(about = "List available subjects and runs for a task")]
    Runs(RunsArgs),
}

#[derive(Args)]
struct FetchArgs {
    subject: String,

    run: String,

    #[arg(long)]
    force: bool,

    #[arg(long)]
    data_dir: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct RunsArgs {
    #[arg(long, value_enum, default_value = "dots")]
    task: Task,

    #[arg(long)]
    data_dir: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<EyenetError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &EyenetError) -> u8 {
    match error {
        EyenetError::InvalidSubjectId(_)
        | EyenetError::InvalidRun(_)
        | EyenetError::InvalidTask(_)
        | EyenetError::UnknownTaskPrefix(_)
        | EyenetError::RunUnavailable { .. }
        | EyenetError::CatalogEntryNotFound { .. } => 2,
        EyenetError::DownloadHttp(_)
        | EyenetError::DownloadStatus { .. }
        | EyenetError::HashMismatch { .. }
        | EyenetError::MissingAfterRefresh(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Fetch(args) => run_fetch(args),
        Commands::Runs(args) => run_runs(args),
    }
}

fn make_store(data_dir: Option<Utf8PathBuf>) -> Result<Store, EyenetError> {
    match data_dir {
        Some(root) => Ok(Store::new_with_root(root)),
        None => Store::new(),
    }
}

fn run_fetch(args: FetchArgs) -> miette::Result<()> {
    let subject: SubjectId = args.subject.parse().into_diagnostic()?;
    let run: Run = args.run.parse().into_diagnostic()?;
    let task = Task::for_subject(&subject).into_diagnostic()?;

    let store = make_store(args.data_dir).into_diagnostic()?;
    let fetcher = HttpDatasetFetcher::new().into_diagnostic()?;
    let app = App::new(store, fetcher);

    let options = FetchOptions {
        force_update: args.force,
    };
    let path = app
        .fetch(&subject, run, options, &JsonOutput)
        .into_diagnostic()?;

    JsonOutput::print_fetch(&FetchResult {
        subject: subject.to_string(),
        run: run.number(),
        task: task.to_string(),
        action: "fetch".to_string(),
        path: path.to_string(),
    })
    .into_diagnostic()?;
    Ok(())
}

fn run_runs(args: RunsArgs) -> miette::Result<()> {
    let store = make_store(args.data_dir).into_diagnostic()?;
    let fetcher = HttpDatasetFetcher::new().into_diagnostic()?;
    let app = App::new(store, fetcher);

    let result = app.subjects_and_runs(args.task).into_diagnostic()?;
    JsonOutput::print_runs(&result).into_diagnostic()?;
    Ok(())
}
