use crate::demo::{run_demo, run_report, run_seed, DemoArgs, ReportArgs, SeedArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use recruitment::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Recruitment Admin",
    about = "Run and operate the e-recruitment administration service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Create a sample company, question pack, vacancy, and open period in the configured database
    Seed(SeedArgs),
    /// Export the applicant report of a vacancy period as CSV
    Report(ReportArgs),
    /// Walk one candidate from application to acceptance on an in-memory database
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Seed(args) => run_seed(args),
        Command::Report(args) => run_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
