use crate::server;
use crate::terminal::{run_score, run_take, ScoreArgs, TakeArgs};
use clap::{Args, Parser, Subcommand};
use sleep_quiz::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Sleep Quiz",
    about = "Serve, take, or score the sleep quality questionnaire from the command line",
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
    /// Take the questionnaire interactively in the terminal
    Take(TakeArgs),
    /// Score a set of `id=value` answers without running a session
    Score(ScoreArgs),
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
        Command::Take(args) => run_take(args).await,
        Command::Score(args) => run_score(args),
    }
}
