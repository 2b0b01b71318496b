use crate::demo::{run_demo, run_portfolio_report, DemoArgs, PortfolioReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use credit_insight::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Credit Insight",
    about = "Score credit portfolios and serve the credit insight API from the command line",
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
    /// Score a portfolio and print its metrics and recommendations
    Portfolio {
        #[command(subcommand)]
        command: PortfolioCommand,
    },
    /// Walk through generation, scoring, and every report type on a synthetic portfolio
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum PortfolioCommand {
    /// Generate or import a portfolio and print the scoring summary
    Report(PortfolioReportArgs),
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
        Command::Portfolio {
            command: PortfolioCommand::Report(args),
        } => run_portfolio_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
