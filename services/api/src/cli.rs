use crate::demo::{print_blueprint, run_demo, BlueprintArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use recruit_ai::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Recruit AI Campaign Engine",
    about = "Run and demonstrate the recruitment campaign engine from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service and background ticker (default command)
    Serve(ServeArgs),
    /// Inspect campaign building blocks
    Campaign {
        #[command(subcommand)]
        command: CampaignCommand,
    },
    /// Simulate the standard outreach campaign over a roster, day by day
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum CampaignCommand {
    /// Print the standard outreach blueprint
    Blueprint(BlueprintArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured campaign tick interval in seconds
    #[arg(long)]
    pub(crate) tick_interval_secs: Option<u64>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Campaign {
            command: CampaignCommand::Blueprint(args),
        } => print_blueprint(args),
        Command::Demo(args) => run_demo(args),
    }
}
