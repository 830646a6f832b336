use clap::{ArgAction, Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "nanolytica-cli", version, about = "Nanolytica CLI")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a lifecycle scenario through the tracker
    Simulate(commands::simulate::SimulateArgs),
    /// Show the configuration a scenario page resolves to
    Config(commands::config::ConfigArgs),
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args).map_err(Into::into),
        Commands::Config(args) => commands::config::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
