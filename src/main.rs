mod cli;

use clap::Parser;

use cli::{Cli, Commands};
use nichelord::error::Result;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Score(args) => cli::score::execute(cli, args),
        Commands::Stress(args) => cli::stress::execute(cli, args),
        Commands::Scenarios => cli::scenarios::execute(),
        Commands::Demo(args) => cli::demo::execute(cli, args).await,
    }
}
