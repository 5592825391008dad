use anyhow::Result;
use clap::Parser;
use newcomers::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.execute()
}
