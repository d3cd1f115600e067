use clap::Parser;
use kda_cli::{inner_main, Cli};

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let value = inner_main(args)?;
    println!("{value:#}");
    Ok(())
}
