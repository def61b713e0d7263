mod cli;
mod logging;

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config();

    let written = pvtk::demo::run(&config).with_context(|| {
        format!(
            "failed to write {:?} output to {}",
            config.mode,
            config.output_dir.display()
        )
    })?;

    info!("wrote {} files", written.len());
    Ok(())
}
