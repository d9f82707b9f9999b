// src/bin/cli.rs
use color_eyre::eyre::eyre;
use econ_scrape::{cli, log};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    log::init();
    cli::run().map_err(|e| eyre!("{e}"))
}
