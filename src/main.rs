// src/main.rs

use color_eyre::eyre::Result;
use vanguard_recon::logging;

mod app;
mod cli;
mod ui;

use app::App;
use cli::CommandLine;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let commands = CommandLine::parse_args();
    logging::initialize_logging(commands.verbose)?;

    App::new(commands.verbose).run(commands.command).await
}
