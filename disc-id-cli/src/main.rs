//! disc-id CLI
//!
//! Identifies a PlayStation 2 disc image by serial number, region, and
//! title.

mod error;

use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use disc_id::database::Database;
use error::CliError;

/// Identify a PlayStation 2 disc image.
#[derive(Parser, Debug)]
#[command(name = "disc-id", version, about)]
struct Cli {
    /// Path to the disc image (.iso or .bin).
    image: PathBuf,

    /// Directory containing the db_playstation2_official_*.json catalogs.
    #[arg(long, default_value = ".")]
    db_dir: PathBuf,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let database = Database::load_dir(&cli.db_dir)?;
    let mut file = File::open(&cli.image)?;

    let result = disc_id::identify_disc(&cli.image, &mut file, &database)?;

    println!(
        "{}  {}  {}  ({})",
        result.serial_number.if_supports_color(Stdout, |t| t.green()),
        result.region,
        result.title,
        result.disc_type,
    );

    Ok(())
}
