//! `zonewatch init` — Build or load every zone index.

use super::{CmdResult, load_config, print_report, start_services};

pub async fn run() -> CmdResult {
    let config = load_config()?;
    let services = start_services(&config).await?;

    println!();
    println!("  Zones from {}:", config.paths.data_dir.display());
    print_report(&services.report);
    println!();

    Ok(())
}
