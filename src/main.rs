use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Result, anyhow};
use clap::Parser;

use msm_plots::cli::CliOptions;
use msm_plots::config::ConfigLoader;
use msm_plots::pipeline;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = CliOptions::parse();

    let config_path = normalize_config_path(&cli.config)?;
    let mut app_config = ConfigLoader::load_from_path(&config_path)?;
    cli.apply_flux_overrides(&mut app_config)?;

    println!("Configuration summary:");
    for line in app_config.summary_lines() {
        println!("  - {line}");
    }

    if cli.dry_run {
        println!("Dry-run requested; exiting without rendering.");
        return Ok(());
    }

    let start = Instant::now();
    let files = pipeline::run(&app_config)?;

    println!(
        "Plots finished in {:.3?}; wrote {} file(s).",
        start.elapsed(),
        files.len()
    );
    for file in files {
        println!("  -> {}", file.display());
    }
    Ok(())
}

fn normalize_config_path(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    Err(anyhow!(
        "configuration file {} does not exist",
        path.display()
    ))
}
