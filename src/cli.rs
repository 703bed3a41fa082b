use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

use crate::config::AppConfig;

/// Command line options for the MSM plot generator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Markov state model plots: flux diagrams, timescales and transition maps")]
pub struct CliOptions {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "FILE", default_value = "config/msm_plots.toml")]
    pub config: PathBuf,

    /// Display configuration summary without rendering anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Override the number of pathways overlaid on the flux diagram.
    #[arg(long, value_name = "N")]
    pub n_pathways: Option<usize>,

    /// Override the minimum net flux drawn as a direct edge.
    #[arg(long, value_name = "T")]
    pub threshold: Option<f64>,

    /// Compute the flux-scaled edge opacity range.
    #[arg(long)]
    pub fancy_alpha: bool,

    /// Draw the pathway legend.
    #[arg(long)]
    pub legend: bool,
}

impl CliOptions {
    fn overrides_flux(&self) -> bool {
        self.n_pathways.is_some() || self.threshold.is_some() || self.fancy_alpha || self.legend
    }

    /// Writes the flux flags into the `[flux]` section. Flags only switch
    /// features on; a missing section is an error when any flag is given.
    pub fn apply_flux_overrides(&self, app_config: &mut AppConfig) -> Result<()> {
        if !self.overrides_flux() {
            return Ok(());
        }
        let flux = app_config
            .settings
            .flux
            .as_mut()
            .ok_or_else(|| anyhow!("flux overrides require a [flux] section in the configuration"))?;

        if let Some(n) = self.n_pathways {
            flux.n_pathways = Some(n);
        }
        if let Some(threshold) = self.threshold {
            if !threshold.is_finite() {
                return Err(anyhow!("--threshold must be finite, got {threshold}"));
            }
            flux.threshold = threshold;
        }
        flux.fancy_alpha |= self.fancy_alpha;
        flux.legend |= self.legend;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use std::fs;

    fn app_config(raw: &str) -> (tempfile::TempDir, AppConfig) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots.toml");
        fs::write(&path, raw).unwrap();
        let app = ConfigLoader::load_from_path(&path).unwrap();
        (dir, app)
    }

    fn parse(args: &[&str]) -> CliOptions {
        CliOptions::try_parse_from(std::iter::once("msm-plots").chain(args.iter().copied())).unwrap()
    }

    const FLUX_ONLY: &str = "[flux]\ninput = \"flux.json\"\n";

    #[test]
    fn defaults_leave_configuration_untouched() {
        let cli = parse(&[]);
        assert_eq!(cli.config, PathBuf::from("config/msm_plots.toml"));
        assert!(!cli.dry_run);

        let (_dir, mut app) = app_config("[timescales]\ninput = \"its.json\"\n");
        cli.apply_flux_overrides(&mut app).unwrap();
        assert!(app.settings.flux.is_none());
    }

    #[test]
    fn flags_overwrite_the_flux_section() {
        let cli = parse(&[
            "--n-pathways",
            "3",
            "--threshold",
            "0.002",
            "--fancy-alpha",
            "--legend",
        ]);
        let (_dir, mut app) = app_config(FLUX_ONLY);
        cli.apply_flux_overrides(&mut app).unwrap();

        let flux = app.settings.flux.as_ref().unwrap();
        assert_eq!(flux.n_pathways, Some(3));
        assert_eq!(flux.threshold, 0.002);
        assert!(flux.fancy_alpha && flux.legend);
    }

    #[test]
    fn absent_flags_keep_configured_values() {
        let (_dir, mut app) = app_config(
            "[flux]\ninput = \"flux.json\"\nlegend = true\nthreshold = 0.01\n",
        );
        parse(&["--n-pathways", "1"])
            .apply_flux_overrides(&mut app)
            .unwrap();

        let flux = app.settings.flux.as_ref().unwrap();
        assert_eq!(flux.n_pathways, Some(1));
        assert_eq!(flux.threshold, 0.01);
        assert!(flux.legend);
        assert!(!flux.fancy_alpha);
    }

    #[test]
    fn overrides_need_a_flux_section() {
        let (_dir, mut app) = app_config("[timescales]\ninput = \"its.json\"\n");
        let err = parse(&["--legend"]).apply_flux_overrides(&mut app).unwrap_err();
        assert!(err.to_string().contains("[flux]"));
    }

    #[test]
    fn non_finite_threshold_is_rejected() {
        let (_dir, mut app) = app_config(FLUX_ONLY);
        let err = parse(&["--threshold", "NaN"])
            .apply_flux_overrides(&mut app)
            .unwrap_err();
        assert!(err.to_string().contains("finite"));
        assert_eq!(app.settings.flux.as_ref().unwrap().threshold, 1e-4);
    }
}
