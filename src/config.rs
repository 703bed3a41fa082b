use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::transition::TextLabel;

/// Load and validate plotting configuration from a TOML file.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load_from_path(path: &Path) -> Result<AppConfig> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file {}", path.display()))?;
        let settings: PlotSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse configuration file {}", path.display()))?;

        settings
            .validate()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let output_dir = settings
            .output
            .resolve_output_dir(&base_dir)
            .context("output directory validation failed")?;

        Ok(AppConfig {
            source_path: path.to_path_buf(),
            base_dir,
            settings,
            resolved_output_dir: output_dir,
        })
    }
}

/// Parsed settings plus the paths derived from the configuration location.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source_path: PathBuf,
    /// Directory holding the configuration file; relative inputs resolve here.
    pub base_dir: PathBuf,
    pub settings: PlotSettings,
    pub resolved_output_dir: PathBuf,
}

impl AppConfig {
    pub fn resolve_input(&self, input: &Path) -> PathBuf {
        if input.is_absolute() {
            input.to_path_buf()
        } else {
            self.base_dir.join(input)
        }
    }

    /// Human friendly description of key configuration choices.
    pub fn summary_lines(&self) -> Vec<String> {
        let s = &self.settings;
        let mut lines = Vec::new();

        lines.push(format!(
            "canvas: {}x{} px, font scale {}",
            s.plot.width_px, s.plot.height_px, s.plot.font_scale
        ));
        match &s.flux {
            Some(flux) => lines.push(format!(
                "flux: {} (fraction={}, threshold={:e}, n_pathways={:?}, legend={}, fancy_alpha={}, apply_alpha_scale={})",
                flux.input.display(),
                flux.fraction,
                flux.threshold,
                flux.n_pathways,
                flux.legend,
                flux.fancy_alpha,
                flux.apply_alpha_scale
            )),
            None => lines.push("flux: disabled".to_string()),
        }
        match &s.timescales {
            Some(ts) => lines.push(format!(
                "timescales: {} (tau={:?}, log_scale={}, separation={}, xlim={:?})",
                ts.input.display(),
                ts.tau,
                ts.log_scale,
                ts.separation,
                ts.separation_xlim
            )),
            None => lines.push("timescales: disabled".to_string()),
        }
        match &s.transition {
            Some(tr) => lines.push(format!(
                "transition: {} (origin={:?}, target={:?}, lag={}, bins={}, {} text label(s))",
                tr.input.display(),
                tr.origin,
                tr.target,
                tr.lag,
                tr.bins,
                tr.text_labels.len()
            )),
            None => lines.push("transition: disabled".to_string()),
        }
        lines.push(format!(
            "output dir: {} (png={}, svg={}, json={}, csv={})",
            self.resolved_output_dir.display(),
            s.output.export_png,
            s.output.export_svg,
            s.output.export_json,
            s.output.export_csv
        ));
        lines
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlotSettings {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub plot: PlotConfig,
    pub flux: Option<FluxConfig>,
    pub timescales: Option<TimescalesConfig>,
    pub transition: Option<TransitionConfig>,
}

impl PlotSettings {
    fn validate(&self) -> Result<()> {
        self.validate_plot()?;
        if let Some(flux) = &self.flux {
            flux.validate()?;
        }
        if let Some(ts) = &self.timescales {
            ts.validate()?;
        }
        if let Some(tr) = &self.transition {
            tr.validate()?;
        }
        if self.flux.is_none() && self.timescales.is_none() && self.transition.is_none() {
            return Err(anyhow!(
                "configuration enables no chart; add a [flux], [timescales] or [transition] section"
            ));
        }
        Ok(())
    }

    fn validate_plot(&self) -> Result<()> {
        if self.plot.width_px == 0 || self.plot.height_px == 0 {
            return Err(anyhow!(
                "plot size must be positive, got {}x{}",
                self.plot.width_px,
                self.plot.height_px
            ));
        }
        if !(self.plot.font_scale > 0.0) {
            return Err(anyhow!(
                "plot font_scale must be positive, got {}",
                self.plot.font_scale
            ));
        }
        if self.output.base_name.trim().is_empty() {
            return Err(anyhow!("output base_name must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "PlotConfig::default_width")]
    pub width_px: u32,
    #[serde(default = "PlotConfig::default_height")]
    pub height_px: u32,
    /// Pixels per typographic point for fonts, markers and line widths.
    #[serde(default = "PlotConfig::default_font_scale")]
    pub font_scale: f64,
}

impl PlotConfig {
    const fn default_width() -> u32 {
        1200
    }
    const fn default_height() -> u32 {
        1200
    }
    const fn default_font_scale() -> f64 {
        1.0
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width_px: Self::default_width(),
            height_px: Self::default_height(),
            font_scale: Self::default_font_scale(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FluxConfig {
    pub input: PathBuf,
    #[serde(default = "FluxConfig::default_fraction")]
    pub fraction: f64,
    #[serde(default = "FluxConfig::default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub n_pathways: Option<usize>,
    #[serde(default)]
    pub legend: bool,
    #[serde(default)]
    pub fancy_alpha: bool,
    #[serde(default)]
    pub apply_alpha_scale: bool,
}

impl FluxConfig {
    const fn default_fraction() -> f64 {
        1.0
    }
    const fn default_threshold() -> f64 {
        1e-4
    }

    fn validate(&self) -> Result<()> {
        if !(self.fraction > 0.0 && self.fraction <= 1.0) {
            return Err(anyhow!(
                "flux fraction must lie in (0, 1], got {}",
                self.fraction
            ));
        }
        if !self.threshold.is_finite() {
            return Err(anyhow!(
                "flux threshold must be finite, got {}",
                self.threshold
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimescalesConfig {
    pub input: PathBuf,
    #[serde(default)]
    pub tau: Option<f64>,
    #[serde(default)]
    pub log_scale: bool,
    #[serde(default = "TimescalesConfig::default_separation")]
    pub separation: bool,
    #[serde(default)]
    pub separation_xlim: Option<[f64; 2]>,
}

impl TimescalesConfig {
    const fn default_separation() -> bool {
        true
    }

    fn validate(&self) -> Result<()> {
        if let Some(tau) = self.tau {
            if !tau.is_finite() {
                return Err(anyhow!("timescales tau must be finite, got {tau}"));
            }
        }
        if let Some([lo, hi]) = self.separation_xlim {
            if !(lo < hi) {
                return Err(anyhow!(
                    "separation_xlim must be increasing, got [{lo}, {hi}]"
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionConfig {
    pub input: PathBuf,
    pub origin: Vec<usize>,
    pub target: Vec<usize>,
    #[serde(default = "TransitionConfig::default_lag")]
    pub lag: usize,
    #[serde(default = "TransitionConfig::default_bins")]
    pub bins: usize,
    #[serde(default)]
    pub text_labels: Vec<TextLabel>,
}

impl TransitionConfig {
    const fn default_lag() -> usize {
        1
    }
    const fn default_bins() -> usize {
        100
    }

    fn validate(&self) -> Result<()> {
        if self.origin.is_empty() || self.target.is_empty() {
            return Err(anyhow!(
                "transition origin and target must each list at least one state"
            ));
        }
        if self.lag == 0 {
            return Err(anyhow!("transition lag must be at least 1"));
        }
        if self.bins == 0 {
            return Err(anyhow!("transition bins must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub base_name: String,
    pub export_png: bool,
    pub export_svg: bool,
    pub export_json: bool,
    pub export_csv: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            base_name: "msm".to_string(),
            export_png: true,
            export_svg: true,
            export_json: true,
            export_csv: true,
        }
    }
}

impl OutputConfig {
    /// Relative directories resolve against `base_dir` and may not climb out
    /// of it.
    fn resolve_output_dir(&self, base_dir: &Path) -> Result<PathBuf> {
        if self.directory.is_absolute() {
            return Ok(self.directory.clone());
        }

        let mut sanitized = PathBuf::new();
        for component in self.directory.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(anyhow!(
                        "output directory cannot contain parent references ('..'): {}",
                        self.directory.display()
                    ));
                }
                Component::Normal(part) => sanitized.push(part),
                Component::Prefix(_) | Component::RootDir => {
                    return Err(anyhow!(
                        "unexpected path prefix in output directory: {}",
                        self.directory.display()
                    ));
                }
            }
        }

        if sanitized.as_os_str().is_empty() {
            sanitized.push("output");
        }
        Ok(base_dir.join(sanitized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> PlotSettings {
        toml::from_str(raw).unwrap()
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let settings = parse(
            r#"
            [flux]
            input = "flux.json"
            "#,
        );
        let flux = settings.flux.as_ref().unwrap();
        assert_eq!(flux.fraction, 1.0);
        assert_eq!(flux.threshold, 1e-4);
        assert!(flux.n_pathways.is_none());
        assert!(!flux.legend && !flux.fancy_alpha && !flux.apply_alpha_scale);
        assert_eq!(settings.plot.width_px, 1200);
        assert_eq!(settings.output.base_name, "msm");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn empty_configuration_is_rejected() {
        let settings = parse("[plot]\nwidth_px = 800\n");
        assert!(settings.validate().is_err());
    }

    #[test]
    fn bad_fraction_is_rejected() {
        let settings = parse(
            r#"
            [flux]
            input = "flux.json"
            fraction = 1.5
            "#,
        );
        assert!(settings.validate().is_err());
    }

    #[test]
    fn transition_section_parses_text_labels() {
        let settings = parse(
            r#"
            [transition]
            input = "traj.json"
            origin = [0]
            target = [0, 1]
            bins = 20

            [[transition.text_labels]]
            name = "native"
            x = 0.1
            y = 0.2
            "#,
        );
        let tr = settings.transition.as_ref().unwrap();
        assert_eq!(tr.lag, 1);
        assert_eq!(tr.bins, 20);
        assert_eq!(tr.text_labels[0].name, "native");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn output_dir_rejects_parent_references() {
        let output = OutputConfig {
            directory: PathBuf::from("../elsewhere"),
            ..OutputConfig::default()
        };
        assert!(output.resolve_output_dir(Path::new("/tmp/cfg")).is_err());

        let nested = OutputConfig {
            directory: PathBuf::from("./plots/run1"),
            ..OutputConfig::default()
        };
        assert_eq!(
            nested.resolve_output_dir(Path::new("/tmp/cfg")).unwrap(),
            PathBuf::from("/tmp/cfg/plots/run1")
        );
    }
}
