use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::OutputConfig;
use crate::flux::FluxDiagram;

pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create output directory {}", path.display()))?;
    }
    Ok(())
}

pub fn artifact_path(output: &OutputConfig, output_dir: &Path, suffix: &str, ext: &str) -> PathBuf {
    output_dir.join(format!("{}_{suffix}.{ext}", output.base_name))
}

#[derive(Debug, Serialize)]
struct StateRecord<'a> {
    state: usize,
    label: &'a str,
    x: f64,
    y: f64,
    size: f64,
}

#[derive(Debug, Serialize)]
struct EdgeRecord {
    from: usize,
    to: usize,
    flux: f64,
    weight: f64,
    alpha: f64,
}

#[derive(Debug, Serialize)]
struct PathwayStepRecord<'a> {
    pathway: usize,
    from: usize,
    to: usize,
    color: String,
    label: Option<&'a str>,
}

/// Resolved layout of a flux diagram: state positions and sizes, source and
/// sink, direct edges and the drawn pathway steps.
pub fn write_layout_json(path: &Path, diagram: &FluxDiagram) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let states: Vec<StateRecord<'_>> = diagram
        .markers
        .iter()
        .map(|m| StateRecord {
            state: m.state,
            label: &m.label,
            x: m.position.x,
            y: m.position.y,
            size: m.size,
        })
        .collect();
    let edges: Vec<EdgeRecord> = diagram
        .edges
        .iter()
        .map(|e| EdgeRecord {
            from: e.from,
            to: e.to,
            flux: e.flux,
            weight: e.weight,
            alpha: e.alpha,
        })
        .collect();
    let pathways: Vec<PathwayStepRecord<'_>> = diagram
        .pathway_arrows
        .iter()
        .map(|a| PathwayStepRecord {
            pathway: a.pathway,
            from: a.from,
            to: a.to,
            color: format!("#{:02x}{:02x}{:02x}", a.color.0, a.color.1, a.color.2),
            label: a.label.as_deref(),
        })
        .collect();

    let mut root = serde_json::Map::new();
    root.insert("source".into(), serde_json::json!(diagram.source));
    root.insert("sink".into(), serde_json::json!(diagram.sink));
    root.insert("pathway_count".into(), serde_json::json!(diagram.pathway_count));
    root.insert("states".into(), serde_json::to_value(states)?);
    root.insert("edges".into(), serde_json::to_value(edges)?);
    root.insert("pathways".into(), serde_json::to_value(pathways)?);
    if let Some(scale) = &diagram.alpha_scale {
        root.insert("alpha_scale".into(), serde_json::to_value(scale)?);
    }

    let file = File::create(path)
        .with_context(|| format!("Unable to create JSON file {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &serde_json::Value::Object(root))
        .with_context(|| format!("Failed to write JSON data to {}", path.display()))
}

pub fn write_separation_csv(path: &Path, separation: &[(usize, f64)]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Unable to create CSV file {}", path.display()))?;
    writer.write_record(["process", "separation"])?;
    for &(k, ratio) in separation {
        writer.write_record([k.to_string(), format!("{ratio:.12e}")])?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV writer for {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separation_csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/sep.csv");
        write_separation_csv(&path, &[(1, 2.0), (2, 5.0)]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "process,separation");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,2.0"));
    }

    #[test]
    fn artifact_names_use_base_name() {
        let output = OutputConfig::default();
        let path = artifact_path(&output, Path::new("out"), "flux_layout", "json");
        assert_eq!(path, PathBuf::from("out/msm_flux_layout.json"));
    }
}
