use std::fs;
use std::path::Path;

use msm_plots::config::ConfigLoader;
use msm_plots::pipeline;
use tempfile::TempDir;

const FLUX: &str = r#"{
    "net_flux": [[0.0, 0.0, 0.0], [0.3, 0.0, 0.0], [0.0, 0.3, 0.0]],
    "committor": [0.0, 0.5, 1.0],
    "stationary_distribution": [0.3, 0.4, 0.3],
    "pathways": [{"states": [0, 1, 2], "capacity": 0.3}]
}"#;

const TIMESCALES: &str = r#"{
    "lags": [1.0, 2.0, 3.0],
    "timescales": [[10.0, 12.0, 12.5], [2.0, 2.4, 2.5]],
    "separation": [null, 12.5, 2.5, 0.5]
}"#;

const TRAJECTORIES: &str = r#"{
    "data": [[0.0, 0.1, 0.9, 1.0, 0.2]],
    "labels": [[0, 0, 1, 1, 0]]
}"#;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn workspace(config: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "flux.json", FLUX);
    write(dir.path(), "timescales.json", TIMESCALES);
    write(dir.path(), "trajectories.json", TRAJECTORIES);
    write(dir.path(), "plots.toml", config);
    dir
}

const DATA_ONLY: &str = r#"
[output]
directory = "out"
base_name = "run"
export_png = false
export_svg = false

[flux]
input = "flux.json"
fancy_alpha = true

[timescales]
input = "timescales.json"

[transition]
input = "trajectories.json"
origin = [0, 1]
target = [0, 1]
bins = 4
"#;

#[test]
fn data_exports_are_written_without_images() {
    let dir = workspace(DATA_ONLY);
    let app = ConfigLoader::load_from_path(&dir.path().join("plots.toml")).unwrap();
    assert_eq!(app.resolved_output_dir, dir.path().join("out"));

    let files = pipeline::run(&app).unwrap();
    let layout = dir.path().join("out/run_flux_layout.json");
    let separation = dir.path().join("out/run_timescale_separation.csv");
    assert_eq!(files, vec![layout.clone(), separation.clone()]);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&layout).unwrap()).unwrap();
    assert_eq!(json["source"], 0);
    assert_eq!(json["sink"], 2);
    assert_eq!(json["states"].as_array().unwrap().len(), 3);
    assert_eq!(json["states"][1]["label"], "1");
    assert_eq!(json["edges"].as_array().unwrap().len(), 2);
    assert_eq!(json["pathways"].as_array().unwrap().len(), 2);
    assert_eq!(json["alpha_scale"]["flux_max"], 0.3);

    let csv = fs::read_to_string(&separation).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("1,5.0"));
    assert!(rows[2].starts_with("2,5.0"));
}

const WITH_IMAGES: &str = r#"
[plot]
width_px = 480
height_px = 360
font_scale = 0.5

[output]
directory = "out"
base_name = "run"

[flux]
input = "flux.json"
legend = true

[timescales]
input = "timescales.json"
log_scale = true
tau = 2.0

[transition]
input = "trajectories.json"
origin = [0, 1]
target = [0, 1]
bins = 4

[[transition.text_labels]]
name = "mid"
x = 0.5
y = 0.5
"#;

#[test]
fn images_are_rendered_for_every_chart() {
    let dir = workspace(WITH_IMAGES);
    let app = ConfigLoader::load_from_path(&dir.path().join("plots.toml")).unwrap();
    let files = pipeline::run(&app).unwrap();

    let names: Vec<String> = files
        .iter()
        .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    for stem in [
        "run_flux",
        "run_timescales",
        "run_timescale_separation",
        "run_transition_0",
        "run_transition_1",
    ] {
        for ext in ["png", "svg"] {
            let name = format!("{stem}.{ext}");
            assert!(names.contains(&name), "{name} missing from {names:?}");
        }
    }
    assert_eq!(files.len(), 12);

    for file in &files {
        let size = fs::metadata(file).unwrap().len();
        assert!(size > 0, "{} is empty", file.display());
    }
    let svg = fs::read_to_string(dir.path().join("out/run_flux.svg")).unwrap();
    assert!(svg.contains("<svg"));
}

#[test]
fn summary_mentions_every_section() {
    let dir = workspace(DATA_ONLY);
    let app = ConfigLoader::load_from_path(&dir.path().join("plots.toml")).unwrap();
    let summary = app.summary_lines().join("\n");
    assert!(summary.contains("flux.json"));
    assert!(summary.contains("timescales.json"));
    assert!(summary.contains("trajectories.json"));
    assert!(summary.contains("png=false"));
}

#[test]
fn mismatched_trajectories_fail_before_output() {
    let dir = workspace(
        r#"
[output]
directory = "out"
export_png = false
export_svg = false

[transition]
input = "trajectories.json"
origin = [0]
target = [1]
"#,
    );
    write(
        dir.path(),
        "trajectories.json",
        r#"{"data": [[0.0, 1.0], [2.0, 3.0]], "labels": [[0, 1]]}"#,
    );
    let app = ConfigLoader::load_from_path(&dir.path().join("plots.toml")).unwrap();
    assert!(pipeline::run(&app).is_err());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn positions_of_the_wrong_length_are_rejected() {
    let dir = workspace(
        r#"
[output]
export_png = false
export_svg = false

[flux]
input = "flux.json"
"#,
    );
    write(
        dir.path(),
        "flux.json",
        &FLUX.replace(
            r#""pathways""#,
            r#""positions": [[0.0, 0.5], [1.0, 0.5]], "pathways""#,
        ),
    );
    let app = ConfigLoader::load_from_path(&dir.path().join("plots.toml")).unwrap();
    let err = pipeline::run(&app).unwrap_err();
    assert!(format!("{err:#}").contains("positions"));
}

#[test]
fn invalid_configuration_is_reported() {
    let dir = workspace("[flux]\ninput = \"flux.json\"\nfraction = 0.0\n");
    assert!(ConfigLoader::load_from_path(&dir.path().join("plots.toml")).is_err());
    assert!(ConfigLoader::load_from_path(&dir.path().join("missing.toml")).is_err());
}
